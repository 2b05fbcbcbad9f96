use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// A labeled section an issue body can carry, e.g. `Deliverables:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    TaskId,
    Phase,
    Deliverables,
    Dependencies,
    EstimatedHours,
    Bounty,
    Notes,
    TransactionId,
    StartHour,
    EndHour,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 10] = [
        SectionLabel::TaskId,
        SectionLabel::Phase,
        SectionLabel::Deliverables,
        SectionLabel::Dependencies,
        SectionLabel::EstimatedHours,
        SectionLabel::Bounty,
        SectionLabel::Notes,
        SectionLabel::TransactionId,
        SectionLabel::StartHour,
        SectionLabel::EndHour,
    ];

    /// Spellings that open this section, matched case-insensitively.
    pub fn anchors(self) -> &'static [&'static str] {
        match self {
            SectionLabel::TaskId => &["Task ID:"],
            SectionLabel::Phase => &["Phase:"],
            SectionLabel::Deliverables => &["Deliverables:"],
            SectionLabel::Dependencies => &["Dependencies:"],
            SectionLabel::EstimatedHours => &["Estimated Hours:"],
            SectionLabel::Bounty => &["Bounty (VSP):", "Bounty:"],
            SectionLabel::Notes => &["Notes:"],
            SectionLabel::TransactionId => &["Transaction ID:", "TxID:"],
            SectionLabel::StartHour => &["Start Hour:"],
            SectionLabel::EndHour => &["End Hour:"],
        }
    }

    fn from_anchor(text: &str) -> Option<SectionLabel> {
        SectionLabel::ALL.into_iter().find(|label| {
            label
                .anchors()
                .iter()
                .any(|anchor| anchor.eq_ignore_ascii_case(text))
        })
    }
}

static ANCHORS: LazyLock<Regex> = LazyLock::new(|| {
    let mut anchors: Vec<&str> = SectionLabel::ALL
        .iter()
        .flat_map(|label| label.anchors().iter().copied())
        .collect();
    // Longest first so that an anchor is never shadowed by one of its prefixes.
    anchors.sort_by_key(|a| std::cmp::Reverse(a.len()));
    let alternation = anchors
        .iter()
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{alternation})")).expect("section anchors form a valid regex")
});

/// An issue body split into labeled sections.
///
/// Every known anchor is located first; a section is the text between its
/// anchor and the next anchor of any label (or the end of the body), so the
/// labels may appear in any order. When a label occurs more than once, the
/// first occurrence wins.
#[derive(Debug, Default)]
pub struct Sections<'a> {
    spans: HashMap<SectionLabel, &'a str>,
}

impl<'a> Sections<'a> {
    pub fn parse(body: &'a str) -> Self {
        let anchors: Vec<(SectionLabel, regex::Match<'a>)> = ANCHORS
            .find_iter(body)
            .filter_map(|m| SectionLabel::from_anchor(m.as_str()).map(|label| (label, m)))
            .collect();

        let mut spans = HashMap::new();
        for (i, (label, m)) in anchors.iter().enumerate() {
            let end = anchors
                .get(i + 1)
                .map_or(body.len(), |(_, next)| next.start());
            spans.entry(*label).or_insert(&body[m.end()..end]);
        }

        Self { spans }
    }

    /// Untrimmed text following the label's anchor.
    pub fn raw(&self, label: SectionLabel) -> Option<&'a str> {
        self.spans.get(&label).copied()
    }

    /// The section as a trimmed block of free text.
    pub fn block(&self, label: SectionLabel) -> Option<String> {
        self.raw(label).map(|text| text.trim().to_string())
    }

    /// Leading run of characters accepted by `accept`, after any whitespace.
    pub fn token(&self, label: SectionLabel, accept: impl Fn(char) -> bool) -> Option<String> {
        let token: String = self
            .raw(label)?
            .trim_start()
            .chars()
            .take_while(|c| accept(*c))
            .collect();
        (!token.is_empty()).then_some(token)
    }

    /// Leading number with thousands separators removed, e.g. `50,000.5` -> `50000.5`.
    pub fn number(&self, label: SectionLabel) -> Option<String> {
        let number: String = self
            .token(label, |c| c.is_ascii_digit() || c == ',' || c == '.')?
            .chars()
            .filter(|c| *c != ',')
            .collect();
        (!number.is_empty()).then_some(number)
    }
}
