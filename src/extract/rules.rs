use crate::model::issue::IssueRecord;
use crate::model::ledger::LedgerColumn;

use super::sections::{SectionLabel, SectionLabel as S, Sections};

/// Shape of a single-token body value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Alphanumerics, dots and hyphens, e.g. `2.1` or `VS-14`.
    Code,
    /// ASCII digits only.
    Digits,
}

impl Token {
    fn accepts(self, c: char) -> bool {
        match self {
            Token::Code => c.is_ascii_alphanumeric() || c == '.' || c == '-',
            Token::Digits => c.is_ascii_digit(),
        }
    }
}

/// One place a column value can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    BodyToken(SectionLabel, Token),
    BodyBlock(SectionLabel),
    BodyNumber(SectionLabel),
    /// Value of a `prefix:value` label.
    Label(&'static str),
    /// The given text when the issue is closed.
    WhenClosed(&'static str),
    State,
    Number,
    Title,
    Body,
    Url,
}

/// Everything a [`Source`] may read, parsed once per issue.
pub struct Context<'a> {
    pub issue: &'a IssueRecord,
    pub sections: Sections<'a>,
}

impl<'a> Context<'a> {
    pub fn new(issue: &'a IssueRecord) -> Self {
        Self {
            issue,
            sections: Sections::parse(&issue.body),
        }
    }
}

impl Source {
    pub fn resolve(self, cx: &Context<'_>) -> Option<String> {
        match self {
            Source::BodyToken(label, token) => cx.sections.token(label, |c| token.accepts(c)),
            Source::BodyBlock(label) => cx.sections.block(label),
            Source::BodyNumber(label) => cx.sections.number(label),
            Source::Label(prefix) => cx.issue.label_value(prefix).map(str::to_string),
            Source::WhenClosed(text) => cx
                .issue
                .state
                .eq_ignore_ascii_case("closed")
                .then(|| text.to_string()),
            Source::State => Some(cx.issue.state.clone()),
            Source::Number => cx.issue.number.map(|n| n.to_string()),
            Source::Title => Some(cx.issue.title.clone()),
            Source::Body => Some(cx.issue.body.clone()),
            Source::Url => Some(cx.issue.url.clone()),
        }
    }
}

/// Ordered fallback chain for one column.
#[derive(Debug)]
pub struct FieldRule {
    pub column: LedgerColumn,
    pub sources: &'static [Source],
}

impl FieldRule {
    /// First non-empty value among the sources, else the empty string.
    pub fn resolve(&self, cx: &Context<'_>) -> String {
        first_non_empty(self.sources.iter().map(|s| s.resolve(cx)))
    }
}

pub fn first_non_empty(candidates: impl IntoIterator<Item = Option<String>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

pub static RULES: [FieldRule; LedgerColumn::COUNT] = [
    FieldRule {
        column: LedgerColumn::Id,
        sources: &[Source::BodyToken(S::TaskId, Token::Code), Source::Number],
    },
    FieldRule {
        column: LedgerColumn::Phase,
        sources: &[Source::BodyToken(S::Phase, Token::Digits), Source::Label("phase")],
    },
    FieldRule {
        column: LedgerColumn::TaskName,
        sources: &[Source::Title],
    },
    FieldRule {
        column: LedgerColumn::FullDescription,
        sources: &[Source::Body],
    },
    FieldRule {
        column: LedgerColumn::IssueUrl,
        sources: &[Source::Url],
    },
    FieldRule {
        column: LedgerColumn::Deliverables,
        sources: &[Source::BodyBlock(S::Deliverables)],
    },
    FieldRule {
        column: LedgerColumn::Dependencies,
        sources: &[Source::BodyBlock(S::Dependencies)],
    },
    FieldRule {
        column: LedgerColumn::EstimatedHours,
        sources: &[Source::BodyNumber(S::EstimatedHours), Source::Label("hours")],
    },
    FieldRule {
        column: LedgerColumn::Bounty,
        sources: &[Source::BodyNumber(S::Bounty), Source::Label("bounty")],
    },
    FieldRule {
        column: LedgerColumn::Status,
        sources: &[Source::Label("status"), Source::WhenClosed("done"), Source::State],
    },
    FieldRule {
        column: LedgerColumn::Notes,
        sources: &[Source::BodyBlock(S::Notes)],
    },
    FieldRule {
        column: LedgerColumn::TransactionId,
        sources: &[Source::BodyToken(S::TransactionId, Token::Code), Source::Label("txid")],
    },
    FieldRule {
        column: LedgerColumn::StartHour,
        sources: &[Source::BodyNumber(S::StartHour)],
    },
    FieldRule {
        column: LedgerColumn::EndHour,
        sources: &[Source::BodyNumber(S::EndHour)],
    },
];
