use serde::{Deserialize, Deserializer};

/// A tracker issue as delivered in a GitHub event payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueRecord {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default, deserialize_with = "label_names")]
    pub labels: Vec<String>,
    #[serde(default, rename = "html_url", deserialize_with = "null_as_empty")]
    pub url: String,
}

impl IssueRecord {
    /// Whether the issue carries a bare `bounty` tag or a `bounty:<value>` tag.
    pub fn has_bounty_label(&self) -> bool {
        self.labels
            .iter()
            .any(|l| l == "bounty" || l.starts_with("bounty:"))
    }

    /// Value of the first `prefix:value` label, matched case-insensitively on
    /// the prefix. The value is everything after the first colon, trimmed.
    pub fn label_value(&self, prefix: &str) -> Option<&str> {
        self.labels.iter().find_map(|label| {
            let (key, value) = label.split_once(':')?;
            key.eq_ignore_ascii_case(prefix).then(|| value.trim())
        })
    }
}

/// The envelope of a GitHub Actions event file.
#[derive(Debug, Default, Deserialize)]
pub struct IssueEvent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<IssueRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Named { name: String },
    Bare(String),
}

// Labels arrive as `{ "name": ... }` objects from the REST API and as plain
// strings from hand-written fixtures.
fn label_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawLabel>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|l| match l {
            RawLabel::Named { name } => name,
            RawLabel::Bare(name) => name,
        })
        .collect())
}
