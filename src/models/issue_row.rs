use serde::{Deserialize, Deserializer};

/// One line of the creator's input table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssueRow {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub issue_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub issue_description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub issue_type: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
