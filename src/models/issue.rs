use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Raw Jira field map, keyed by field id (`summary`, `customfield_10011`, ...).
pub type FieldMap = Map<String, Value>;

/// An issue as returned by the Jira API.
///
/// Creation responses only carry `id` and `key`; fetch and search responses
/// also carry the raw `fields` map.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueHandle {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub fields: FieldMap,
}

impl IssueHandle {
    pub fn summary(&self) -> Option<&str> {
        self.fields.get("summary").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&Value> {
        self.fields.get("description").filter(|v| !v.is_null())
    }

    pub fn issue_type_name(&self) -> Option<&str> {
        self.fields
            .get("issuetype")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
    }
}

/// Payload builder for `POST /rest/api/2/issue`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFields {
    fields: FieldMap,
}

impl IssueFields {
    pub fn new(project_key: &str) -> Self {
        let mut fields = FieldMap::new();
        fields.insert("project".to_string(), json!({ "key": project_key }));
        Self { fields }
    }

    pub fn summary(self, summary: Option<&str>) -> Self {
        self.set("summary", json!(summary))
    }

    pub fn description(self, description: Option<&str>) -> Self {
        self.set("description", json!(description))
    }

    /// Copies a description value verbatim; nothing is written when absent.
    pub fn raw_description(self, description: Option<&Value>) -> Self {
        match description {
            Some(value) => self.set("description", value.clone()),
            None => self,
        }
    }

    /// `None` is passed through as `null` and left for Jira to reject.
    pub fn issue_type(self, name: Option<&str>) -> Self {
        let value = match name {
            Some(name) => json!({ "name": name }),
            None => Value::Null,
        };
        self.set("issuetype", value)
    }

    pub fn parent(self, parent_key: &str) -> Self {
        self.set("parent", json!({ "key": parent_key }))
    }

    pub fn custom(self, field_id: &str, value: &str) -> Self {
        self.set(field_id, json!(value))
    }

    pub fn get(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id)
    }

    pub fn to_payload(&self) -> Value {
        json!({ "fields": self.fields })
    }

    fn set(mut self, field_id: &str, value: Value) -> Self {
        self.fields.insert(field_id.to_string(), value);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "startAt", default)]
    pub start_at: u64,
    #[serde(rename = "maxResults", default)]
    #[allow(dead_code)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<IssueHandle>,
}

/// Error body Jira sends with 4xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct JiraErrorBody {
    #[serde(rename = "errorMessages", default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: Map<String, Value>,
}

impl JiraErrorBody {
    /// Flattens the body into `msg; field: msg` form, `None` when empty.
    pub fn condensed(&self) -> Option<String> {
        let mut parts: Vec<String> = self.error_messages.clone();
        for (field, message) in &self.errors {
            let message = message
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| message.to_string());
            parts.push(format!("{}: {}", field, message));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_fields_payload() {
        let fields = IssueFields::new("ABC")
            .summary(Some("Login page"))
            .description(None)
            .issue_type(Some("Story"))
            .parent("ABC-1");

        let payload = fields.to_payload();
        assert_eq!(payload["fields"]["project"]["key"], "ABC");
        assert_eq!(payload["fields"]["summary"], "Login page");
        assert!(payload["fields"]["description"].is_null());
        assert_eq!(payload["fields"]["issuetype"]["name"], "Story");
        assert_eq!(payload["fields"]["parent"]["key"], "ABC-1");
    }

    #[test]
    fn test_missing_issue_type_is_null() {
        let fields = IssueFields::new("ABC").issue_type(None);
        assert_eq!(fields.get("issuetype"), Some(&Value::Null));
    }

    #[test]
    fn test_raw_description_skipped_when_absent() {
        let fields = IssueFields::new("ABC").raw_description(None);
        assert!(fields.get("description").is_none());

        let text = json!("D");
        let fields = IssueFields::new("ABC").raw_description(Some(&text));
        assert_eq!(fields.get("description"), Some(&json!("D")));
    }

    #[test]
    fn test_issue_handle_accessors() {
        let issue: IssueHandle = serde_json::from_value(json!({
            "id": "10001",
            "key": "ABC-7",
            "fields": {
                "summary": "Checkout",
                "description": null,
                "issuetype": { "id": "3", "name": "Task" }
            }
        }))
        .unwrap();

        assert_eq!(issue.summary(), Some("Checkout"));
        assert!(issue.description().is_none());
        assert_eq!(issue.issue_type_name(), Some("Task"));
    }

    #[test]
    fn test_created_issue_response_has_no_fields() {
        let issue: IssueHandle = serde_json::from_value(json!({
            "id": "10002",
            "key": "ABC-8",
            "self": "https://jira.example.com/rest/api/2/issue/10002"
        }))
        .unwrap();

        assert_eq!(issue.key, "ABC-8");
        assert!(issue.fields.is_empty());
    }

    #[test]
    fn test_error_body_condensed() {
        let body: JiraErrorBody = serde_json::from_value(json!({
            "errorMessages": ["Something went wrong"],
            "errors": { "customfield_10011": "Field cannot be set" }
        }))
        .unwrap();

        assert_eq!(
            body.condensed().unwrap(),
            "Something went wrong; customfield_10011: Field cannot be set"
        );
        assert!(JiraErrorBody::default().condensed().is_none());
    }
}
