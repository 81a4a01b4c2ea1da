pub mod copier;
pub mod creator;

/// Keys of everything a workflow created, in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpicReport {
    pub epic_key: String,
    pub child_keys: Vec<String>,
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::api::jira::IssueTracker;
    use crate::errors::{EpicError, Result};
    use crate::models::issue::{IssueFields, IssueHandle};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory tracker recording every call it receives.
    #[derive(Default)]
    pub struct FakeTracker {
        pub issues: HashMap<String, IssueHandle>,
        pub search_results: Vec<IssueHandle>,
        /// Zero-based index of the create call that should be rejected.
        pub fail_on_create: Option<usize>,
        pub created: Mutex<Vec<IssueFields>>,
        pub fetched: Mutex<Vec<String>>,
        pub searched: Mutex<Vec<String>>,
    }

    impl FakeTracker {
        pub fn created(&self) -> Vec<IssueFields> {
            self.created.lock().unwrap().clone()
        }

        pub fn searched(&self) -> Vec<String> {
            self.searched.lock().unwrap().clone()
        }

        pub fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn create_issue(&self, fields: &IssueFields) -> Result<IssueHandle> {
            let mut created = self.created.lock().unwrap();
            let index = created.len();
            created.push(fields.clone());

            if self.fail_on_create == Some(index) {
                return Err(EpicError::issue_creation(
                    "Jira rejected the issue (400 Bad Request)",
                    Some("issuetype: valid issue type is required".to_string()),
                ));
            }

            Ok(IssueHandle {
                id: format!("{}", 10000 + index),
                key: format!("NEW-{}", index + 1),
                fields: Default::default(),
            })
        }

        async fn get_issue(&self, key: &str) -> Result<IssueHandle> {
            self.fetched.lock().unwrap().push(key.to_string());
            self.issues
                .get(key)
                .cloned()
                .ok_or_else(|| EpicError::JiraIssueNotFound(key.to_string()))
        }

        async fn search_issues(&self, jql: &str) -> Result<Vec<IssueHandle>> {
            self.searched.lock().unwrap().push(jql.to_string());
            Ok(self.search_results.clone())
        }
    }
}
