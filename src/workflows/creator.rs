//! Creates a new epic and one child issue per input table row.

use crate::api::jira::IssueTracker;
use crate::config::settings::CreatorConfig;
use crate::errors::Result;
use crate::models::issue::{IssueFields, IssueHandle};
use crate::models::issue_row::IssueRow;
use crate::workflows::EpicReport;
use tracing::{info, warn};

pub async fn create_new_epic(tracker: &impl IssueTracker, config: &CreatorConfig) -> Result<IssueHandle> {
    info!("Creating epic {}", config.epic_name);

    let fields = IssueFields::new(&config.project)
        .custom(&config.fields.epic_name, &config.epic_name)
        .summary(Some(config.epic_name.as_str()))
        .issue_type(Some("Epic"));

    tracker.create_issue(&fields).await.map_err(|e| {
        e.with_creation_context(
            "Failed to create new epic, validate that the jira project name and epic name are valid",
        )
    })
}

/// Creates one child per row, stopping at the first failure.
/// Issues created before the failure are left in place.
pub async fn create_epic_issues<I>(
    tracker: &impl IssueTracker,
    config: &CreatorConfig,
    epic: &IssueHandle,
    rows: I,
) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<IssueRow>>,
{
    let mut created: Vec<String> = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let row = row.inspect_err(|_| report_partial(&epic.key, &created))?;
        let name = row.issue_name.as_deref().unwrap_or("<unnamed>");
        info!("Creating issue {}", name);

        let fields = IssueFields::new(&config.project)
            .custom(&config.fields.epic_link, &epic.key)
            .summary(row.issue_name.as_deref())
            .description(row.issue_description.as_deref())
            .issue_type(row.issue_type.as_deref());

        match tracker.create_issue(&fields).await {
            Ok(issue) => {
                info!(key = %issue.key, "Created issue {}", name);
                created.push(issue.key);
            }
            Err(e) => {
                report_partial(&epic.key, &created);
                return Err(e.with_creation_context(format!(
                    "Failed to create epic issue '{}' (row {})",
                    name,
                    index + 1
                )));
            }
        }
    }

    Ok(created)
}

/// Full creator run against an authenticated tracker.
pub async fn run<I>(tracker: &impl IssueTracker, config: &CreatorConfig, rows: Option<I>) -> Result<EpicReport>
where
    I: IntoIterator<Item = Result<IssueRow>>,
{
    let epic = create_new_epic(tracker, config).await?;
    info!(key = %epic.key, "Created epic {}", config.epic_name);

    let child_keys = match rows {
        Some(rows) => create_epic_issues(tracker, config, &epic, rows).await?,
        None => Vec::new(),
    };

    Ok(EpicReport {
        epic_key: epic.key,
        child_keys,
    })
}

fn report_partial(epic_key: &str, created: &[String]) {
    if created.is_empty() {
        warn!("Epic {} was created but none of its issues were", epic_key);
    } else {
        warn!(
            "Epic {} and issues {} were already created and are not rolled back",
            epic_key,
            created.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{CustomFields, JiraCredentials};
    use crate::errors::EpicError;
    use crate::workflows::fake::FakeTracker;
    use serde_json::json;

    fn config() -> CreatorConfig {
        CreatorConfig {
            jira: JiraCredentials {
                server: "https://jira.example.com".to_string(),
                user_email: "test@example.com".to_string(),
                api_token: "test-token".to_string(),
            },
            project: "TEST".to_string(),
            epic_name: "Onboarding".to_string(),
            fields: CustomFields::default(),
            input_tables: Vec::new(),
        }
    }

    fn row(name: &str, issue_type: &str) -> Result<IssueRow> {
        Ok(IssueRow {
            issue_name: Some(name.to_string()),
            issue_description: Some(format!("{} details", name)),
            issue_type: Some(issue_type.to_string()),
        })
    }

    #[tokio::test]
    async fn test_epic_only_without_table() {
        let tracker = FakeTracker::default();

        let report = run(&tracker, &config(), None::<Vec<Result<IssueRow>>>)
            .await
            .unwrap();

        assert_eq!(report.epic_key, "NEW-1");
        assert!(report.child_keys.is_empty());

        let created = tracker.created();
        assert_eq!(created.len(), 1);
        let epic = &created[0];
        assert_eq!(epic.get("project"), Some(&json!({ "key": "TEST" })));
        assert_eq!(epic.get("customfield_10011"), Some(&json!("Onboarding")));
        assert_eq!(epic.get("summary"), Some(&json!("Onboarding")));
        assert_eq!(epic.get("issuetype"), Some(&json!({ "name": "Epic" })));
    }

    #[tokio::test]
    async fn test_one_child_per_row_in_order() {
        let tracker = FakeTracker::default();
        let rows = vec![row("Alpha", "Task"), row("Beta", "Story"), row("Gamma", "Bug")];

        let report = run(&tracker, &config(), Some(rows)).await.unwrap();

        assert_eq!(report.child_keys, vec!["NEW-2", "NEW-3", "NEW-4"]);

        let created = tracker.created();
        assert_eq!(created.len(), 4);

        let children = &created[1..];
        let summaries: Vec<&serde_json::Value> =
            children.iter().map(|c| c.get("summary").unwrap()).collect();
        assert_eq!(summaries, vec![&json!("Alpha"), &json!("Beta"), &json!("Gamma")]);

        for child in children {
            assert_eq!(child.get("customfield_10014"), Some(&json!("NEW-1")));
            assert_eq!(child.get("project"), Some(&json!({ "key": "TEST" })));
        }
        assert_eq!(children[1].get("issuetype"), Some(&json!({ "name": "Story" })));
        assert_eq!(children[2].get("description"), Some(&json!("Gamma details")));
    }

    #[tokio::test]
    async fn test_custom_field_ids_are_configurable() {
        let tracker = FakeTracker::default();
        let mut config = config();
        config.fields = CustomFields {
            epic_name: "customfield_20001".to_string(),
            epic_link: "customfield_20002".to_string(),
        };

        run(&tracker, &config, Some(vec![row("Alpha", "Task")]))
            .await
            .unwrap();

        let created = tracker.created();
        assert_eq!(created[0].get("customfield_20001"), Some(&json!("Onboarding")));
        assert!(created[0].get("customfield_10011").is_none());
        assert_eq!(created[1].get("customfield_20002"), Some(&json!("NEW-1")));
    }

    #[tokio::test]
    async fn test_missing_columns_pass_through_as_null() {
        let tracker = FakeTracker::default();
        let rows = vec![Ok(IssueRow {
            issue_name: Some("Bare".to_string()),
            ..Default::default()
        })];

        run(&tracker, &config(), Some(rows)).await.unwrap();

        let child = &tracker.created()[1];
        assert_eq!(child.get("description"), Some(&serde_json::Value::Null));
        assert_eq!(child.get("issuetype"), Some(&serde_json::Value::Null));
    }

    #[tokio::test]
    async fn test_child_failure_stops_the_run() {
        let tracker = FakeTracker {
            fail_on_create: Some(2),
            ..Default::default()
        };
        let rows = vec![
            row("Alpha", "Task"),
            row("Beta", "Task"),
            row("Gamma", "Task"),
            row("Delta", "Task"),
        ];

        let err = run(&tracker, &config(), Some(rows)).await.unwrap_err();

        // epic + Alpha succeeded, Beta failed, nothing after it was attempted
        assert_eq!(tracker.created().len(), 3);
        assert_eq!(err.exit_code(), 1);
        match err {
            EpicError::IssueCreationFailed { context, remote } => {
                assert_eq!(context, "Failed to create epic issue 'Beta' (row 2)");
                assert!(remote.unwrap().contains("issuetype"));
            }
            other => panic!("expected issue creation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_epic_failure_skips_children() {
        let tracker = FakeTracker {
            fail_on_create: Some(0),
            ..Default::default()
        };

        let err = run(&tracker, &config(), Some(vec![row("Alpha", "Task")]))
            .await
            .unwrap_err();

        assert_eq!(tracker.created().len(), 1);
        assert!(err.to_string().contains("Failed to create new epic"));
    }

    #[tokio::test]
    async fn test_unreadable_row_stops_the_run() {
        let tracker = FakeTracker::default();
        let rows = vec![
            row("Alpha", "Task"),
            Err(EpicError::InputTable("CSV error: record 2".to_string())),
            row("Gamma", "Task"),
        ];

        let err = run(&tracker, &config(), Some(rows)).await.unwrap_err();

        assert!(matches!(err, EpicError::InputTable(_)));
        assert_eq!(tracker.created().len(), 2);
    }
}
