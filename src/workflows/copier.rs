//! Copies an existing epic and every issue linked to it into a project.

use crate::api::jira::IssueTracker;
use crate::config::settings::CopierConfig;
use crate::errors::Result;
use crate::models::issue::{IssueFields, IssueHandle};
use crate::workflows::EpicReport;
use tracing::{info, warn};

pub async fn copy_epic(tracker: &impl IssueTracker, config: &CopierConfig) -> Result<EpicReport> {
    info!("Fetching original epic {}", config.original_epic_key);
    let source = tracker.get_issue(&config.original_epic_key).await?;

    info!("Creating epic {}", config.epic_name);
    let epic = create_copied_epic(tracker, config, &source).await?;
    info!(key = %epic.key, "Created epic {}", config.epic_name);

    let jql = config.linked_issues_jql();
    let linked = tracker.search_issues(&jql).await?;
    info!("Found {} issues linked to {}", linked.len(), source.key);

    let mut child_keys: Vec<String> = Vec::new();
    for issue in &linked {
        info!("Copying issue {}", issue.key);
        let fields = copied_child_fields(&config.project, issue, &epic.key);

        match tracker.create_issue(&fields).await {
            Ok(created) => {
                info!(key = %created.key, "Copied {} as {}", issue.key, created.key);
                child_keys.push(created.key);
            }
            Err(e) => {
                warn!(
                    "Epic {} and {} copied issue(s) were already created and are not rolled back",
                    epic.key,
                    child_keys.len()
                );
                return Err(e.with_creation_context(format!("Failed to copy issue {}", issue.key)));
            }
        }
    }

    Ok(EpicReport {
        epic_key: epic.key,
        child_keys,
    })
}

async fn create_copied_epic(
    tracker: &impl IssueTracker,
    config: &CopierConfig,
    source: &IssueHandle,
) -> Result<IssueHandle> {
    let fields = IssueFields::new(&config.project)
        .summary(Some(config.epic_name.as_str()))
        .raw_description(source.description())
        .issue_type(Some("Epic"));

    tracker.create_issue(&fields).await.map_err(|e| {
        e.with_creation_context(format!("Failed to create copy of epic {}", source.key))
    })
}

fn copied_child_fields(project: &str, issue: &IssueHandle, parent_key: &str) -> IssueFields {
    IssueFields::new(project)
        .summary(issue.summary())
        .raw_description(issue.description())
        .issue_type(issue.issue_type_name())
        .parent(parent_key)
}
