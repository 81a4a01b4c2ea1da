use colored::*;
use std::fmt;

#[derive(Debug)]
pub enum EpicError {
    // Configuration errors
    ConfigMissingKeys(Vec<String>),
    ConfigInvalid(String),
    TooManyInputTables(usize),

    // Input table errors
    InputTable(String),

    // Jira errors
    JiraAuthFailed(String),
    JiraIssueNotFound(String),
    IssueCreationFailed {
        context: String,
        remote: Option<String>,
    },
    JiraApiError(u16, String),

    // Unexpected faults
    Internal(String),
}

impl EpicError {
    /// Process exit status for this failure: `1` for usage and remote
    /// problems the user can act on, `2` for internal defects.
    pub fn exit_code(&self) -> i32 {
        match self {
            EpicError::Internal(_) => 2,
            _ => 1,
        }
    }

    pub fn is_user_facing(&self) -> bool {
        self.exit_code() == 1
    }

    pub fn issue_creation(context: impl Into<String>, remote: Option<String>) -> Self {
        EpicError::IssueCreationFailed {
            context: context.into(),
            remote,
        }
    }

    /// Replaces the headline of an issue creation failure, keeping the
    /// remote details. Other errors pass through untouched.
    pub fn with_creation_context(self, context: impl Into<String>) -> Self {
        match self {
            EpicError::IssueCreationFailed { remote, .. } => EpicError::issue_creation(context, remote),
            other => other,
        }
    }
}

impl fmt::Display for EpicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Configuration errors
            EpicError::ConfigMissingKeys(keys) => {
                write!(f, "{}\n", "Missing required configuration".red().bold())?;
                write!(f, "   {}\n\n", format!("Missing keys: {}", keys.join(", ")).dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Add the keys to your config file\n")?;
                write!(f, "   2. Or export them, e.g. {}", "JIRA_EPIC_PROJECT=ABC".green())
            }
            EpicError::ConfigInvalid(msg) => {
                write!(f, "{}\n", "Invalid configuration".red().bold())?;
                write!(f, "   {}\n\n", msg.dimmed())?;
                write!(f, "   Check the file passed with {}", "--config".green())
            }
            EpicError::TooManyInputTables(count) => {
                write!(f, "{}\n", "Exactly one input table allowed".red().bold())?;
                write!(f, "   {}\n\n", format!("{} input tables were supplied", count).dimmed())?;
                write!(f, "   Pass a single {} or none at all", "--input <CSV>".green())
            }

            // Input table errors
            EpicError::InputTable(msg) => {
                write!(f, "{}\n", "Failed to read input table".red().bold())?;
                write!(f, "   {}\n\n", msg.dimmed())?;
                write!(f, "   Expected a CSV with columns issue_name, issue_description, issue_type")
            }

            // Jira errors
            EpicError::JiraAuthFailed(msg) => {
                write!(f, "{}\n", "Failed to authenticate client, please revalidate your email and token".red().bold())?;
                write!(f, "   {}\n\n", msg.dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Check the server URL is reachable\n")?;
                write!(f, "   2. Generate new token: {}\n", "https://id.atlassian.com/manage-profile/security/api-tokens".cyan())?;
                write!(f, "   3. Update {} and {}", "user_email".green(), "#api_token".green())
            }
            EpicError::JiraIssueNotFound(key) => {
                write!(f, "{}\n", format!("Issue '{}' not found", key).red().bold())?;
                write!(f, "   {}\n\n", "The issue doesn't exist or you don't have access to it".dimmed())?;
                write!(f, "   Check {} in your configuration", "original_epic_key".green())
            }
            EpicError::IssueCreationFailed { context, remote } => {
                write!(f, "{}\n", context.red().bold())?;
                match remote {
                    Some(text) => write!(f, "   {}", text.dimmed()),
                    None => write!(f, "   {}", "Jira returned no error details".dimmed()),
                }
            }
            EpicError::JiraApiError(status, msg) => {
                write!(f, "{}\n", format!("Jira API error ({})", status).red().bold())?;
                write!(f, "   {}", msg.dimmed())
            }

            // Generic
            EpicError::Internal(msg) => {
                write!(f, "{}\n", "Internal error".red().bold())?;
                write!(f, "   {}", msg.dimmed())
            }
        }
    }
}

impl std::error::Error for EpicError {}

impl From<anyhow::Error> for EpicError {
    fn from(err: anyhow::Error) -> Self {
        EpicError::Internal(format!("{:#}", err))
    }
}

impl From<csv::Error> for EpicError {
    fn from(err: csv::Error) -> Self {
        EpicError::InputTable(err.to_string())
    }
}

impl From<::config::ConfigError> for EpicError {
    fn from(err: ::config::ConfigError) -> Self {
        EpicError::ConfigInvalid(err.to_string())
    }
}

impl From<reqwest::Error> for EpicError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EpicError::Internal(format!("Unexpected response from Jira: {}", err))
        } else if let Some(status) = err.status() {
            EpicError::JiraApiError(status.as_u16(), err.to_string())
        } else {
            EpicError::JiraApiError(0, err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, EpicError>;
