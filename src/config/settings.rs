use crate::errors::{EpicError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "jira-epic.toml";
pub const ENV_PREFIX: &str = "JIRA_EPIC";

pub const KEY_API_TOKEN: &str = "#api_token";
pub const KEY_PROJECT: &str = "project";
pub const KEY_SERVER: &str = "server";
pub const KEY_USER_EMAIL: &str = "user_email";
pub const KEY_EPIC_NAME: &str = "epic_name";
pub const KEY_ORIGINAL_EPIC_KEY: &str = "original_epic_key";

pub const DEFAULT_EPIC_NAME_FIELD: &str = "customfield_10011";
pub const DEFAULT_EPIC_LINK_FIELD: &str = "customfield_10014";
pub const DEFAULT_CHILD_QUERY: &str = "\"Epic Link\" = {epic}";

/// Raw parameters as read from the config file and environment.
/// Nothing is required at this stage; see the `validate_*` methods.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(rename = "#api_token", default, skip_serializing_if = "Option::is_none")]
    pub secret_api_token: Option<String>,
    /// Plain spelling, used by `JIRA_EPIC_API_TOKEN`. Wins over `#api_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_epic_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_tables: Vec<PathBuf>,
    #[serde(default)]
    pub fields: CustomFields,
}

/// Instance specific custom field ids used by the creator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CustomFields {
    #[serde(default = "default_epic_name_field")]
    pub epic_name: String,
    #[serde(default = "default_epic_link_field")]
    pub epic_link: String,
}

impl Default for CustomFields {
    fn default() -> Self {
        Self {
            epic_name: default_epic_name_field(),
            epic_link: default_epic_link_field(),
        }
    }
}

fn default_epic_name_field() -> String {
    DEFAULT_EPIC_NAME_FIELD.to_string()
}

fn default_epic_link_field() -> String {
    DEFAULT_EPIC_LINK_FIELD.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct JiraCredentials {
    pub server: String,
    pub user_email: String,
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatorConfig {
    pub jira: JiraCredentials,
    pub project: String,
    pub epic_name: String,
    pub fields: CustomFields,
    pub input_tables: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopierConfig {
    pub jira: JiraCredentials,
    pub project: String,
    pub epic_name: String,
    pub original_epic_key: String,
    pub child_query: String,
}

impl CopierConfig {
    /// JQL selecting the issues linked to the source epic.
    pub fn linked_issues_jql(&self) -> String {
        self.child_query.replace("{epic}", &self.original_epic_key)
    }
}

impl Parameters {
    /// Layers the config file (if any) under `JIRA_EPIC_*` environment
    /// variables. An explicitly named file must exist; the default one may not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if required && !path.exists() {
            return Err(EpicError::ConfigInvalid(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_path()).required(required))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let params: Parameters = settings.try_deserialize()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(params)
    }

    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    fn token(&self) -> Option<&str> {
        non_blank(&self.api_token).or_else(|| non_blank(&self.secret_api_token))
    }

    fn credential_keys(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            (KEY_API_TOKEN, self.token()),
            (KEY_SERVER, non_blank(&self.server)),
            (KEY_USER_EMAIL, non_blank(&self.user_email)),
        ]
    }

    pub fn validate_credentials(&self) -> Result<JiraCredentials> {
        require(&self.credential_keys())?;
        self.credentials()
    }

    pub fn validate_creator(&self) -> Result<CreatorConfig> {
        let mut keys = self.credential_keys();
        keys.push((KEY_PROJECT, non_blank(&self.project)));
        keys.push((KEY_EPIC_NAME, non_blank(&self.epic_name)));
        require(&keys)?;

        Ok(CreatorConfig {
            jira: self.credentials()?,
            project: trimmed(&self.project),
            epic_name: trimmed(&self.epic_name),
            fields: self.fields.clone(),
            input_tables: self.input_tables.clone(),
        })
    }

    pub fn validate_copier(&self) -> Result<CopierConfig> {
        let mut keys = self.credential_keys();
        keys.push((KEY_PROJECT, non_blank(&self.project)));
        keys.push((KEY_EPIC_NAME, non_blank(&self.epic_name)));
        keys.push((KEY_ORIGINAL_EPIC_KEY, non_blank(&self.original_epic_key)));
        require(&keys)?;

        let child_query = non_blank(&self.child_query)
            .unwrap_or(DEFAULT_CHILD_QUERY)
            .to_string();
        if !child_query.contains("{epic}") {
            return Err(EpicError::ConfigInvalid(
                "child_query must contain the {epic} placeholder".to_string(),
            ));
        }

        Ok(CopierConfig {
            jira: self.credentials()?,
            project: trimmed(&self.project),
            epic_name: trimmed(&self.epic_name),
            original_epic_key: trimmed(&self.original_epic_key),
            child_query,
        })
    }

    fn credentials(&self) -> Result<JiraCredentials> {
        let server = trimmed(&self.server).trim_end_matches('/').to_string();
        if !server.starts_with("https://") && !server.starts_with("http://") {
            return Err(EpicError::ConfigInvalid(format!(
                "server must be an http(s) URL, got '{}'",
                server
            )));
        }

        Ok(JiraCredentials {
            server,
            user_email: trimmed(&self.user_email),
            api_token: self.token().unwrap_or_default().to_string(),
        })
    }

    /// Copy safe to print: the token is masked.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.secret_api_token = self.token().map(mask_secret);
        masked.api_token = None;
        masked
    }
}

fn require(keys: &[(&'static str, Option<&str>)]) -> Result<()> {
    let missing: Vec<String> = keys
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EpicError::ConfigMissingKeys(missing))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn trimmed(value: &Option<String>) -> String {
    non_blank(value).unwrap_or_default().to_string()
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}
