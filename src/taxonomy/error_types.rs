use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

macro_rules! error_types {
    ($($variant:ident => $id:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub enum ErrorType {
            $($variant),*
        }

        impl ErrorType {
            pub const ALL: &'static [ErrorType] = &[$(ErrorType::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ErrorType::$variant => $id),*
                }
            }
        }
    };
}

error_types! {
    // Network
    NetworkError => "network_error",
    TimeoutError => "timeout_error",
    ConnectionResetError => "connection_reset_error",
    DnsError => "dns_error",
    SslError => "ssl_error",
    ProxyError => "proxy_error",
    FirewallError => "firewall_error",
    VpnError => "vpn_error",
    InternetConnectionError => "internet_connection_error",
    // Authentication
    AuthenticationError => "authentication_error",
    Github2faError => "github_2fa_error",
    // Authorization
    AuthorizationError => "authorization_error",
    PermissionDeniedError => "permission_denied_error",
    LocalPermissionError => "local_permission_error",
    // Validation
    ValidationError => "validation_error",
    InvalidInputError => "invalid_input_error",
    NotFoundError => "not_found_error",
    GithubRepositoryNotFound => "github_repository_not_found",
    GithubBranchNotFound => "github_branch_not_found",
    GitlabProjectNotFound => "gitlab_project_not_found",
    GitlabBranchNotFound => "gitlab_branch_not_found",
    LocalRepositoryNotFound => "local_repository_not_found",
    // Configuration
    ConfigurationError => "configuration_error",
    // File system
    FileNotFoundError => "file_not_found_error",
    FileAccessError => "file_access_error",
    FileLockError => "file_lock_error",
    DiskSpaceError => "disk_space_error",
    FileCorruptionError => "file_corruption_error",
    LocalFileError => "local_file_error",
    // Security
    GithubSshError => "github_ssh_error",
    GitlabSshError => "gitlab_ssh_error",
    // API
    ServerError => "server_error",
    RateLimitError => "rate_limit_error",
    TemporaryError => "temporary_error",
    GithubApiError => "github_api_error",
    GithubRateLimitError => "github_rate_limit_error",
    GitlabApiError => "gitlab_api_error",
    GitlabRateLimitError => "gitlab_rate_limit_error",
    GithubMaintenanceError => "github_maintenance_error",
    GitlabMaintenanceError => "gitlab_maintenance_error",
    // Provider
    GithubMergeConflict => "github_merge_conflict",
    GithubPullRequestError => "github_pull_request_error",
    GithubCommitError => "github_commit_error",
    GithubFileError => "github_file_error",
    GithubWebhookError => "github_webhook_error",
    GitlabMergeConflict => "gitlab_merge_conflict",
    GitlabMergeRequestError => "gitlab_merge_request_error",
    GitlabCommitError => "gitlab_commit_error",
    GitlabFileError => "gitlab_file_error",
    GitlabPipelineError => "gitlab_pipeline_error",
    // Local git
    LocalGitError => "local_git_error",
    LocalGitCommandError => "local_git_command_error",
    LocalGitMergeError => "local_git_merge_error",
    LocalGitPushError => "local_git_push_error",
    LocalGitPullError => "local_git_pull_error",
    LocalGitCheckoutError => "local_git_checkout_error",
    LocalGitBranchError => "local_git_branch_error",
    LocalGitCommitError => "local_git_commit_error",
    LocalGitStashError => "local_git_stash_error",
    LocalGitRebaseError => "local_git_rebase_error",
    // Unknown
    UnknownError => "unknown_error",
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ErrorType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| Error::UnknownErrorType(s.to_string()))
    }
}

impl From<ErrorType> for String {
    fn from(error_type: ErrorType) -> Self {
        error_type.as_str().to_string()
    }
}

impl TryFrom<String> for ErrorType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub const ALL: [ErrorSeverity; 4] = [
        ErrorSeverity::Low,
        ErrorSeverity::Medium,
        ErrorSeverity::High,
        ErrorSeverity::Critical,
    ];
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "low"),
            ErrorSeverity::Medium => write!(f, "medium"),
            ErrorSeverity::High => write!(f, "high"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Authentication,
    Authorization,
    Validation,
    Configuration,
    FileSystem,
    Security,
    Api,
    Provider,
    Local,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 11] = [
        ErrorCategory::Network,
        ErrorCategory::Authentication,
        ErrorCategory::Authorization,
        ErrorCategory::Validation,
        ErrorCategory::Configuration,
        ErrorCategory::FileSystem,
        ErrorCategory::Security,
        ErrorCategory::Api,
        ErrorCategory::Provider,
        ErrorCategory::Local,
        ErrorCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::FileSystem => "file_system",
            ErrorCategory::Security => "security",
            ErrorCategory::Api => "api",
            ErrorCategory::Provider => "provider",
            ErrorCategory::Local => "local",
            ErrorCategory::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Option<ErrorCategory> {
        let lower = name.trim().to_lowercase().replace('-', "_");
        ErrorCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorTypeMetadata {
    pub severity: ErrorSeverity,
    pub category: ErrorCategory,
    pub is_retryable: bool,
    /// Seconds
    pub retry_delay: f64,
    pub max_retries: u32,
    pub description: String,
    pub keywords: Vec<String>,
    pub patterns: Vec<String>,
}
