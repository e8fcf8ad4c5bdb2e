pub mod error_types;

use std::collections::{HashMap, HashSet};

pub use error_types::{ErrorCategory, ErrorSeverity, ErrorType, ErrorTypeMetadata};

use ErrorSeverity::{Critical, High, Low, Medium};

/// (type, severity, retryable, retry delay secs, max retries, description, keywords, patterns)
type Entry = (
    ErrorType,
    ErrorSeverity,
    bool,
    f64,
    u32,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
);

/// Immutable error-type policy table. Build once at startup and share it
/// behind an `Arc`; there is no way to register types afterwards.
pub struct ErrorTypeRegistry {
    metadata: HashMap<ErrorType, ErrorTypeMetadata>,
    by_category: HashMap<ErrorCategory, HashSet<ErrorType>>,
    by_severity: HashMap<ErrorSeverity, HashSet<ErrorType>>,
    retryable: HashSet<ErrorType>,
    non_retryable: HashSet<ErrorType>,
}

impl ErrorTypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            metadata: HashMap::new(),
            by_category: HashMap::new(),
            by_severity: HashMap::new(),
            retryable: HashSet::new(),
            non_retryable: HashSet::new(),
        };

        registry.init_network();
        registry.init_authentication();
        registry.init_authorization();
        registry.init_validation();
        registry.init_configuration();
        registry.init_file_system();
        registry.init_security();
        registry.init_api();
        registry.init_provider();
        registry.init_local();
        registry.init_unknown();

        tracing::debug!("Error type registry built with {} types", registry.metadata.len());
        registry
    }

    fn init_network(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::NetworkError, Medium, true, 1.0, 3,
                "General network connectivity error",
                &["network", "connection", "timeout"],
                &[r"network.*error", r"connection.*failed", r"timeout"]),
            (ErrorType::TimeoutError, Medium, true, 2.0, 3,
                "Request timeout error",
                &["timeout", "timed out", "deadline"],
                &[r"timeout", r"timed out", r"deadline exceeded"]),
            (ErrorType::ConnectionResetError, Medium, true, 1.5, 3,
                "Connection was reset by peer",
                &["connection reset", "reset by peer"],
                &[r"connection.*reset", r"reset by peer"]),
            (ErrorType::DnsError, High, true, 5.0, 2,
                "DNS resolution error",
                &["dns", "name resolution", "hostname"],
                &[r"dns.*error", r"name resolution", r"hostname.*not found"]),
            (ErrorType::SslError, High, true, 3.0, 2,
                "SSL/TLS connection error",
                &["ssl", "tls", "certificate"],
                &[r"ssl.*error", r"tls.*error", r"certificate.*error"]),
            (ErrorType::ProxyError, Medium, true, 2.0, 3,
                "Proxy connection error",
                &["proxy", "tunnel"],
                &[r"proxy.*error", r"proxy.*refused", r"407"]),
            (ErrorType::FirewallError, High, false, 0.0, 0,
                "Connection blocked by firewall",
                &["firewall", "blocked"],
                &[r"firewall", r"blocked by"]),
            (ErrorType::VpnError, High, true, 5.0, 2,
                "VPN connection error",
                &["vpn", "tunnel down"],
                &[r"vpn.*error", r"vpn.*disconnected"]),
            (ErrorType::InternetConnectionError, High, true, 5.0, 3,
                "No internet connection",
                &["internet", "offline", "unreachable"],
                &[r"network.*unreachable", r"no.*internet", r"offline"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Network, *entry);
        }
    }

    fn init_authentication(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::AuthenticationError, High, false, 0.0, 0,
                "Authentication failed",
                &["auth", "login", "credentials", "token"],
                &[r"auth.*failed", r"invalid.*credentials", r"unauthorized"]),
            (ErrorType::Github2faError, High, false, 0.0, 0,
                "GitHub 2FA authentication required",
                &["2fa", "two factor", "otp", "totp"],
                &[r"2fa.*required", r"two.*factor", r"otp.*required"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Authentication, *entry);
        }
    }

    fn init_authorization(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::AuthorizationError, High, false, 0.0, 0,
                "Authorization failed",
                &["forbidden", "access denied", "permission"],
                &[r"forbidden", r"access.*denied", r"permission.*denied"]),
            (ErrorType::PermissionDeniedError, High, false, 0.0, 0,
                "Permission denied",
                &["permission", "denied", "access"],
                &[r"permission.*denied", r"access.*denied"]),
            (ErrorType::LocalPermissionError, Medium, false, 0.0, 0,
                "Local filesystem permission denied",
                &["permission", "local", "not permitted"],
                &[r"operation not permitted", r"eacces"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Authorization, *entry);
        }
    }

    fn init_validation(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::ValidationError, Medium, false, 0.0, 0,
                "Input validation error",
                &["validation", "invalid", "bad request"],
                &[r"validation.*error", r"invalid.*input", r"bad.*request"]),
            (ErrorType::InvalidInputError, Medium, false, 0.0, 0,
                "Invalid input provided",
                &["invalid", "input", "malformed"],
                &[r"invalid.*input", r"malformed.*request"]),
            (ErrorType::NotFoundError, Medium, false, 0.0, 0,
                "Resource not found",
                &["not found", "404", "missing"],
                &[r"not.*found", r"404", r"missing.*resource"]),
            (ErrorType::GithubRepositoryNotFound, Medium, false, 0.0, 0,
                "GitHub repository not found",
                &["repository", "not found", "github"],
                &[r"repository.*not.*found"]),
            (ErrorType::GithubBranchNotFound, Medium, false, 0.0, 0,
                "GitHub branch not found",
                &["branch", "not found", "github"],
                &[r"branch.*not.*found"]),
            (ErrorType::GitlabProjectNotFound, Medium, false, 0.0, 0,
                "GitLab project not found",
                &["project", "not found", "gitlab"],
                &[r"project.*not.*found"]),
            (ErrorType::GitlabBranchNotFound, Medium, false, 0.0, 0,
                "GitLab branch not found",
                &["branch", "not found", "gitlab"],
                &[r"branch.*not.*found"]),
            (ErrorType::LocalRepositoryNotFound, Medium, false, 0.0, 0,
                "Local repository not found",
                &["not a git repository", "repository"],
                &[r"not a git repository"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Validation, *entry);
        }
    }

    fn init_configuration(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::ConfigurationError, High, false, 0.0, 0,
                "Configuration error",
                &["config", "configuration", "setup"],
                &[r"config.*error", r"configuration.*error", r"setup.*error"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Configuration, *entry);
        }
    }

    fn init_file_system(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::FileNotFoundError, Medium, false, 0.0, 0,
                "File not found",
                &["file", "not found", "missing"],
                &[r"file.*not.*found", r"no.*such.*file"]),
            (ErrorType::FileAccessError, Medium, false, 0.0, 0,
                "File access error",
                &["file", "access", "permission"],
                &[r"file.*access", r"permission.*denied"]),
            (ErrorType::FileLockError, Medium, true, 1.0, 3,
                "File is locked by another process",
                &["lock", "locked"],
                &[r"\.lock", r"file.*locked", r"unable to create.*lock"]),
            (ErrorType::DiskSpaceError, High, false, 0.0, 0,
                "Insufficient disk space",
                &["disk", "space", "full"],
                &[r"disk.*space", r"no.*space", r"device.*full"]),
            (ErrorType::FileCorruptionError, Critical, false, 0.0, 0,
                "File or object corruption",
                &["corrupt", "checksum", "bad object"],
                &[r"corrupt", r"checksum.*mismatch", r"bad object"]),
            (ErrorType::LocalFileError, Medium, false, 0.0, 0,
                "Local file operation error",
                &["file", "local"],
                &[r"local.*file", r"file.*error"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::FileSystem, *entry);
        }
    }

    fn init_security(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::GithubSshError, High, true, 2.0, 2,
                "GitHub SSH authentication error",
                &["ssh", "github", "key"],
                &[r"ssh.*error", r"github.*ssh", r"key.*error"]),
            (ErrorType::GitlabSshError, High, true, 2.0, 2,
                "GitLab SSH authentication error",
                &["ssh", "gitlab", "key"],
                &[r"ssh.*error", r"gitlab.*ssh", r"key.*error"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Security, *entry);
        }
    }

    fn init_api(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::ServerError, High, true, 3.0, 3,
                "Server error",
                &["server", "error", "500"],
                &[r"server.*error", r"500", r"internal.*error"]),
            (ErrorType::RateLimitError, Medium, true, 60.0, 1,
                "Rate limit exceeded",
                &["rate", "limit", "quota", "throttle"],
                &[r"rate.*limit", r"quota.*exceeded", r"throttle"]),
            (ErrorType::TemporaryError, Medium, true, 2.0, 3,
                "Temporary service error",
                &["temporary", "service", "unavailable"],
                &[r"temporary", r"service.*unavailable", r"try.*again"]),
            (ErrorType::GithubApiError, High, true, 3.0, 3,
                "GitHub API error",
                &["github", "api"],
                &[r"github.*api", r"api\.github\.com"]),
            (ErrorType::GithubRateLimitError, Medium, true, 60.0, 1,
                "GitHub API rate limit exceeded",
                &["github", "rate limit", "secondary rate limit"],
                &[r"api rate limit exceeded", r"secondary rate limit"]),
            (ErrorType::GitlabApiError, High, true, 3.0, 3,
                "GitLab API error",
                &["gitlab", "api"],
                &[r"gitlab.*api", r"/api/v4/"]),
            (ErrorType::GitlabRateLimitError, Medium, true, 60.0, 1,
                "GitLab API rate limit exceeded",
                &["gitlab", "rate limit", "retry later"],
                &[r"gitlab.*rate.*limit", r"retry later"]),
            (ErrorType::GithubMaintenanceError, High, true, 120.0, 2,
                "GitHub is under maintenance",
                &["github", "maintenance"],
                &[r"github.*maintenance", r"scheduled maintenance"]),
            (ErrorType::GitlabMaintenanceError, High, true, 120.0, 2,
                "GitLab is under maintenance",
                &["gitlab", "maintenance"],
                &[r"gitlab.*maintenance", r"deploy in progress"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Api, *entry);
        }
    }

    fn init_provider(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::GithubMergeConflict, Medium, false, 0.0, 0,
                "GitHub merge conflict",
                &["merge", "conflict", "github"],
                &[r"merge.*conflict", r"conflict.*github"]),
            (ErrorType::GithubPullRequestError, Medium, false, 0.0, 0,
                "GitHub pull request error",
                &["pull request", "github"],
                &[r"pull request.*(failed|error)", r"a pull request already exists"]),
            (ErrorType::GithubCommitError, Medium, false, 0.0, 0,
                "GitHub commit error",
                &["commit", "github"],
                &[r"commit.*failed", r"sha.*does not match"]),
            (ErrorType::GithubFileError, Medium, false, 0.0, 0,
                "GitHub file content error",
                &["file", "github", "contents"],
                &[r"contents.*failed", r"sha.*wasn't supplied"]),
            (ErrorType::GithubWebhookError, Low, true, 5.0, 3,
                "GitHub webhook delivery error",
                &["webhook", "hook", "delivery"],
                &[r"webhook.*(failed|error)", r"hook.*delivery"]),
            (ErrorType::GitlabMergeConflict, Medium, false, 0.0, 0,
                "GitLab merge conflict",
                &["merge", "conflict", "gitlab"],
                &[r"merge.*conflict", r"conflict.*gitlab"]),
            (ErrorType::GitlabMergeRequestError, Medium, false, 0.0, 0,
                "GitLab merge request error",
                &["merge request", "gitlab"],
                &[r"merge request.*(failed|error)", r"another open merge request"]),
            (ErrorType::GitlabCommitError, Medium, false, 0.0, 0,
                "GitLab commit error",
                &["commit", "gitlab"],
                &[r"commit.*failed", r"a file with this name already exists"]),
            (ErrorType::GitlabFileError, Medium, false, 0.0, 0,
                "GitLab repository file error",
                &["file", "gitlab"],
                &[r"repository file.*(failed|error)", r"file.*doesn't exist"]),
            (ErrorType::GitlabPipelineError, Medium, true, 10.0, 2,
                "GitLab pipeline error",
                &["pipeline", "job", "gitlab"],
                &[r"pipeline.*failed", r"job.*failed"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Provider, *entry);
        }
    }

    fn init_local(&mut self) {
        let errors: &[Entry] = &[
            (ErrorType::LocalGitError, Medium, false, 0.0, 0,
                "Local Git operation error",
                &["git", "local", "command"],
                &[r"git.*error", r"local.*git"]),
            (ErrorType::LocalGitCommandError, Medium, false, 0.0, 0,
                "Local Git command error",
                &["git", "command", "failed"],
                &[r"git.*command", r"command.*failed"]),
            (ErrorType::LocalGitMergeError, Medium, false, 0.0, 0,
                "Local Git merge error",
                &["merge", "conflict", "local"],
                &[r"automatic merge failed", r"fix conflicts"]),
            (ErrorType::LocalGitPushError, Medium, true, 2.0, 3,
                "Local Git push error",
                &["push", "rejected", "remote"],
                &[r"failed to push", r"\[rejected\]"]),
            (ErrorType::LocalGitPullError, Medium, true, 2.0, 3,
                "Local Git pull error",
                &["pull", "fetch", "remote"],
                &[r"could not read from remote", r"pull.*failed"]),
            (ErrorType::LocalGitCheckoutError, Medium, false, 0.0, 0,
                "Local Git checkout error",
                &["checkout", "pathspec", "overwritten"],
                &[r"pathspec.*did not match", r"would be overwritten by checkout"]),
            (ErrorType::LocalGitBranchError, Medium, false, 0.0, 0,
                "Local Git branch error",
                &["branch", "already exists"],
                &[r"a branch named .* already exists", r"not a valid branch name"]),
            (ErrorType::LocalGitCommitError, Medium, false, 0.0, 0,
                "Local Git commit error",
                &["commit", "nothing to commit"],
                &[r"nothing to commit", r"commit.*failed"]),
            (ErrorType::LocalGitStashError, Low, false, 0.0, 0,
                "Local Git stash error",
                &["stash"],
                &[r"no stash entries", r"stash.*failed"]),
            (ErrorType::LocalGitRebaseError, Medium, false, 0.0, 0,
                "Local Git rebase error",
                &["rebase", "conflict"],
                &[r"could not apply", r"rebase.*in progress"]),
        ];

        for entry in errors {
            self.add_error(ErrorCategory::Local, *entry);
        }
    }

    fn init_unknown(&mut self) {
        self.add_error(
            ErrorCategory::Unknown,
            (ErrorType::UnknownError, Medium, false, 0.0, 0,
                "Unknown error type",
                &["unknown", "unexpected", "error"],
                &[r"unknown", r"unexpected", r"error"]),
        );
    }

    fn add_error(&mut self, category: ErrorCategory, entry: Entry) {
        let (
            error_type,
            severity,
            is_retryable,
            retry_delay,
            max_retries,
            description,
            keywords,
            patterns,
        ) = entry;

        self.metadata.insert(
            error_type,
            ErrorTypeMetadata {
                severity,
                category,
                is_retryable,
                retry_delay,
                max_retries,
                description: description.to_string(),
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
                patterns: patterns.iter().map(|s| s.to_string()).collect(),
            },
        );

        self.by_category.entry(category).or_default().insert(error_type);
        self.by_severity.entry(severity).or_default().insert(error_type);

        if is_retryable {
            self.retryable.insert(error_type);
        } else {
            self.non_retryable.insert(error_type);
        }
    }

    pub fn metadata(&self, error_type: ErrorType) -> Option<&ErrorTypeMetadata> {
        self.metadata.get(&error_type)
    }

    /// Lookup by the snake_case identifier, e.g. `"timeout_error"`.
    pub fn get_metadata(&self, error_type: &str) -> Option<&ErrorTypeMetadata> {
        let error_type: ErrorType = error_type.parse().ok()?;
        self.metadata(error_type)
    }

    pub fn get_errors_by_category(&self, category: ErrorCategory) -> HashSet<ErrorType> {
        self.by_category.get(&category).cloned().unwrap_or_default()
    }

    pub fn get_errors_by_severity(&self, severity: ErrorSeverity) -> HashSet<ErrorType> {
        self.by_severity.get(&severity).cloned().unwrap_or_default()
    }

    pub fn get_retryable_errors(&self) -> HashSet<ErrorType> {
        self.retryable.clone()
    }

    pub fn get_non_retryable_errors(&self) -> HashSet<ErrorType> {
        self.non_retryable.clone()
    }

    pub fn get_all_error_types(&self) -> HashSet<ErrorType> {
        self.metadata.keys().copied().collect()
    }

    pub fn get_error_categories(&self) -> Vec<ErrorCategory> {
        ErrorCategory::ALL.to_vec()
    }

    pub fn get_error_severities(&self) -> Vec<ErrorSeverity> {
        ErrorSeverity::ALL.to_vec()
    }

    pub fn is_retryable(&self, error_type: ErrorType) -> bool {
        self.retryable.contains(&error_type)
    }

    pub fn retry_delay(&self, error_type: ErrorType) -> f64 {
        self.metadata(error_type).map(|m| m.retry_delay).unwrap_or(0.0)
    }

    pub fn max_retries(&self, error_type: ErrorType) -> u32 {
        self.metadata(error_type).map(|m| m.max_retries).unwrap_or(0)
    }

    pub fn severity(&self, error_type: ErrorType) -> Option<ErrorSeverity> {
        self.metadata(error_type).map(|m| m.severity)
    }

    pub fn category(&self, error_type: ErrorType) -> Option<ErrorCategory> {
        self.metadata(error_type).map(|m| m.category)
    }
}

impl Default for ErrorTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
