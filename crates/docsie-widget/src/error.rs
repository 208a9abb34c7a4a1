//! Error types for widget bootstrapping

/// Errors surfaced to callers of the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("deployment id is required")]
    MissingDeploymentId,

    #[error("Failed to load Docsie script: {0}")]
    LoadFailed(String),

    #[error("widget session was superseded before the script finished loading")]
    Superseded,

    #[error("Docsie configuration is unavailable")]
    ConfigUnavailable,

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Errors reported by a [`crate::Host`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("document has no {0} element")]
    MissingElement(&'static str),

    #[error("widget cleanup hook failed: {0}")]
    CleanupHook(String),

    #[error("navigation failed: {0}")]
    Navigation(String),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
