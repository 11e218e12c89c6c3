//! Domain-specific error types for cloudstrap.
//!
//! This module defines `ProvisionError`, a `thiserror`-based enum that
//! provides typed error variants for the failure modes of the bootstrap
//! contract. Public API functions return `Result<T, ProvisionError>` for
//! programmatic error handling, while the cloud API trait boundary and the
//! CLI layer use `anyhow::Result`.
//!
//! `ProvisionError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at boundaries that return `anyhow::Result`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent messages for common IO error kinds (e.g.,
/// "I/O error: not found") instead of the OS-level messages. For
/// unrecognized kinds, falls back to the OS-level error message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for cloudstrap.
///
/// Bootstrap hooks return `InvalidConfig`, `ResourceSetup` or
/// `UnsupportedOperation`. The orchestrator wraps whatever a hook returns in
/// `Backend` so the backend name reaches the user, without changing the
/// underlying kind (see [`ProvisionError::root`]).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProvisionError {
    /// Required identity fields are missing or malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A prerequisite cloud resource could not be created or located.
    #[error("failed to set up {resource} for cluster {cluster}: {message}")]
    ResourceSetup {
        /// Kind of resource being ensured (e.g., "network").
        resource: String,
        /// Cluster the resource is tagged with.
        cluster: String,
        /// Description of the underlying API failure.
        message: String,
    },

    /// The backend cannot honor the requested capability.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No backend is registered under the requested name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// A profile could not be loaded, parsed or assembled.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred (usually a path).
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A backend's bootstrap hook failed.
    #[error("backend '{backend}' failed after {attempts} attempt(s): {source}")]
    Backend {
        /// Registered name of the backend.
        backend: String,
        /// Number of times the hook was invoked.
        attempts: u32,
        /// The error returned by the last invocation.
        #[source]
        source: Box<ProvisionError>,
    },

    /// A backend returned a configuration that breaks the bootstrap contract.
    #[error("backend '{backend}' violated the bootstrap contract: {message}")]
    ContractViolation {
        /// Registered name of the backend.
        backend: String,
        /// Which invariant was broken.
        message: String,
    },
}

impl ProvisionError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }

    /// Creates a `ResourceSetup` variant from an API error.
    ///
    /// The full `anyhow` chain is flattened into the message.
    pub(crate) fn resource_setup(
        resource: impl ToString,
        cluster: impl Into<String>,
        err: &anyhow::Error,
    ) -> Self {
        Self::ResourceSetup {
            resource: resource.to_string(),
            cluster: cluster.into(),
            message: format!("{:#}", err),
        }
    }

    /// Returns the innermost error, unwrapping any `Backend` layers.
    pub fn root(&self) -> &ProvisionError {
        match self {
            Self::Backend { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the orchestrator may retry the failed call.
    ///
    /// Only resource setup failures are transient; configuration and
    /// capability errors are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), Self::ResourceSetup { .. })
    }
}
