// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache configuration and namespace resolution.

use thiserror::Error;

/// Errors raised by the cache itself.
///
/// The cache has no failure modes of its own during normal request handling: loader errors
/// travel to the caller unchanged, and these variants only signal programmer errors in how
/// namespaces are registered or addressed.
///
/// Caller error types opt in with a `From<freshet::Error>` conversion so that
/// [`Cache::get`](crate::Cache::get) can return the loader's own error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The namespace was never registered.
    #[error("unknown cache namespace '{0}'")]
    UnknownNamespace(String),

    /// A namespace with the same name is already registered.
    #[error("cache namespace '{0}' is already registered")]
    DuplicateNamespace(String),

    /// The namespace configuration violates a basic constraint.
    #[error("invalid configuration for cache namespace '{name}': {reason}")]
    InvalidConfig {
        /// Name of the offending namespace.
        name: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_namespace() {
        assert_eq!(
            Error::UnknownNamespace("students".into()).to_string(),
            "unknown cache namespace 'students'"
        );
        assert_eq!(
            Error::DuplicateNamespace("students".into()).to_string(),
            "cache namespace 'students' is already registered"
        );
    }

    #[test]
    fn invalid_config_display_includes_reason() {
        let error = Error::InvalidConfig {
            name: "faculties".into(),
            reason: "ttl must be greater than zero",
        };
        let display = error.to_string();
        assert!(display.contains("faculties"), "got: {display}");
        assert!(display.contains("ttl must be greater than zero"), "got: {display}");
    }
}
