// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Declared invalidation for write paths.
//!
//! A write operation declares which cache entries it makes obsolete instead of clearing keys by
//! hand after the fact. [`Cache::mutate`] runs the write and applies the declared invalidations
//! only when it succeeds.

use crate::{Cache, Error, Result};

/// A set of entries made obsolete by a write.
///
/// # Examples
///
/// ```
/// use freshet::Invalidation;
///
/// let targets = [
///     Invalidation::key("student-details", "p1"),
///     Invalidation::prefix("student-list", "students_"),
///     Invalidation::namespace("dashboard-stats"),
/// ];
/// assert_eq!(targets[0].target_namespace(), "student-details");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Invalidation {
    namespace: String,
    scope: Scope,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Scope {
    Key(String),
    Prefix(String),
    All,
}

impl Invalidation {
    /// Invalidates a single key.
    pub fn key(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            scope: Scope::Key(key.into()),
        }
    }

    /// Invalidates every key starting with `prefix`.
    pub fn prefix(namespace: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            scope: Scope::Prefix(prefix.into()),
        }
    }

    /// Invalidates a whole namespace.
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            scope: Scope::All,
        }
    }

    /// Returns the namespace this invalidation targets.
    #[must_use]
    pub fn target_namespace(&self) -> &str {
        &self.namespace
    }
}

/// A write operation that knows which cache entries it invalidates.
///
/// # Examples
///
/// ```
/// use freshet::{Cache, Invalidation, Mutation, NamespaceConfig};
///
/// struct RenameStudent {
///     id: String,
///     name: String,
/// }
///
/// impl Mutation for RenameStudent {
///     type Output = ();
///     type Error = anyhow::Error;
///
///     fn invalidations(&self) -> Vec<Invalidation> {
///         vec![
///             Invalidation::key("student-details", self.id.clone()),
///             Invalidation::namespace("student-list"),
///         ]
///     }
///
///     async fn apply(self) -> anyhow::Result<()> {
///         // Write `self.name` to the database here.
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let cache = Cache::<String>::builder()
///     .namespace(NamespaceConfig::entity("student-details"))
///     .namespace(NamespaceConfig::volatile("student-list"))
///     .build()?;
/// cache.set("student-details", "p1", "Ada".into())?;
///
/// cache.mutate(RenameStudent { id: "p1".into(), name: "Grace".into() }).await?;
/// assert!(!cache.contains("student-details", "p1")?);
/// # Ok(())
/// # }
/// ```
pub trait Mutation: Send {
    /// Value produced by a successful write.
    type Output: Send;
    /// Error produced by a failed write.
    type Error: From<Error> + Send;

    /// Entries made obsolete once the write succeeds.
    fn invalidations(&self) -> Vec<Invalidation>;

    /// Performs the write.
    fn apply(self) -> impl Future<Output = std::result::Result<Self::Output, Self::Error>> + Send;
}

impl<V> Cache<V> {
    /// Runs `mutation` and, if it succeeds, applies its declared invalidations.
    ///
    /// The declared namespaces are checked before the write runs. A failed mutation leaves the
    /// cache untouched.
    ///
    /// # Errors
    ///
    /// Returns the mutation's error, or [`Error::UnknownNamespace`] converted into it when an
    /// invalidation names an unregistered namespace. In the latter case `apply` is never called.
    pub async fn mutate<M: Mutation>(&self, mutation: M) -> std::result::Result<M::Output, M::Error> {
        let invalidations = mutation.invalidations();
        self.check_invalidations(&invalidations)?;
        let output = mutation.apply().await?;
        self.apply_invalidations(&invalidations)?;
        Ok(output)
    }

    /// Checks that every invalidation targets a registered namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] for the first unregistered namespace.
    pub fn check_invalidations(&self, invalidations: &[Invalidation]) -> Result<()> {
        for invalidation in invalidations {
            self.inner.registry.resolve(&invalidation.namespace)?;
        }
        Ok(())
    }

    /// Applies invalidations for a write the caller performed itself.
    ///
    /// Every target namespace is checked before anything is removed. Returns the number of
    /// removed entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] for the first unregistered namespace.
    pub fn apply_invalidations(&self, invalidations: &[Invalidation]) -> Result<usize> {
        self.check_invalidations(invalidations)?;

        invalidations.iter().try_fold(0, |removed, invalidation| {
            let count = match &invalidation.scope {
                Scope::Key(key) => usize::from(self.invalidate(&invalidation.namespace, key)?),
                Scope::Prefix(prefix) => self.invalidate_prefix(&invalidation.namespace, prefix)?,
                Scope::All => self.invalidate_namespace(&invalidation.namespace)?,
            };
            Ok(removed + count)
        })
    }
}
