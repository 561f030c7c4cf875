//! Error types for relation-aware composition

use thiserror::Error;

/// Errors raised while declaring entities or composing a query.
///
/// All of them describe mistakes in how a query was put together; none are
/// transient, and nothing in this crate retries or recovers from them.
#[derive(Error, Debug)]
pub enum Error {
    /// No relation from `entity` to `target` was declared
    #[error("{target} is not associated with {entity}")]
    UnassociatedRelation { entity: String, target: String },

    /// A join argument does not fit the position it was passed in
    #[error("Ambiguous join arguments at position {position}: {reason}")]
    AmbiguousJoinArguments { position: usize, reason: String },

    /// A join named its target entity and nothing else
    #[error("join on {target} needs an alias, columns or a condition")]
    MissingTarget { target: String },

    /// A virtual attribute produced an unusable projection
    #[error(
        "virtual attribute '{attribute}' on {entity} must yield a source expression \
         and an output name"
    )]
    InvalidVirtualAttribute { entity: String, attribute: String },

    /// An entity was registered without a table name
    #[error("entity must specify a table name")]
    MissingTableName,

    /// An entity name was looked up but never registered
    #[error("entity '{name}' is not registered")]
    UnknownEntity { name: String },

    /// Error from the statement builder
    #[error(transparent)]
    Builder(#[from] kinship_core::Error),
}

/// Convenience Result type for kinship operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unassociated(entity: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnassociatedRelation {
            entity: entity.into(),
            target: target.into(),
        }
    }

    pub fn ambiguous(position: usize, reason: impl Into<String>) -> Self {
        Self::AmbiguousJoinArguments {
            position,
            reason: reason.into(),
        }
    }

    pub fn unknown_entity(name: impl Into<String>) -> Self {
        Self::UnknownEntity { name: name.into() }
    }
}
