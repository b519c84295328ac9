use thiserror::Error;

/// errors raised by mutating a [`crate::Resolver`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterError {
    /// a non-skippable hook was added that exactly matches an existing
    /// non-skippable hook. skippable hooks may duplicate freely, since
    /// they form a chain-of-responsibility at the same match point.
    #[error("a non-skippable hook already exists at this match point")]
    DuplicateHook,
}

/// this crate's result type
pub type Result<T> = std::result::Result<T, RouterError>;
