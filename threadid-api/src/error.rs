/// A result with the [`Error`] error.
pub type Result<T> = core::result::Result<T, Error>;

/// An error that may happen while querying thread identity.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The platform does not provide a thread identity primitive.
    #[error("thread identity is not supported on this platform")]
    Unsupported,
    /// The platform primitive returned a value that is not a valid thread id.
    #[error("the platform returned an invalid thread id")]
    InvalidId,
}
