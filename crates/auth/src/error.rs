use thiserror::Error;

/// Faults that can occur while evaluating an authorization question.
///
/// None of these reach business logic: the service and the gate convert each
/// of them into a denial plus a log entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No resolvable user identifier on the request.
    #[error("missing identity")]
    MissingIdentity,

    /// An identifier was present but could not be parsed.
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    /// The grant store could not be reached or did not answer in time.
    #[error("grant store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other fault.
    #[error("unexpected authorization fault: {0}")]
    Unexpected(String),
}
