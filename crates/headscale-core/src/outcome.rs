//! Shared status model for resource operations.
//!
//! Every handler returns an [`Outcome`] parameterized by a [`Resource`] marker
//! type. The [`Status`] is the semantic result and the single source of truth;
//! the payload is only present when the status says the server produced one.

use crate::Error;
use std::fmt;

/// Semantic result of a resource operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The resource was created by this call
    Created,
    /// The resource already existed
    Exists,
    /// The resource was deleted by this call
    Deleted,
    /// The outcome could not be determined
    Unknown,
    /// The operation failed; always paired with an error
    Error,
}

impl Status {
    /// Returns the status as a lowercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Exists => "exists",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource kind handled by the client.
pub trait Resource {
    /// Name used in logs.
    const KIND: &'static str;

    /// Decoded success payload.
    type Payload;
}

/// Result of a single resource operation.
pub struct Outcome<R: Resource> {
    status: Status,
    payload: Option<R::Payload>,
    error: Option<Error>,
}

impl<R: Resource> Outcome<R> {
    /// Outcome carrying a decoded payload.
    #[must_use]
    pub fn with_payload(status: Status, payload: R::Payload) -> Self {
        debug_assert!(status != Status::Error, "error outcomes carry an error");
        Self {
            status,
            payload: Some(payload),
            error: None,
        }
    }

    /// Outcome with neither payload nor error.
    #[must_use]
    pub fn status_only(status: Status) -> Self {
        debug_assert!(status != Status::Error, "error outcomes carry an error");
        Self {
            status,
            payload: None,
            error: None,
        }
    }

    /// Outcome describing a failure or an unresolved condition.
    #[must_use]
    pub fn with_error(status: Status, error: Error) -> Self {
        Self {
            status,
            payload: None,
            error: Some(error),
        }
    }

    /// Outcome for a failure that happened before any classification.
    #[must_use]
    pub fn failed(error: Error) -> Self {
        Self::with_error(Status::Error, error)
    }

    /// Resource kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        R::KIND
    }

    /// Semantic status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Decoded payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&R::Payload> {
        self.payload.as_ref()
    }

    /// Error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Take the payload.
    #[must_use]
    pub fn into_payload(self) -> Option<R::Payload> {
        self.payload
    }

    /// Split into status, payload and error.
    #[must_use]
    pub fn into_parts(self) -> (Status, Option<R::Payload>, Option<Error>) {
        (self.status, self.payload, self.error)
    }

    /// Convert into a `Result`, failing whenever an error is attached.
    ///
    /// # Errors
    ///
    /// Returns the attached error regardless of the status it came with.
    pub fn into_result(self) -> Result<(Status, Option<R::Payload>), Error> {
        match self.error {
            Some(error) => Err(error),
            None => Ok((self.status, self.payload)),
        }
    }

    /// True when the status is a confirmed positive result.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && matches!(
                self.status,
                Status::Created | Status::Exists | Status::Deleted
            )
    }

    /// False when the server response matched no classification rule and the
    /// status must be treated as unresolved.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        !matches!(self.error, Some(Error::Unclassified { .. }))
    }
}

impl<R> fmt::Debug for Outcome<R>
where
    R: Resource,
    R::Payload: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("kind", &R::KIND)
            .field("status", &self.status)
            .field("payload", &self.payload)
            .field("error", &self.error)
            .finish()
    }
}

impl<R> Clone for Outcome<R>
where
    R: Resource,
    R::Payload: Clone,
{
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            payload: self.payload.clone(),
            error: self.error.clone(),
        }
    }
}

impl<R> PartialEq for Outcome<R>
where
    R: Resource,
    R::Payload: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.payload == other.payload && self.error == other.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl Resource for Widget {
        const KIND: &'static str = "widget";
        type Payload = String;
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Created.to_string(), "created");
        assert_eq!(Status::Error.to_string(), "error");
    }

    #[test]
    fn payload_outcome_is_success() {
        let outcome = Outcome::<Widget>::with_payload(Status::Created, "w1".to_string());
        assert_eq!(outcome.kind(), "widget");
        assert!(outcome.is_success());
        assert!(outcome.is_confirmed());
        assert_eq!(outcome.payload().map(String::as_str), Some("w1"));
    }

    #[test]
    fn failed_outcome_has_error_status() {
        let outcome = Outcome::<Widget>::failed(Error::Unauthorized);
        let (status, payload, error) = outcome.into_parts();
        assert_eq!(status, Status::Error);
        assert!(payload.is_none());
        assert_eq!(error, Some(Error::Unauthorized));
    }

    #[test]
    fn unclassified_outcome_is_not_confirmed() {
        let outcome = Outcome::<Widget>::with_error(
            Status::Unknown,
            Error::Unclassified {
                status: 503,
                body: "maintenance".to_string(),
            },
        );
        assert!(!outcome.is_confirmed());
        assert!(!outcome.is_success());
    }

    #[test]
    fn into_result_surfaces_attached_error() {
        let outcome = Outcome::<Widget>::with_error(Status::Unknown, Error::UserNotFound);
        assert_eq!(outcome.into_result().unwrap_err(), Error::UserNotFound);

        let outcome = Outcome::<Widget>::status_only(Status::Exists);
        let (status, payload) = outcome.into_result().unwrap();
        assert_eq!(status, Status::Exists);
        assert!(payload.is_none());
    }
}
