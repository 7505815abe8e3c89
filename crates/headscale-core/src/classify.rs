//! Response classification.
//!
//! Each operation describes its expectations as a [`Policy`]: the status a
//! 200 maps to, an ordered list of [`Rule`]s consulted for HTTP 500 bodies, and
//! the status used when nothing matches. [`resolve`] applies a policy to a
//! transport result and produces an [`Outcome`].
//!
//! Server signals are read from a structured error body first
//! (`{"code": .., "message": .., "reason": "USER_NOT_FOUND"}`). Bodies without
//! a recognised `reason` fall back to matching the legacy English phrases the
//! server embeds in its error text.

use crate::outcome::{Outcome, Resource, Status};
use crate::transport::{RawResponse, Transport};
use crate::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// A condition the server reports in an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The API key was rejected
    Unauthorized,
    /// The referenced user does not exist
    UserNotFound,
    /// A user with the requested name already exists
    UserAlreadyExists,
}

impl Signal {
    /// Machine-readable code used by the structured error contract.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
        }
    }

    /// Phrase the server writes into plain error text.
    #[must_use]
    pub const fn legacy_phrase(self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::UserNotFound => "User not found",
            Self::UserAlreadyExists => "User already exists",
        }
    }

    /// Parse a structured error code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [Self::Unauthorized, Self::UserNotFound, Self::UserAlreadyExists]
            .into_iter()
            .find(|signal| signal.code().eq_ignore_ascii_case(code))
    }
}

#[derive(Debug, Default, Deserialize)]
struct StructuredErrorBody {
    #[serde(default)]
    reason: Option<String>,
}

/// Signals found in a single error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody<'a> {
    structured: Option<Signal>,
    text: &'a str,
}

impl<'a> ErrorBody<'a> {
    /// Inspect a raw error body.
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        let structured = serde_json::from_str::<StructuredErrorBody>(text)
            .ok()
            .and_then(|body| body.reason)
            .and_then(|reason| Signal::from_code(&reason));
        Self { structured, text }
    }

    /// Whether the body reports `signal`.
    ///
    /// A recognised structured code is authoritative; otherwise the legacy
    /// phrase is searched for in the body text.
    #[must_use]
    pub fn reports(&self, signal: Signal) -> bool {
        match self.structured {
            Some(reported) => reported == signal,
            None => self.text.contains(signal.legacy_phrase()),
        }
    }
}

/// Maps a detected signal to a status and optional error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Signal that triggers this rule
    pub signal: Signal,
    /// Status reported when the rule matches
    pub status: Status,
    /// Error attached when the rule matches
    pub error: Option<Error>,
}

impl Rule {
    /// Rule that reports `error` alongside `status`.
    #[must_use]
    pub const fn report(signal: Signal, status: Status, error: Error) -> Self {
        Self {
            signal,
            status,
            error: Some(error),
        }
    }

    /// Rule that resolves to `status` with no error.
    #[must_use]
    pub const fn resolve(signal: Signal, status: Status) -> Self {
        Self {
            signal,
            status,
            error: None,
        }
    }
}

/// Classification rules for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Status reported for HTTP 200
    pub success: Status,
    /// Rules for HTTP 500 bodies, in priority order
    pub rules: &'static [Rule],
    /// Status reported when no rule matches
    pub unmatched: Status,
}

/// What a policy made of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// HTTP 200: the body should be decoded
    Success(Status),
    /// A rule matched
    Matched {
        /// Status from the matching rule
        status: Status,
        /// Error from the matching rule
        error: Option<Error>,
    },
    /// Nothing matched
    Unmatched(Status),
}

impl Policy {
    /// Classify a drained response.
    #[must_use]
    pub fn classify(&self, response: &RawResponse) -> Classification {
        match response.status() {
            StatusCode::OK => Classification::Success(self.success),
            StatusCode::INTERNAL_SERVER_ERROR => {
                let body = ErrorBody::parse(response.body());
                self.rules
                    .iter()
                    .find(|rule| body.reports(rule.signal))
                    .map_or(Classification::Unmatched(self.unmatched), |rule| {
                        Classification::Matched {
                            status: rule.status,
                            error: rule.error.clone(),
                        }
                    })
            }
            _ => Classification::Unmatched(self.unmatched),
        }
    }
}

/// Turn a transport result into an [`Outcome`].
///
/// `decode` runs only for HTTP 200 and may return `None` for operations that
/// have no payload.
pub fn resolve<R, F>(policy: &Policy, result: Result<RawResponse>, decode: F) -> Outcome<R>
where
    R: Resource,
    F: FnOnce(&RawResponse) -> Result<Option<R::Payload>>,
{
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            debug!(kind = R::KIND, error = %err, "transport failure");
            return Outcome::failed(err);
        }
    };

    match policy.classify(&response) {
        Classification::Success(status) => match decode(&response) {
            Ok(Some(payload)) => Outcome::with_payload(status, payload),
            Ok(None) => Outcome::status_only(status),
            Err(err) => {
                debug!(kind = R::KIND, error = %err, "failed to decode success body");
                Outcome::failed(err)
            }
        },
        Classification::Matched {
            status,
            error: Some(error),
        } => {
            debug!(kind = R::KIND, %status, %error, "server reported a known error");
            Outcome::with_error(status, error)
        }
        Classification::Matched {
            status,
            error: None,
        } => {
            debug!(kind = R::KIND, %status, "server reported a known condition");
            Outcome::status_only(status)
        }
        Classification::Unmatched(status) => {
            warn!(
                kind = R::KIND,
                http_status = response.status().as_u16(),
                "unclassified response"
            );
            Outcome::with_error(status, response.into_unclassified())
        }
    }
}

/// A request against the HTTP primitive.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    /// GET `path`
    Get(&'a str),
    /// POST `path` with a JSON body
    Post(&'a str, &'a Value),
    /// DELETE `path`
    Delete(&'a str),
}

impl Request<'_> {
    /// Send the request through `transport`.
    ///
    /// # Errors
    ///
    /// Returns whatever the transport reports.
    pub async fn send(self, transport: &dyn Transport) -> Result<RawResponse> {
        match self {
            Self::Get(path) => transport.get(path).await,
            Self::Post(path, body) => transport.post(path, body).await,
            Self::Delete(path) => transport.delete(path).await,
        }
    }
}

/// Send `request` and classify the response with `policy`.
pub async fn execute<R, F>(
    transport: &dyn Transport,
    request: Request<'_>,
    policy: &Policy,
    decode: F,
) -> Outcome<R>
where
    R: Resource,
    F: FnOnce(&RawResponse) -> Result<Option<R::Payload>>,
{
    resolve(policy, request.send(transport).await, decode)
}
