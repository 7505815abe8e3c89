//! Timestamps in the form the Headscale gateway expects.
//!
//! The gateway decodes `google.protobuf.Timestamp` from RFC 3339 text in UTC
//! with a `Z` suffix and 0, 3, 6 or 9 fractional digits.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Format a timestamp for the wire.
#[must_use]
pub fn to_protobuf_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde helper for optional timestamps. Pair with
/// `skip_serializing_if = "Option::is_none"`.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_opt<S>(timestamp: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timestamp {
        Some(timestamp) => serializer.serialize_str(&to_protobuf_timestamp(timestamp)),
        None => serializer.serialize_none(),
    }
}
