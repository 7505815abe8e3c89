//! Headscale models shared by the user and pre-auth key handlers.

use chrono::{DateTime, Utc};
use headscale_core::timestamp;
use headscale_core::Resource;
use serde::{Deserialize, Serialize};

/// Marker for user operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User;

impl Resource for User {
    const KIND: &'static str = "user";
    type Payload = UserConfig;
}

/// Marker for pre-auth key operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreAuthKey;

impl Resource for PreAuthKey {
    const KIND: &'static str = "preauthkey";
    type Payload = PreAuthKeyResponse;
}

/// A Headscale user as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    /// Numeric user id (sent by the server as a decimal string).
    #[serde(with = "string_id")]
    pub id: u32,
    /// User name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// `{"user": {...}}` envelope used by get and create.
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub(crate) user: UserConfig,
}

/// Listing bodies come either wrapped in `{"users": [...]}` or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserList {
    Wrapped {
        #[serde(default)]
        users: Vec<UserConfig>,
    },
    Bare(Vec<UserConfig>),
}

impl UserList {
    pub(crate) fn into_users(self) -> Vec<UserConfig> {
        match self {
            Self::Wrapped { users } | Self::Bare(users) => users,
        }
    }
}

/// Request body for `POST /user`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// Name of the user to create.
    pub name: String,
}

/// Parameters for a new pre-auth key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreAuthKeyConfig {
    /// Owning user name.
    pub user: String,
    /// Whether the key can register more than one node.
    pub reusable: bool,
    /// Whether nodes registered with the key are ephemeral.
    pub ephemeral: bool,
    /// Expiry; omitted from the request when unset.
    pub expiration: Option<DateTime<Utc>>,
    /// ACL tags, normalized to `tag:<lowercase>` on the wire.
    pub tags: Vec<String>,
}

impl PreAuthKeyConfig {
    /// Key for `user` with every option off.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    /// Mark the key reusable.
    #[must_use]
    pub const fn with_reusable(mut self, reusable: bool) -> Self {
        self.reusable = reusable;
        self
    }

    /// Mark registered nodes ephemeral.
    #[must_use]
    pub const fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Set the expiry.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the ACL tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Wire form of a pre-auth key request. Every field appears at most once.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreatePreAuthKeyRequest {
    /// Owning user name.
    pub user: String,
    /// Whether the key is reusable.
    pub reusable: bool,
    /// Whether nodes are ephemeral.
    pub ephemeral: bool,
    /// Expiry in protobuf timestamp form.
    #[serde(
        serialize_with = "timestamp::serialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<DateTime<Utc>>,
    /// Normalized ACL tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_tags: Option<Vec<String>>,
}

impl CreatePreAuthKeyRequest {
    /// Build the wire request from a config.
    #[must_use]
    pub fn from_config(config: &PreAuthKeyConfig) -> Self {
        Self {
            user: config.user.clone(),
            reusable: config.reusable,
            ephemeral: config.ephemeral,
            expiration: include_expiration_if_set(config.expiration),
            acl_tags: include_tags_if_non_empty(&config.tags),
        }
    }
}

impl From<&PreAuthKeyConfig> for CreatePreAuthKeyRequest {
    fn from(config: &PreAuthKeyConfig) -> Self {
        Self::from_config(config)
    }
}

/// The Unix epoch counts as unset, matching a zero protobuf timestamp.
fn include_expiration_if_set(expiration: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    expiration.filter(|at| at.timestamp() != 0 || at.timestamp_subsec_nanos() != 0)
}

fn include_tags_if_non_empty(tags: &[String]) -> Option<Vec<String>> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.iter().map(|tag| normalize_tag(tag)).collect())
    }
}

/// Lower-case a tag and add the `tag:` prefix.
#[must_use]
pub fn normalize_tag(tag: &str) -> String {
    format!("tag:{}", tag.to_lowercase())
}

/// A pre-auth key as stored by the server at creation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreAuthKeyResponse {
    /// Owning user name.
    #[serde(default)]
    pub user: String,
    /// Key id.
    #[serde(default)]
    pub id: String,
    /// The key itself.
    #[serde(default)]
    pub key: String,
    /// Whether the key is reusable.
    #[serde(default)]
    pub reusable: bool,
    /// Whether nodes are ephemeral.
    #[serde(default)]
    pub ephemeral: bool,
    /// Whether the key has been used.
    #[serde(default)]
    pub used: bool,
    /// Expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// ACL tags attached to the key.
    #[serde(default)]
    pub acl_tags: Vec<String>,
}

/// `{"preAuthKey": {...}}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct PreAuthKeyEnvelope {
    #[serde(rename = "preAuthKey")]
    pub(crate) pre_auth_key: PreAuthKeyResponse,
}

/// Ids travel as decimal strings; numbers are accepted too.
mod string_id {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(id: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = u32;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a user id as a string or integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<u32, E> {
                u32::try_from(value).map_err(|_| E::custom(format!("user id {value} out of range")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<u32, E> {
                u32::try_from(value).map_err(|_| E::custom(format!("user id {value} out of range")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<u32, E> {
                value
                    .parse()
                    .map_err(|_| E::custom(format!("invalid user id `{value}`")))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}
