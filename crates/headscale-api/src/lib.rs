//! Headscale client and data models.
//!
//! Provides typed structures and an asynchronous client for the user and
//! pre-auth key endpoints of a Headscale control plane. Every mutating call
//! returns an [`Outcome`](headscale_core::Outcome) whose status is classified
//! from the server response.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod preauthkeys;
pub mod users;

pub use client::{HeadscaleClient, HeadscaleClientBuilder};
pub use headscale_core::{Error, Outcome, Status};
pub use models::{
    CreatePreAuthKeyRequest, PreAuthKey, PreAuthKeyConfig, PreAuthKeyResponse, User, UserConfig,
};

/// Outcome of a user operation.
pub type UserOutcome = Outcome<User>;

/// Outcome of a pre-auth key operation.
pub type PreAuthKeyOutcome = Outcome<PreAuthKey>;

/// Convenient result alias that reuses the shared Headscale error type.
pub type Result<T> = headscale_core::Result<T>;
