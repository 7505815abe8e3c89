//! # headscale-core
//!
//! Core types and utilities for talking to a Headscale control plane.
//!
//! This crate provides the shared error type, client configuration, the HTTP
//! primitive every resource handler sits on, and the status model used to
//! classify server responses.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and conversions
//! - [`config`] - Configuration structures for Headscale clients
//! - [`transport`] - The `get`/`post`/`delete` HTTP primitive
//! - [`outcome`] - Shared status enum and the per-resource `Outcome`
//! - [`classify`] - Response classification rules and server signal detection
//! - [`timestamp`] - Protobuf-compatible timestamp formatting

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod error;
pub mod outcome;
pub mod timestamp;
pub mod transport;

// Re-export commonly used types
pub use error::{Error, Result};
pub use outcome::{Outcome, Resource, Status};
pub use transport::{HttpTransport, RawResponse, Transport};
