//! Client for the device-management service's package repository.
//!
//! Speaks the service's REST dialect: basic-auth token acquisition,
//! bearer-authenticated catalog listing, per-package download-URL
//! resolution and streamed downloads of the pre-signed URLs.

mod client;
mod types;

pub use client::{Client, Error};
pub use types::{AuthToken, Package};
