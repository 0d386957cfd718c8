//! # tugboat-image
//!
//! Image-side inputs of a tugboat run.
//!
//! This crate provides:
//! - The registry credential and its `X-Registry-Auth` encoding
//! - Image reference parsing for pull requests

#![warn(missing_docs)]

pub mod credentials;
pub mod reference;

pub use credentials::{RegistryAuth, RegistryCredential};
pub use reference::{ImageReference, ImageTag};
