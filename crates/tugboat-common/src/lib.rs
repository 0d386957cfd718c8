//! # tugboat-common
//!
//! Shared types for the tugboat workspace:
//! - The error taxonomy every lifecycle step reports through
//! - The validated container handle returned by the runtime

#![warn(missing_docs)]

pub mod error;
pub mod id;

pub use error::{TugboatError, TugboatResult};
pub use id::ContainerHandle;
