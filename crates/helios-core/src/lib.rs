//! helios-core - Core types and traits for the Helios assistant
//!
//! This crate provides the domain types, search-request body types, service
//! traits, configuration and error handling shared by the other Helios crates.

pub mod config;
pub mod error;
pub mod request;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{HeliosError, Result};
pub use request::*;
pub use traits::*;
pub use types::*;
