//! # PawCare Core
//!
//! Configuration and the error type shared by every PawCare crate.

pub mod config;
pub mod error;

pub use config::PawcareConfig;
pub use error::{PawcareError, Result};
