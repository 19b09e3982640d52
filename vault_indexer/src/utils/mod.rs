//! Utility and helper functions needed for:
//! - Error handling
//! - Entity id derivation and type casting
//! - Share/asset conversions

pub mod common;
pub mod conversion;
pub mod error;
