//! Shared types for the subscription service

pub mod types;

pub use types::*;
