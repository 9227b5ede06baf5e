//! Shared UI building blocks.

pub mod error;

pub use error::ErrorScreen;
