//! HTTP handlers.

pub mod health;
pub mod jobs;
pub mod swap;

pub use health::health;
