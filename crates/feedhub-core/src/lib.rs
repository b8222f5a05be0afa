//! # feedhub-core
//!
//! Core crate for FeedHub. Contains configuration schemas and the unified
//! error system shared by the plugin host, the plugin SDK and the bundled
//! feature plugins.
//!
//! This crate has **no** internal dependencies on other FeedHub crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
