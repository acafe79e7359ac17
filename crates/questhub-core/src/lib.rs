//! # questhub-core
//!
//! Core crate for the QuestHub achievement batch. Contains the unified
//! error system, configuration schemas, typed identifiers, paging types,
//! and the outbound push trait.
//!
//! This crate has **no** internal dependencies on other QuestHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
