//! # questhub-entity
//!
//! Domain entity models for the QuestHub achievement batch. Every struct in
//! this crate represents a database table row or a domain value object. All
//! entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod achievement;
pub mod metric;
pub mod notification;
