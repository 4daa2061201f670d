//! Typed configuration loaded from JSON files

pub mod database;
pub mod mapping;
