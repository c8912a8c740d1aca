//! Shared types, errors, configuration and store interfaces for Herald.

pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod pg;
pub mod repository;
pub mod types;
