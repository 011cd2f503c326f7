//! Core types: configuration, errors, and shared data models.

pub mod config;
pub mod error;
pub mod models;
