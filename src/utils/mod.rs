//! Small shared helpers.

pub mod domain;
