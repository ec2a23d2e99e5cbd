//! Foundation types for the tactor dispatch layer.
//!
//! This crate holds the pieces every other tactor crate shares: the error
//! type, the static catalog that turns driver error codes into text, and the
//! TOML configuration.

pub mod catalog;
pub mod config;
pub mod error;
