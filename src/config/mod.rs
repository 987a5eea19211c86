//! # Configuration Module
//!
//! This module provides the configuration structure for a compression run.

#[allow(clippy::module_inception)]
pub mod config;

pub use config::CompressConfig;
