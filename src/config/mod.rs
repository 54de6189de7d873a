// src/config/mod.rs
//! Configuration module for the remote runner.
//!
//! This module manages runtime settings, constants, and default configurations.

pub mod constants;
pub mod defaults;
pub mod settings;
