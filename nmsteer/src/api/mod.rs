//! Public API module.
//!
//! This module contains the user-facing API of the `nmsteer` crate.

pub mod builders;
pub mod config;
pub mod manager;
pub mod models;
