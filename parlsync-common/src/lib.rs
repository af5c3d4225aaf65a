//! # parlsync common library
//!
//! Shared code for the parlsync services:
//! - Error and result types
//! - Configuration loading and path resolution
//! - Database pool initialization

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
