//! Common types and utilities for the Instagram sales assistant

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, LogFormat};
pub use error::{Error, Result};
