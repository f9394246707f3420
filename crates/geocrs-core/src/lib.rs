//! GeoCRS Core - CRS codes, data model, and configuration
//!
//! This crate contains the immutable coordinate reference system model shared by
//! every other geocrs crate, the permissive CRS code parser, and the layered
//! configuration.

pub mod code;
pub mod config;
pub mod error;
pub mod models;

pub use code::CrsCode;
pub use error::{CrsError, Result};
