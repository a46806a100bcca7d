// ABOUTME: Library module for postgres-ext-manager
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod error;
pub mod postgres;
pub mod report;
pub mod utils;

pub use error::ExtensionError;
