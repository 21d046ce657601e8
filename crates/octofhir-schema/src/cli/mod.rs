//! CLI functionality for the schema tool
//!
//! This module contains all CLI-related functionality including:
//! - Type document checking
//! - Value validation through generated codecs
//! - Filter parsing
//! - REPL
//! - Output formatting

pub mod check;
pub mod filter;
pub mod loader;
pub mod output;
pub mod repl;
pub mod validate;
