//! Track what you spend your time on from the terminal. Start an activity by
//! naming it, stop it by running the tool with no arguments, and ask
//! questions about your history in plain language. Categorization and query
//! translation are delegated to a local text-generation service.
//!

pub mod cli;
pub mod config;
pub mod error;
pub mod oracle;
pub mod tracker;
pub mod utils;
