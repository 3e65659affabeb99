//! Command implementations for the `scrapedev` binary.

pub mod cli;
pub mod logging;
