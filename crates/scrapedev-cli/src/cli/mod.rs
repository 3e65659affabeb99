//! CLI subcommand implementations for the scrapedev binary.

pub mod collect_cmd;
pub mod doctor;
pub mod output;
pub mod report_cmd;
