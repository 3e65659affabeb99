//! Human vs machine-readable output.

use anyhow::Result;
use serde::Serialize;

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Output {
    /// Emit a single JSON document instead of text.
    pub json: bool,
    /// Suppress non-essential text.
    pub quiet: bool,
}

impl Output {
    /// Print progress text unless quiet or in JSON mode.
    pub fn status(&self, text: impl AsRef<str>) {
        if !self.json && !self.quiet {
            println!("{}", text.as_ref());
        }
    }

    /// Print a command's result text unless in JSON mode.
    pub fn text(&self, text: impl AsRef<str>) {
        if !self.json {
            print!("{}", text.as_ref());
        }
    }

    /// Print a value as pretty JSON when in JSON mode.
    pub fn json(&self, value: &impl Serialize) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }
}

/// Print an error the way the binary reports failures.
pub fn print_error(output: Output, err: &anyhow::Error) {
    if output.json {
        println!(
            "{}",
            serde_json::json!({
                "error": true,
                "message": format!("{err:#}"),
            })
        );
    } else if !output.quiet {
        eprintln!("  Error: {err:#}");
    }
}
