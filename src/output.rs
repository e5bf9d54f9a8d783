//! Run outputs for the calling workflow.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::Result;

const DELIMITER: &str = "EOF_TICKETFLOW";

/// Append `name=value` to a GitHub Actions output file.
///
/// Uses the heredoc form so multi-line values survive.
pub fn write_github_output(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "{name}<<{DELIMITER}\n{value}\n{DELIMITER}\n")?;
    Ok(())
}
