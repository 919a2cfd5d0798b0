//! Local log artifact consumed by error paths.

use std::{fs::OpenOptions, io::Write};

use log::warn;

/// Fixed path of the line-oriented session log. Appended to, never
/// truncated
pub const JOURNAL_PATH: &str = "/tmp/groundwork-client.log";

/// Append one line to the artifact. Failing to write is itself only logged
pub fn append(line: &str) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(JOURNAL_PATH)
        .and_then(|mut file| writeln!(file, "{line}"));

    if let Err(e) = result {
        warn!("Failed to append to {JOURNAL_PATH}: {e}");
    }
}
