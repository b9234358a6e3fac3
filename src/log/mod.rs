//! Trace log reading and parsing for the two scheduler log encodings.

pub mod line;
pub mod parse;
pub mod read;

pub use parse::{TraceFormat, detect_format, parse};
pub use read::read_lines;

use crate::Result;
use crate::model::{ProcessId, Trace};
use anyhow::bail;
use std::path::Path;

/// Read and parse one log into a raw (unaligned) trace.
///
/// With `format == None` the encoding is detected from the content.
pub fn load_trace(
    path: &Path,
    format: Option<TraceFormat>,
    universe: &[ProcessId],
) -> Result<Trace> {
    let lines = read_lines(path)?;

    let format = match format {
        Some(f) => f,
        None => match detect_format(&lines)? {
            Some(f) => f,
            None => bail!(
                "cannot detect trace format of {}: no tick markers, observations or rows",
                path.display()
            ),
        },
    };
    tracing::debug!(path = %path.display(), lines = lines.len(), %format, "parsing trace");

    parse(format, &lines, universe)
}
