use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a trace log into its lines, empty lines included, in file order.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file =
        File::open(path).with_context(|| format!("open trace log {}", path.display()))?;

    BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("read trace log {}", path.display()))
}
