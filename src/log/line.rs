use crate::model::{ProcessId, ProcessSeries};
use crate::Result;
use regex::Regex;

/// One recognized line of an event-stream trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLine {
    /// `Tick Number: N`
    Marker(usize),
    /// ` Process Name: <name>, Process ID: <pid>, <field ending in ticks>`
    Observation {
        name: String,
        pid: ProcessId,
        ticks: u64,
    },
}

const MARKER_PREFIX: &str = "Tick Number: ";

/// Line grammar of the event-stream encoding.
pub struct EventGrammar {
    observation: Regex,
}

impl EventGrammar {
    pub fn new() -> Result<Self> {
        // Capture:
        // 1) display name (may contain ", " as long as "Process ID:" follows)
        // 2) pid
        // 3) trailing integer of the third field
        // Extra fields after the third are tolerated.
        let observation = Regex::new(
            r#"^ Process Name: (.*?), Process ID: (\d+), [^,]*?(\d+)\s*(?:,.*)?$"#,
        )?;
        Ok(Self { observation })
    }

    /// Classify a line; `None` means log noise.
    pub fn classify(&self, line: &str) -> Option<EventLine> {
        let line = line.trim_end();

        if let Some(rest) = line.strip_prefix(MARKER_PREFIX) {
            return rest.trim().parse().ok().map(EventLine::Marker);
        }

        let caps = self.observation.captures(line)?;
        let pid = caps[2].parse().ok().filter(|&p: &ProcessId| p > 0)?;
        let ticks = caps[3].parse().ok()?;
        Some(EventLine::Observation {
            name: caps[1].to_string(),
            pid,
            ticks,
        })
    }
}

/// Parse a dense-row line (`0 ` followed by whitespace-separated counts).
///
/// Rows with any non-integer token do not qualify.
pub fn parse_row(line: &str) -> Option<ProcessSeries> {
    if !line.starts_with("0 ") {
        return None;
    }
    line.split_whitespace().map(|tok| tok.parse().ok()).collect()
}
