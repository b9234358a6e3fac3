use crate::Result;
use crate::log::line::{EventGrammar, EventLine, parse_row};
use crate::model::{ProcessId, Trace, carry_forward};
use anyhow::{Context, bail};
use serde::Deserialize;

/// Largest forward jump a single tick marker may make. Reference runs
/// advance one tick per marker; anything this large is a corrupt log.
pub const MAX_TICK_JUMP: usize = 1 << 20;

/// Line encoding of a trace log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// `Tick Number:` markers interleaved with per-process observation lines.
    Event,
    /// One full row of cumulative counts per process.
    Dense,
}

impl std::fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceFormat::Event => f.write_str("event"),
            TraceFormat::Dense => f.write_str("dense"),
        }
    }
}

/// Parse lines with the given encoding.
pub fn parse<S: AsRef<str>>(
    format: TraceFormat,
    lines: &[S],
    universe: &[ProcessId],
) -> Result<Trace> {
    match format {
        TraceFormat::Event => parse_event_stream(lines, universe),
        TraceFormat::Dense => Ok(parse_dense_rows(lines, universe)),
    }
}

/// Guess the encoding: any marker or observation line means event-stream,
/// otherwise any qualifying row means dense-row.
pub fn detect_format<S: AsRef<str>>(lines: &[S]) -> Result<Option<TraceFormat>> {
    let grammar = EventGrammar::new()?;
    let mut has_rows = false;

    for line in lines {
        let line = line.as_ref();
        if grammar.classify(line).is_some() {
            return Ok(Some(TraceFormat::Event));
        }
        has_rows |= parse_row(line).is_some();
    }

    Ok(has_rows.then_some(TraceFormat::Dense))
}

/// Parse an event-stream trace.
///
/// Every id in `universe` starts as `[0]`. A marker `Tick Number: N` carries
/// every tracked series forward to length N, so a process without an
/// observation since the previous marker keeps its value. An observation
/// appends its count; unseen ids are created at 0 and carried up to the
/// current tick first. Unrecognized lines are ignored.
///
/// A marker more than [`MAX_TICK_JUMP`] ticks past the current one is an
/// error rather than a fill of that many positions.
pub fn parse_event_stream<S: AsRef<str>>(lines: &[S], universe: &[ProcessId]) -> Result<Trace> {
    let grammar = EventGrammar::new()?;
    let mut trace = Trace::seeded(universe);
    let mut current = 0usize;

    for (lineno, line) in lines.iter().enumerate() {
        match grammar.classify(line.as_ref()) {
            Some(EventLine::Marker(tick)) => {
                if tick.saturating_sub(current) > MAX_TICK_JUMP {
                    bail!(
                        "tick marker at line {} jumps from {} to {} (limit {})",
                        lineno + 1,
                        current,
                        tick,
                        MAX_TICK_JUMP
                    );
                }
                current = current.max(tick);
                for series in trace.series.values_mut() {
                    carry_forward(series, tick);
                }
                trace.ticks = current
                    .checked_add(1)
                    .with_context(|| format!("tick marker at line {} overflows", lineno + 1))?;
            }
            Some(EventLine::Observation { name, pid, ticks }) => {
                let series = trace.series.entry(pid).or_insert_with(|| vec![0]);
                carry_forward(series, current);
                series.push(ticks);
                trace.names.insert(pid, name);
            }
            None => {}
        }
    }

    Ok(trace)
}

/// Parse a dense-row trace.
///
/// The k-th qualifying row becomes ProcessId k (1-based). Rows carry no id,
/// so reordered rows silently change identity. Ids in `universe` without a
/// row keep their `[0]` seed.
pub fn parse_dense_rows<S: AsRef<str>>(lines: &[S], universe: &[ProcessId]) -> Trace {
    let mut trace = Trace::seeded(universe);

    let rows = lines.iter().filter_map(|line| parse_row(line.as_ref()));
    for (pid, row) in (1..).zip(rows) {
        trace.series.insert(pid, row);
    }

    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_UNIVERSE, align};
    use pretty_assertions::assert_eq;

    #[test]
    fn event_stream_fills_to_last_marker() {
        let lines = [
            "Tick Number: 1",
            " Process Name: A, Process ID: 1, Ticks: 5",
            "Tick Number: 2",
        ];
        let trace = align(parse_event_stream(&lines, &[1, 2]).unwrap()).unwrap();

        assert_eq!(trace.series[&1], vec![0, 5, 5]);
        assert_eq!(trace.series[&2], vec![0, 0, 0]);
        assert_eq!(trace.names[&1], "A");
    }

    #[test]
    fn event_stream_carries_value_across_silent_tick() {
        let lines = [
            "Tick Number: 1",
            " Process Name: a, Process ID: 4, Ticks: 1",
            " Process Name: b, Process ID: 5, Ticks: 1",
            "Tick Number: 2",
            " Process Name: b, Process ID: 5, Ticks: 2",
            "Tick Number: 3",
            " Process Name: a, Process ID: 4, Ticks: 2",
            " Process Name: b, Process ID: 5, Ticks: 3",
        ];
        let trace = align(parse_event_stream(&lines, &DEFAULT_UNIVERSE).unwrap()).unwrap();

        assert_eq!(trace.series[&4], vec![0, 1, 1, 2]);
        assert_eq!(trace.series[&5], vec![0, 1, 2, 3]);
        assert_eq!(trace.series[&4][2], trace.series[&4][1]);
        assert!(trace.is_aligned());
        assert_eq!(trace.tick_axis(), 0..4);
    }

    #[test]
    fn event_stream_tracks_unknown_process() {
        let lines = [
            "Tick Number: 1",
            " Process Name: late, Process ID: 9, Ticks: 3",
        ];
        let trace = parse_event_stream(&lines, &[1]).unwrap();
        assert_eq!(trace.series[&9], vec![0, 3]);
    }

    #[test]
    fn event_stream_places_late_process_on_current_tick() {
        let lines = [
            "Tick Number: 1",
            "Tick Number: 2",
            "Tick Number: 3",
            " Process Name: late, Process ID: 9, Ticks: 1",
        ];
        let trace = align(parse_event_stream(&lines, &[1]).unwrap()).unwrap();
        assert_eq!(trace.series[&9], vec![0, 0, 0, 1]);
        assert_eq!(trace.series[&1], vec![0, 0, 0, 0]);
    }

    #[test]
    fn event_stream_ignores_noise() {
        let clean = [
            "Tick Number: 1",
            " Process Name: A, Process ID: 1, Ticks: 5",
            "Tick Number: 2",
        ];
        let noisy = [
            "init: starting sh",
            "Tick Number: 1",
            "",
            " Process Name: A, Process ID: 1, Ticks: 5",
            "# comment",
            "Tick Number: ?",
            "0 1 2 3",
            "Tick Number: 2",
        ];
        assert_eq!(
            parse_event_stream(&clean, &DEFAULT_UNIVERSE).unwrap(),
            parse_event_stream(&noisy, &DEFAULT_UNIVERSE).unwrap()
        );
    }

    #[test]
    fn event_stream_rejects_huge_tick_marker() {
        let lines = [format!("Tick Number: {}", usize::MAX)];
        assert!(parse_event_stream(&lines, &[]).is_err());
        assert!(parse_event_stream(&lines, &[1]).is_err());

        let lines = [format!("Tick Number: {}", usize::MAX - 1)];
        let err = parse_event_stream(&lines, &[1]).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn event_stream_limits_jump_not_absolute_tick() {
        let lines = [
            format!("Tick Number: {}", MAX_TICK_JUMP),
            format!("Tick Number: {}", MAX_TICK_JUMP + 1),
        ];
        let trace = parse_event_stream(&lines, &[]).unwrap();
        assert_eq!(trace.ticks, MAX_TICK_JUMP + 2);

        let lines = [format!("Tick Number: {}", MAX_TICK_JUMP + 1)];
        assert!(parse_event_stream(&lines, &[]).is_err());
    }

    #[test]
    fn event_stream_without_lines_is_seed_only() {
        let lines: [&str; 0] = [];
        let trace = parse_event_stream(&lines, &DEFAULT_UNIVERSE).unwrap();
        assert_eq!(trace, Trace::seeded(&DEFAULT_UNIVERSE));
    }

    #[test]
    fn dense_rows_are_assigned_by_position() {
        let lines = ["0 1 2 3", "0 0 0 5"];
        let trace = parse_dense_rows(&lines, &[]);

        assert_eq!(trace.series.len(), 2);
        assert_eq!(trace.series[&1], vec![0, 1, 2, 3]);
        assert_eq!(trace.series[&2], vec![0, 0, 0, 5]);
        assert_eq!(trace.ticks, 0);
    }

    #[test]
    fn dense_rows_skip_noise_without_consuming_ids() {
        let lines = [
            "RR results:",
            "0 1 2 3",
            "",
            "0 1 bad",
            "1 2 3",
            "0 0 0 5",
        ];
        let trace = parse_dense_rows(&lines, &[1, 2, 3]);

        assert_eq!(trace.series[&1], vec![0, 1, 2, 3]);
        assert_eq!(trace.series[&2], vec![0, 0, 0, 5]);
        assert_eq!(trace.series[&3], vec![0]);
    }

    #[test]
    fn dense_rows_align_to_longest_row() {
        let lines = ["0 1 2 3 4", "0 1"];
        let trace = align(parse_dense_rows(&lines, &[1, 2, 3])).unwrap();

        assert_eq!(trace.series[&2], vec![0, 1, 1, 1, 1]);
        assert_eq!(trace.series[&3], vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn detects_formats() {
        assert_eq!(
            detect_format(&["noise", "Tick Number: 3"]).unwrap(),
            Some(TraceFormat::Event)
        );
        assert_eq!(
            detect_format(&["0 1 2", "0 0 1"]).unwrap(),
            Some(TraceFormat::Dense)
        );
        assert_eq!(detect_format(&["nothing here"]).unwrap(), None);
    }

    #[test]
    fn parse_dispatches_on_format() {
        let lines = ["0 1 2 3"];
        assert_eq!(
            parse(TraceFormat::Dense, &lines, &[]).unwrap().series[&1],
            vec![0, 1, 2, 3]
        );
        assert_eq!(
            parse(TraceFormat::Event, &lines, &[1]).unwrap(),
            Trace::seeded(&[1])
        );
    }
}
