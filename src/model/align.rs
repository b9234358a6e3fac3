use crate::Result;
use crate::model::{ProcessSeries, Trace};
use anyhow::ensure;

/// Extend `series` to `len` by repeating its final value (0 if empty).
/// Longer series are left untouched.
pub fn carry_forward(series: &mut ProcessSeries, len: usize) {
    if series.len() < len {
        let last = series.last().copied().unwrap_or(0);
        series.resize(len, last);
    }
}

/// Forward-fill every series to a common length.
///
/// The target is the longest series or the tick count implied by the markers,
/// whichever is larger. Short series repeat their own final value; nothing is
/// interpolated. Aligning an aligned trace returns it unchanged.
pub fn align(mut trace: Trace) -> Result<Trace> {
    let target = trace.max_len().max(trace.ticks);

    for series in trace.series.values_mut() {
        carry_forward(series, target);
    }

    ensure!(
        trace.series.values().all(|s| s.len() == target),
        "internal error: series lengths differ after alignment (target {})",
        target
    );

    trace.ticks = target;
    Ok(trace)
}
