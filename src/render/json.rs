use crate::Result;
use crate::model::Trace;

/// Serialize an aligned trace (`ticks`, `series`, `names`) as pretty JSON.
pub fn render_json(trace: &Trace) -> Result<String> {
    Ok(serde_json::to_string_pretty(trace)?)
}
