use crate::Result;
use crate::config::ChartConfig;
use crate::model::{ProcessId, ProcessSeries, Trace};
use anyhow::{Context, ensure};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

/// Series drawn for `min_pid`: ids `>= min_pid`, ascending.
pub fn select_series(trace: &Trace, min_pid: ProcessId) -> Vec<(ProcessId, &ProcessSeries)> {
    trace.series.range(min_pid..).map(|(&pid, s)| (pid, s)).collect()
}

/// Upper bounds of the x (tick index) and y (cumulative ticks) axes.
/// Both are at least 1 so an all-zero chart still has a drawable range.
fn axis_bounds(ticks: Range<usize>, selected: &[(ProcessId, &ProcessSeries)]) -> (u64, u64) {
    let x_max = ticks.end.saturating_sub(1) as u64;
    let y_max = selected
        .iter()
        .flat_map(|(_, s)| s.iter().copied())
        .max()
        .unwrap_or(0);
    (x_max.max(1), y_max.max(1))
}

fn is_svg(chart: &ChartConfig) -> bool {
    chart
        .out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Draw one line per selected process and write the image to `chart.out`.
///
/// PNG by default, SVG when the output path ends in `.svg`.
pub fn render_chart(trace: &Trace, chart: &ChartConfig) -> Result<()> {
    ensure!(
        trace.is_aligned(),
        "refusing to plot unaligned trace for {}",
        chart.out.display()
    );

    let selected = select_series(trace, chart.min_pid);
    if selected.is_empty() {
        tracing::warn!(min_pid = chart.min_pid, "no process ids selected; chart will be empty");
    }

    let size = (chart.width, chart.height);
    let drawn = if is_svg(chart) {
        draw(
            SVGBackend::new(&chart.out, size).into_drawing_area(),
            trace.tick_axis(),
            &selected,
            chart,
        )
    } else {
        draw(
            BitMapBackend::new(&chart.out, size).into_drawing_area(),
            trace.tick_axis(),
            &selected,
            chart,
        )
    };
    drawn.with_context(|| format!("render chart {}", chart.out.display()))?;

    tracing::info!(
        out = %chart.out.display(),
        series = selected.len(),
        "wrote chart"
    );
    Ok(())
}

fn draw<DB>(
    root: DrawingArea<DB, Shift>,
    ticks: Range<usize>,
    selected: &[(ProcessId, &ProcessSeries)],
    chart: &ChartConfig,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (x_max, y_max) = axis_bounds(ticks, selected);
    let mut cc = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0u64..x_max, 0u64..y_max)?;

    cc.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    for (idx, (pid, series)) in selected.iter().enumerate() {
        let style = Palette99::pick(idx).stroke_width(2);
        cc.draw_series(LineSeries::new(
            series.iter().enumerate().map(|(x, &y)| (x as u64, y)),
            style,
        ))?
        .label(format!("P{}", pid))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    cc.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}
