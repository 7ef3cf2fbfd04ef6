//! Plain-text rendering of the dashboard view.

use std::fmt::{self, Write};

use weather_core::{
    Notification, Severity,
    view::{ChartPoint, DashboardView, Panel, ReadyView},
};

/// Width of the longest temperature bar.
const BAR_WIDTH: f64 = 30.0;

pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();

    match &view.panel {
        Panel::Loading => out.push_str("Loading...\n"),
        Panel::Empty => {}
        Panel::Ready(ready) => {
            // fmt::Write for String never returns an error.
            let _ = ready_panel(&mut out, ready);
        }
    }

    out
}

fn ready_panel(out: &mut impl Write, ready: &ReadyView) -> fmt::Result {
    let c = &ready.conditions;

    writeln!(out, "{} {}  {}", c.icon.glyph(), c.location, c.temperature)?;
    writeln!(out, "  {}", c.description)?;
    writeln!(out)?;
    writeln!(out, "Temperature  feels like {}  min {}  max {}", c.feels_like, c.min, c.max)?;
    writeln!(out, "Wind         {}  from {}  gusts {}", c.wind_speed, c.wind_direction, c.wind_gust)?;
    writeln!(out, "Humidity     {}  pressure {}  sea level {}", c.humidity, c.pressure, c.sea_level)?;
    writeln!(out, "Visibility   {}  cloud cover {}", c.visibility, c.cloud_cover)?;
    writeln!(out, "Sun          rise {}  set {}", c.sunrise, c.sunset)?;
    writeln!(
        out,
        "Map          {:.4}, {:.4} (zoom {})",
        ready.map.lat, ready.map.lon, ready.map.zoom
    )?;

    if let Some(summary) = &ready.summary {
        writeln!(out)?;
        writeln!(out, "Next hours")?;
        for point in summary {
            writeln!(out, "  {:<10} {:>6.1}°C", point.date, point.temperature)?;
        }
    }

    if let Some(chart) = &ready.chart {
        writeln!(out)?;
        writeln!(out, "Temperature forecast")?;
        chart_rows(out, chart)?;
    }

    Ok(())
}

/// One horizontal bar per point, scaled between the series min and max.
fn chart_rows(out: &mut impl Write, chart: &[ChartPoint]) -> fmt::Result {
    let (min, max) = chart.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.temperature), hi.max(p.temperature))
    });
    let span = (max - min).max(f64::EPSILON);

    for point in chart {
        let len = 1 + ((point.temperature - min) / span * BAR_WIDTH).round() as usize;
        writeln!(
            out,
            "  {:<18} {:>6.1}°C {}",
            point.tooltip,
            point.temperature,
            "█".repeat(len)
        )?;
    }

    Ok(())
}

pub fn notifications(notes: &[Notification]) {
    for note in notes {
        match note.severity {
            Severity::Error => eprintln!("{}: {}", note.title, note.description),
            Severity::Info => eprintln!("{}", note.description),
        }
    }
}
