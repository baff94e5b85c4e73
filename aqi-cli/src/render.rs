//! Human-readable output.

use std::fmt::{self, Write};

use aqi_core::{PollutionTier, report::AirQualityReport};
use chrono::{DateTime, Utc};

const LABEL_WIDTH: usize = 14;

pub fn render_report(report: &AirQualityReport, now: DateTime<Utc>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, report, now)?;
    Ok(out)
}

fn write_report(out: &mut String, report: &AirQualityReport, now: DateTime<Utc>) -> fmt::Result {
    writeln!(out, "{:<LABEL_WIDTH$}{}  {}", "AQI", report.aqi, tier_badge(&report.tier))?;
    writeln!(out, "{:<LABEL_WIDTH$}{}", "", report.tier.implication)?;
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Station", report.station)?;

    let updated = report
        .updated_at
        .map(|at| relative_time(at.with_timezone(&Utc), now))
        .unwrap_or_else(|| "unknown".to_string());
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Last Updated", updated)?;

    if let Some(pollutant) = &report.dominant_pollutant {
        writeln!(out, "{:<LABEL_WIDTH$}{}", "Dominant", pollutant)?;
    }
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Details", report.station_url)?;

    if !report.pollutants.is_empty() {
        writeln!(out, "\nPollutants")?;
        for p in &report.pollutants {
            writeln!(out, "  {:<8}{}", p.name, p.value)?;
        }
    }

    if !report.forecast.is_empty() {
        writeln!(out, "\nForecast")?;
        for day in &report.forecast {
            let date = day.day.format("%A, %B %-d, %Y").to_string();
            writeln!(out, "  {:<30}AQI: {:<6}{}", date, day.avg, tier_badge(&day.tier))?;
        }
    }

    if !report.attributions.is_empty() {
        writeln!(out, "\nAttribution")?;
        for a in &report.attributions {
            writeln!(out, "  {}  {}", a.name, a.url)?;
        }
    }

    Ok(())
}

fn tier_badge(tier: &PollutionTier) -> String {
    format!("[{}] {}", tier.level, tier.level_name)
}

/// "3 minutes ago" / "in 2 days", using the usual rounding thresholds.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let future = delta.num_seconds() < 0;
    let secs = delta.num_seconds().unsigned_abs() as f64;

    let minutes = secs / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;

    let phrase = if secs < 45.0 {
        "a few seconds".to_string()
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes.round())
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours.round())
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days.round())
    } else if days < 46.0 {
        "a month".to_string()
    } else if days < 320.0 {
        format!("{} months", (days / 30.4).round())
    } else if days < 548.0 {
        "a year".to_string()
    } else {
        format!("{} years", (days / 365.0).round())
    };

    if future {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}
