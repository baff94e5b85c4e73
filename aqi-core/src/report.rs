//! Presentation model for a reading: the rows a list view shows.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::{
    classify::{PollutionTier, classify},
    model::{AirQualityReading, Attribution, DailyRecord},
};

#[derive(Debug, Clone, Serialize)]
pub struct AirQualityReport {
    pub aqi: i32,
    pub tier: PollutionTier,
    pub station: String,
    pub station_url: String,
    pub dominant_pollutant: Option<String>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub forecast: Vec<ForecastDay>,
    pub pollutants: Vec<PollutantReading>,
    pub attributions: Vec<Attribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastDay {
    pub day: NaiveDate,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub tier: PollutionTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollutantReading {
    pub name: String,
    pub value: f64,
}

impl AirQualityReport {
    /// Assemble the report. Only PM2.5 forecast days after `today` are kept.
    pub fn build(reading: &AirQualityReading, today: NaiveDate) -> Self {
        Self {
            aqi: reading.aqi,
            tier: classify(f64::from(reading.aqi)),
            station: reading.city.name.clone(),
            station_url: reading.city.url.clone(),
            dominant_pollutant: reading.dominentpol.clone(),
            updated_at: reading.time.iso,
            forecast: upcoming_days(&reading.forecast.daily.pm25, today),
            pollutants: reading
                .iaqi
                .iter()
                .map(|(name, value)| PollutantReading {
                    name: name.clone(),
                    value: value.v,
                })
                .collect(),
            attributions: reading.attributions.clone(),
        }
    }
}

/// Forecast rows strictly after `today`, in upstream order.
pub fn upcoming_days(records: &[DailyRecord], today: NaiveDate) -> Vec<ForecastDay> {
    records
        .iter()
        .filter(|record| record.day > today)
        .map(|record| ForecastDay {
            day: record.day,
            avg: record.avg,
            min: record.min,
            max: record.max,
            tier: classify(record.avg),
        })
        .collect()
}
