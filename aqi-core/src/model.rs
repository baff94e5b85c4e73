use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// AQI value used when the station reports no number (upstream sends `"-"`).
pub const AQI_UNAVAILABLE: i32 = -1;

/// Payload of a successful `feed` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityReading {
    #[serde(deserialize_with = "deserialize_aqi")]
    pub aqi: i32,
    /// Station index; usable as an `@<idx>` location.
    #[serde(default)]
    pub idx: Option<i64>,
    pub city: Station,
    pub time: ObservationTime,
    #[serde(default)]
    pub forecast: Forecast,
    #[serde(default)]
    pub attributions: Vec<Attribution>,
    #[serde(default)]
    pub iaqi: BTreeMap<String, IaqiValue>,
    /// Pollutant driving the current AQI. Spelled as upstream spells it.
    #[serde(default)]
    pub dominentpol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub url: String,
    /// `[latitude, longitude]`
    #[serde(default)]
    pub geo: Vec<f64>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationTime {
    /// Local time of the measurement, `YYYY-MM-DD hh:mm:ss`.
    #[serde(default)]
    pub s: Option<String>,
    /// Station UTC offset, e.g. `+08:00`.
    #[serde(default)]
    pub tz: Option<String>,
    #[serde(default)]
    pub v: Option<i64>,
    #[serde(default)]
    pub iso: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub daily: DailyForecast,
}

/// Per-pollutant daily forecast series, ordered by day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub pm25: Vec<DailyRecord>,
    #[serde(default)]
    pub pm10: Vec<DailyRecord>,
    #[serde(default)]
    pub o3: Vec<DailyRecord>,
    #[serde(default)]
    pub uvi: Vec<DailyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub day: NaiveDate,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub url: String,
}

/// Instantaneous sub-index for a single pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IaqiValue {
    pub v: f64,
}

fn deserialize_aqi<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAqi {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let aqi = match RawAqi::deserialize(deserializer)? {
        RawAqi::Int(v) => i32::try_from(v).unwrap_or(AQI_UNAVAILABLE),
        RawAqi::Float(v) => v.round() as i32,
        RawAqi::Text(s) => s.trim().parse().unwrap_or(AQI_UNAVAILABLE),
    };

    Ok(aqi)
}
