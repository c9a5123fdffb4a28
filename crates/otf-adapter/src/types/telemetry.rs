/*
[INPUT]:  Per-class telemetry payloads (camelCase wire names)
[OUTPUT]: Telemetry with absolute item timestamps, and a trimmed payload view
[POS]:    Data layer - in-class heart-rate and equipment telemetry
[UPDATE]: When telemetry fields or the payload preview rules change
*/

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::serde_helpers;
use crate::config::ParseConfig;
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(alias = "startBpm")]
    pub start_bpm: i64,
    #[serde(alias = "endBpm")]
    pub end_bpm: i64,
}

impl Zone {
    pub fn contains(&self, bpm: i64) -> bool {
        (self.start_bpm..=self.end_bpm).contains(&bpm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zones {
    pub gray: Zone,
    pub blue: Zone,
    pub green: Zone,
    pub orange: Zone,
    pub red: Zone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreadData {
    #[serde(alias = "treadSpeed")]
    pub tread_speed: f64,
    #[serde(alias = "treadIncline")]
    pub tread_incline: f64,
    #[serde(alias = "aggTreadDistance")]
    pub agg_tread_distance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowData {
    #[serde(alias = "rowSpeed")]
    pub row_speed: f64,
    #[serde(alias = "rowPps")]
    pub row_pps: f64,
    #[serde(alias = "rowSpm")]
    pub row_spm: f64,
    #[serde(alias = "aggRowDistance")]
    pub agg_row_distance: i64,
    #[serde(alias = "rowPace")]
    pub row_pace: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryItem {
    /// Seconds since class start
    #[serde(alias = "relativeTimestamp")]
    pub relative_timestamp: i64,
    #[serde(default)]
    pub hr: Option<i64>,
    #[serde(alias = "aggSplats")]
    pub agg_splats: i64,
    #[serde(alias = "aggCalories")]
    pub agg_calories: i64,
    /// Derived from the class start time; never sent by the API
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_timestamp"
    )]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default, alias = "treadData")]
    pub tread_data: Option<TreadData>,
    #[serde(default, alias = "rowData")]
    pub row_data: Option<RowData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(alias = "memberUuid")]
    pub member_uuid: String,
    #[serde(alias = "classHistoryUuid")]
    pub class_history_uuid: String,
    #[serde(
        default,
        alias = "classStartTime",
        deserialize_with = "serde_helpers::deserialize_optional_timestamp"
    )]
    pub class_start_time: Option<NaiveDateTime>,
    #[serde(default, alias = "maxHr")]
    pub max_hr: Option<i64>,
    #[serde(default)]
    pub zones: Option<Zones>,
    #[serde(default, alias = "windowSize")]
    pub window_size: Option<i64>,
    #[serde(default)]
    pub telemetry: Vec<TelemetryItem>,
}

impl Telemetry {
    /// Parse a wire payload and stamp every item with its absolute time
    pub fn from_payload(payload: &Value) -> Result<Self, ParseError> {
        let mut telemetry = Self::deserialize(payload)?;
        telemetry.stamp_items();
        Ok(telemetry)
    }

    /// Same id as `class_history_uuid`
    pub fn performance_summary_id(&self) -> &str {
        &self.class_history_uuid
    }

    /// Payload with the item list cut down to a preview
    pub fn to_payload(&self) -> serde_json::Result<Value> {
        self.to_payload_with(&ParseConfig::default())
    }

    pub fn to_payload_with(&self, config: &ParseConfig) -> serde_json::Result<Value> {
        let mut payload = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut payload {
            let preview = preview_items(&self.telemetry, config.telemetry_preview);
            map.insert("telemetry".to_string(), serde_json::to_value(preview)?);
        }
        Ok(payload)
    }

    fn stamp_items(&mut self) {
        let Some(start) = self.class_start_time else {
            return;
        };

        for item in &mut self.telemetry {
            item.timestamp = TimeDelta::try_seconds(item.relative_timestamp)
                .and_then(|offset| start.checked_add_signed(offset));
        }
    }
}

/// First and last `keep` items, or everything when the list is short
fn preview_items(items: &[TelemetryItem], keep: usize) -> Vec<&TelemetryItem> {
    if items.len() <= keep.saturating_mul(2) {
        return items.iter().collect();
    }

    items[..keep]
        .iter()
        .chain(items[items.len() - keep..].iter())
        .collect()
}
