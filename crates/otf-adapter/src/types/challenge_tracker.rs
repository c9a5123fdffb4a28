/*
[INPUT]:  Challenge tracker payloads (PascalCase wire names)
[OUTPUT]: ChallengeTrackerDetail and its history/benchmark records
[POS]:    Data layer - challenge tracker models
[UPDATE]: When API schema changes or new types added
*/

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::serde_helpers::{self, parse_timestamp};
use crate::error::{OtfError, ParseError, Result};

/// A recorded result; the API sends numbers for most equipment and text for
/// time-based challenges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    Text(String),
}

impl RecordValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Number(value) => Some(*value),
            RecordValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "EquipmentId")]
    pub equipment_id: i64,
    #[serde(alias = "EntryType")]
    pub entry_type: String,
    #[serde(alias = "MetricKey")]
    pub metric_key: String,
    #[serde(alias = "MinValue")]
    pub min_value: String,
    #[serde(alias = "MaxValue")]
    pub max_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkHistory {
    #[serde(alias = "StudioName")]
    pub studio_name: String,
    #[serde(alias = "EquipmentId")]
    pub equipment_id: i64,
    #[serde(alias = "Result")]
    pub result: RecordValue,
    #[serde(
        alias = "DateCreated",
        deserialize_with = "serde_helpers::deserialize_timestamp"
    )]
    pub date_created: NaiveDateTime,
    #[serde(
        alias = "DateUpdated",
        deserialize_with = "serde_helpers::deserialize_timestamp"
    )]
    pub date_updated: NaiveDateTime,
    #[serde(
        alias = "ClassTime",
        deserialize_with = "serde_helpers::deserialize_timestamp"
    )]
    pub class_time: NaiveDateTime,
    #[serde(default, alias = "ChallengeSubCategoryId")]
    pub challenge_sub_category_id: Option<i64>,
    #[serde(alias = "ClassId")]
    pub class_id: i64,
    #[serde(default, alias = "SubstituteId")]
    pub substitute_id: Option<i64>,
    #[serde(alias = "WeightLBS")]
    pub weight_lbs: i64,
    #[serde(alias = "ClassName")]
    pub class_name: String,
    #[serde(alias = "CoachName")]
    pub coach_name: String,
    #[serde(alias = "CoachImageUrl")]
    pub coach_image_url: String,
    #[serde(default, alias = "WorkoutTypeId")]
    pub workout_type_id: Option<i64>,
    #[serde(default, alias = "WorkoutId")]
    pub workout_id: Option<i64>,
    /// Shape not documented upstream
    #[serde(
        default,
        alias = "LinkedChallenges",
        deserialize_with = "serde_helpers::deserialize_null_default"
    )]
    pub linked_challenges: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeHistory {
    #[serde(alias = "ChallengeObjective")]
    pub challenge_objective: String,
    #[serde(alias = "ChallengeId")]
    pub challenge_id: i64,
    #[serde(alias = "StudioId")]
    pub studio_id: i64,
    #[serde(alias = "StudioName")]
    pub studio_name: String,
    #[serde(
        alias = "StartDate",
        deserialize_with = "serde_helpers::deserialize_timestamp"
    )]
    pub start_date: NaiveDateTime,
    #[serde(
        alias = "EndDate",
        deserialize_with = "serde_helpers::deserialize_timestamp"
    )]
    pub end_date: NaiveDateTime,
    #[serde(alias = "TotalResult")]
    pub total_result: RecordValue,
    #[serde(alias = "IsFinished")]
    pub is_finished: bool,
    #[serde(
        default,
        alias = "BenchmarkHistories",
        deserialize_with = "serde_helpers::deserialize_null_default"
    )]
    pub benchmark_histories: Vec<BenchmarkHistory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeTrackerDetail {
    #[serde(alias = "ChallengeCategoryId")]
    pub challenge_category_id: i64,
    #[serde(default, alias = "ChallengeSubCategoryId")]
    pub challenge_sub_category_id: Option<i64>,
    #[serde(alias = "EquipmentId")]
    pub equipment_id: i64,
    #[serde(alias = "EquipmentName")]
    pub equipment_name: String,
    #[serde(alias = "MetricEntry")]
    pub metric_entry: MetricEntry,
    #[serde(alias = "ChallengeName")]
    pub challenge_name: String,
    #[serde(alias = "LogoUrl")]
    pub logo_url: String,
    #[serde(alias = "BestRecord")]
    pub best_record: RecordValue,
    #[serde(alias = "LastRecord")]
    pub last_record: RecordValue,
    #[serde(alias = "PreviousRecord")]
    pub previous_record: RecordValue,
    #[serde(default, alias = "Unit")]
    pub unit: Option<String>,
    #[serde(default, alias = "Goals")]
    pub goals: Option<Value>,
    #[serde(
        default,
        alias = "ChallengeHistories",
        deserialize_with = "serde_helpers::deserialize_null_default"
    )]
    pub challenge_histories: Vec<ChallengeHistory>,
}

/// JSON shape a field must have
#[derive(Debug, Clone, Copy)]
enum Shape {
    Integer,
    Text,
    /// Number or string
    Record,
    Flag,
    Timestamp,
    Object,
    Array,
}

impl Shape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Shape::Integer => value.as_i64().is_some(),
            Shape::Text => value.is_string(),
            Shape::Record => value.is_number() || value.is_string(),
            Shape::Flag => value.is_boolean(),
            Shape::Timestamp => value.as_str().and_then(parse_timestamp).is_some(),
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Shape::Integer => "an integer",
            Shape::Text => "a string",
            Shape::Record => "a number or string",
            Shape::Flag => "a boolean",
            Shape::Timestamp => "an ISO-8601 timestamp",
            Shape::Object => "an object",
            Shape::Array => "an array",
        }
    }
}

/// Wire key, model field name and shape of one record field
struct WireField {
    wire: &'static str,
    name: &'static str,
    shape: Shape,
    required: bool,
}

const fn required(wire: &'static str, name: &'static str, shape: Shape) -> WireField {
    WireField {
        wire,
        name,
        shape,
        required: true,
    }
}

const fn optional(wire: &'static str, name: &'static str, shape: Shape) -> WireField {
    WireField {
        wire,
        name,
        shape,
        required: false,
    }
}

const METRIC_ENTRY_FIELDS: &[WireField] = &[
    required("Title", "title", Shape::Text),
    required("EquipmentId", "equipment_id", Shape::Integer),
    required("EntryType", "entry_type", Shape::Text),
    required("MetricKey", "metric_key", Shape::Text),
    required("MinValue", "min_value", Shape::Text),
    required("MaxValue", "max_value", Shape::Text),
];

const BENCHMARK_FIELDS: &[WireField] = &[
    required("StudioName", "studio_name", Shape::Text),
    required("EquipmentId", "equipment_id", Shape::Integer),
    required("Result", "result", Shape::Record),
    required("DateCreated", "date_created", Shape::Timestamp),
    required("DateUpdated", "date_updated", Shape::Timestamp),
    required("ClassTime", "class_time", Shape::Timestamp),
    optional("ChallengeSubCategoryId", "challenge_sub_category_id", Shape::Integer),
    required("ClassId", "class_id", Shape::Integer),
    optional("SubstituteId", "substitute_id", Shape::Integer),
    required("WeightLBS", "weight_lbs", Shape::Integer),
    required("ClassName", "class_name", Shape::Text),
    required("CoachName", "coach_name", Shape::Text),
    required("CoachImageUrl", "coach_image_url", Shape::Text),
    optional("WorkoutTypeId", "workout_type_id", Shape::Integer),
    optional("WorkoutId", "workout_id", Shape::Integer),
    optional("LinkedChallenges", "linked_challenges", Shape::Array),
];

const HISTORY_FIELDS: &[WireField] = &[
    required("ChallengeObjective", "challenge_objective", Shape::Text),
    required("ChallengeId", "challenge_id", Shape::Integer),
    required("StudioId", "studio_id", Shape::Integer),
    required("StudioName", "studio_name", Shape::Text),
    required("StartDate", "start_date", Shape::Timestamp),
    required("EndDate", "end_date", Shape::Timestamp),
    required("TotalResult", "total_result", Shape::Record),
    required("IsFinished", "is_finished", Shape::Flag),
    optional("BenchmarkHistories", "benchmark_histories", Shape::Array),
];

const DETAIL_FIELDS: &[WireField] = &[
    required("ChallengeCategoryId", "challenge_category_id", Shape::Integer),
    optional("ChallengeSubCategoryId", "challenge_sub_category_id", Shape::Integer),
    required("EquipmentId", "equipment_id", Shape::Integer),
    required("EquipmentName", "equipment_name", Shape::Text),
    required("MetricEntry", "metric_entry", Shape::Object),
    required("ChallengeName", "challenge_name", Shape::Text),
    required("LogoUrl", "logo_url", Shape::Text),
    required("BestRecord", "best_record", Shape::Record),
    required("LastRecord", "last_record", Shape::Record),
    required("PreviousRecord", "previous_record", Shape::Record),
    optional("Unit", "unit", Shape::Text),
    optional("ChallengeHistories", "challenge_histories", Shape::Array),
];

/// Value of `field` on a record carrying wire keys or, once cached, model
/// field names. Null counts as absent.
fn lookup<'a>(record: &'a Map<String, Value>, field: &WireField) -> Option<&'a Value> {
    record
        .get(field.wire)
        .or_else(|| record.get(field.name))
        .filter(|value| !value.is_null())
}

fn check_fields<'a>(
    value: &'a Value,
    fields: &[WireField],
) -> std::result::Result<&'a Map<String, Value>, ParseError> {
    let record = value.as_object().ok_or(ParseError::NotAnObject)?;

    for field in fields {
        match lookup(record, field) {
            None if field.required => return Err(ParseError::MissingField { field: field.wire }),
            Some(value) if !field.shape.accepts(value) => {
                return Err(ParseError::InvalidField {
                    field: field.wire,
                    expected: field.shape.expected(),
                });
            }
            _ => {}
        }
    }

    Ok(record)
}

/// Elements of the array held by `wire`, empty when absent
fn items<'a>(record: &'a Map<String, Value>, fields: &[WireField], wire: &str) -> &'a [Value] {
    fields
        .iter()
        .find(|field| field.wire == wire)
        .and_then(|field| lookup(record, field))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Walk a detail payload so that shape errors name the wire key
fn check_detail(payload: &Value) -> std::result::Result<(), ParseError> {
    let detail = check_fields(payload, DETAIL_FIELDS)?;

    if let Some(metric_entry) = detail
        .get("MetricEntry")
        .or_else(|| detail.get("metric_entry"))
    {
        check_fields(metric_entry, METRIC_ENTRY_FIELDS)?;
    }

    for history in items(detail, DETAIL_FIELDS, "ChallengeHistories") {
        let history = check_fields(history, HISTORY_FIELDS)?;
        for benchmark in items(history, HISTORY_FIELDS, "BenchmarkHistories") {
            check_fields(benchmark, BENCHMARK_FIELDS)?;
        }
    }

    Ok(())
}

impl ChallengeTrackerDetail {
    pub fn from_payload(payload: &Value) -> std::result::Result<Self, ParseError> {
        check_detail(payload)?;
        Ok(Self::deserialize(payload)?)
    }

    /// Every benchmark attempt across all history windows
    pub fn benchmarks(&self) -> impl Iterator<Item = &BenchmarkHistory> {
        self.challenge_histories
            .iter()
            .flat_map(|history| history.benchmark_histories.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeTrackerDetailList {
    pub details: Vec<ChallengeTrackerDetail>,
}

impl ChallengeTrackerDetailList {
    /// Accepts a bare array of details or an object with a `details` array
    pub fn from_payload(payload: &Value) -> std::result::Result<Self, ParseError> {
        let items = match payload {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("details") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(ParseError::InvalidField {
                        field: "details",
                        expected: "an array",
                    });
                }
                None => return Err(ParseError::MissingField { field: "details" }),
            },
            _ => return Err(ParseError::NotAnObject),
        };

        let details = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                ChallengeTrackerDetail::from_payload(item).map_err(|source| ParseError::Item {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { details })
    }

    /// The detail for one challenge category.
    ///
    /// The endpoint occasionally returns several participations; the first
    /// one wins.
    pub fn single(&self, challenge_category_id: i64) -> Result<&ChallengeTrackerDetail> {
        if self.details.len() > 1 {
            warn!(
                challenge_category_id,
                count = self.details.len(),
                "multiple challenge participations found, returning the first one"
            );
        }

        self.details.first().ok_or_else(|| {
            OtfError::not_found(format!("Challenge {challenge_category_id} not found"))
        })
    }
}
