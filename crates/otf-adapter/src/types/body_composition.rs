/*
[INPUT]:  Decoded InBody scan payloads keyed by the OTF wire names
[OUTPUT]: BodyCompositionData values, their cacheable payloads, and derived bands
[POS]:    Data layer - body-composition parsing, serialization and classification
[UPDATE]: When the scan payload gains fields or band rules change
*/

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::enums::{AverageType, BodyFatPercentIndicator, Gender};
use super::serde_helpers::{self, parse_timestamp, scalar_to_string};
use crate::classification::{
    self, BodyFatPercentDividers, DEFAULT_BODY_FAT_MASS_DIVIDERS,
    DEFAULT_SKELETAL_MUSCLE_MASS_DIVIDERS, DEFAULT_WEIGHT_DIVIDERS, DIVIDER_COUNT,
};
use crate::config::{ParseConfig, UnknownKeyPolicy};
use crate::error::ParseError;

pub const POUNDS_PER_KILOGRAM: f64 = 2.20462262185;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn kilograms_to_pounds(kilograms: f64) -> f64 {
    kilograms * POUNDS_PER_KILOGRAM
}

/// Split a `;`-delimited graph scale into its divider values.
///
/// An empty string means the scan carried no scale. A non-empty scale must
/// hold exactly 11 non-decreasing numbers.
pub fn parse_graph_scale(field: &'static str, raw: &str) -> Result<Vec<f64>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let values = raw
        .split(';')
        .map(|segment| {
            segment
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| ParseError::InvalidGraphScale {
                    field,
                    reason: format!("`{segment}` is not a number"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != DIVIDER_COUNT {
        return Err(ParseError::InvalidGraphScale {
            field,
            reason: format!("expected {DIVIDER_COUNT} values, found {}", values.len()),
        });
    }

    if values.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(ParseError::InvalidGraphScale {
            field,
            reason: "values are not ascending".to_string(),
        });
    }

    Ok(values)
}

/// One reading per body segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentReadings {
    pub left_arm: f64,
    pub left_leg: f64,
    pub right_arm: f64,
    pub right_leg: f64,
    pub trunk: f64,
}

/// Wire keys holding the five readings of one segment group
struct SegmentKeys {
    left_arm: &'static str,
    left_leg: &'static str,
    right_arm: &'static str,
    right_leg: &'static str,
    trunk: &'static str,
}

macro_rules! segment_keys {
    ($prefix:literal) => {
        SegmentKeys {
            left_arm: concat!($prefix, "LeftArm"),
            left_leg: concat!($prefix, "LeftLeg"),
            right_arm: concat!($prefix, "RightArm"),
            right_leg: concat!($prefix, "RightLeg"),
            trunk: concat!($prefix, "Trunk"),
        }
    };
}

impl SegmentKeys {
    fn all(&self) -> [&'static str; 5] {
        [
            self.left_arm,
            self.left_leg,
            self.right_arm,
            self.right_leg,
            self.trunk,
        ]
    }

    /// Remove this group's keys from `raw` and collect them.
    fn harvest(&self, raw: &mut Map<String, Value>) -> Result<SegmentReadings, ParseError> {
        let mut take = |key: &'static str| match raw.remove(key) {
            None | Some(Value::Null) => Ok(0.0),
            Some(value) => value.as_f64().ok_or(ParseError::InvalidField {
                field: key,
                expected: "a number",
            }),
        };

        Ok(SegmentReadings {
            left_arm: take(self.left_arm)?,
            left_leg: take(self.left_leg)?,
            right_arm: take(self.right_arm)?,
            right_leg: take(self.right_leg)?,
            trunk: take(self.trunk)?,
        })
    }

    fn discard(&self, raw: &mut Map<String, Value>) {
        for key in self.all() {
            raw.remove(key);
        }
    }
}

/// Segment groups kept on the model, by field name
const SEGMENT_GROUPS: &[(&str, SegmentKeys)] = &[
    ("lean_body_mass_details", segment_keys!("lbmOf")),
    ("lean_body_mass_percent_details", segment_keys!("lbmPercentOf")),
];

// Mostly zero in practice.
const EXCLUDED_SEGMENT_GROUPS: &[SegmentKeys] = &[
    segment_keys!("bfmOf"),
    segment_keys!("bfmPercentOf"),
    segment_keys!("tbwOf"),
    segment_keys!("icwOf"),
    segment_keys!("ecwOf"),
    segment_keys!("ecwOverTBWOf"),
];

const EXCLUDED_KEYS: &[&str] = &[
    "bfmControl",
    "vfl",
    "vfa",
    "bcm",
    "icw",
    "ecw",
    "ecwOverTBW",
    "lbmControl",
];

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Text,
    /// String or number, kept as a string
    Identifier,
    Integer,
    Float,
    /// Kilograms on the wire, pounds on the model
    Pounds,
    Timestamp,
    Gender,
    GraphScale,
}

impl FieldKind {
    fn default_value(self) -> Option<Value> {
        match self {
            FieldKind::Text | FieldKind::Identifier => Some(Value::String(String::new())),
            FieldKind::Integer => Some(Value::from(0)),
            FieldKind::Float | FieldKind::Pounds => Some(Value::from(0.0)),
            FieldKind::GraphScale => Some(Value::Array(Vec::new())),
            FieldKind::Timestamp | FieldKind::Gender => None,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Identifier => "a string or number",
            FieldKind::Integer => "an integer",
            FieldKind::Float | FieldKind::Pounds => "a number",
            FieldKind::Timestamp => "an ISO-8601 timestamp",
            FieldKind::Gender => "\"M\" or \"F\"",
            FieldKind::GraphScale => "a `;`-delimited string",
        }
    }
}

/// Wire key to model field mapping for one scalar field
struct FieldSpec {
    wire: &'static str,
    name: &'static str,
    kind: FieldKind,
    required: bool,
}

const fn required(wire: &'static str, name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        wire,
        name,
        kind,
        required: true,
    }
}

const fn optional(wire: &'static str, name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        wire,
        name,
        kind,
        required: false,
    }
}

const FIELDS: &[FieldSpec] = &[
    required("memberUUId", "member_uuid", FieldKind::Text),
    required("memberId", "member_id", FieldKind::Identifier),
    required("scanResultUUId", "scan_result_uuid", FieldKind::Text),
    optional("id", "inbody_id", FieldKind::Text),
    optional("email", "email", FieldKind::Text),
    optional("height", "height", FieldKind::Identifier),
    required("gender", "gender", FieldKind::Gender),
    required("age", "age", FieldKind::Integer),
    required("testDatetime", "scan_datetime", FieldKind::Timestamp),
    optional("weight", "provided_weight", FieldKind::Float),
    optional("tbw", "total_body_weight", FieldKind::Pounds),
    optional("dlm", "dry_lean_mass", FieldKind::Float),
    optional("bfm", "body_fat_mass", FieldKind::Float),
    optional("lbm", "lean_body_mass", FieldKind::Float),
    optional("smm", "skeletal_muscle_mass", FieldKind::Float),
    optional("bmi", "body_mass_index", FieldKind::Float),
    required("pbf", "percent_body_fat", FieldKind::Float),
    optional("bmr", "basal_metabolic_rate", FieldKind::Float),
    optional("inBodyType", "in_body_type", FieldKind::Text),
    optional(
        "tbwOverLBM",
        "total_body_weight_over_lean_body_mass",
        FieldKind::Float,
    ),
    optional("bfmGraphScale", "body_fat_mass_dividers", FieldKind::GraphScale),
    optional("pfatnew", "body_fat_mass_plot_point", FieldKind::Float),
    optional(
        "smmGraphScale",
        "skeletal_muscle_mass_dividers",
        FieldKind::GraphScale,
    ),
    optional("psmm", "skeletal_muscle_mass_plot_point", FieldKind::Float),
    optional("wtGraphScale", "weight_dividers", FieldKind::GraphScale),
    optional("pwt", "weight_plot_point", FieldKind::Float),
];

impl FieldSpec {
    fn convert(&self, value: Option<Value>) -> Result<Value, ParseError> {
        let value = match value {
            None | Some(Value::Null) => {
                return match self.kind.default_value() {
                    Some(default) if !self.required => Ok(default),
                    _ => Err(ParseError::MissingField { field: self.wire }),
                };
            }
            Some(value) => value,
        };

        let invalid = || ParseError::InvalidField {
            field: self.wire,
            expected: self.kind.expected(),
        };

        let converted = match self.kind {
            FieldKind::Text => Value::String(value.as_str().ok_or_else(invalid)?.to_string()),
            FieldKind::Identifier => Value::String(scalar_to_string(&value).ok_or_else(invalid)?),
            FieldKind::Integer => {
                let number = value
                    .as_i64()
                    .or_else(|| value.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64))
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(invalid)?;
                Value::from(number)
            }
            FieldKind::Float => Value::from(value.as_f64().ok_or_else(invalid)?),
            FieldKind::Pounds => {
                Value::from(kilograms_to_pounds(value.as_f64().ok_or_else(invalid)?))
            }
            FieldKind::Timestamp => {
                let parsed = value
                    .as_str()
                    .and_then(parse_timestamp)
                    .ok_or_else(invalid)?;
                Value::String(parsed.format(TIMESTAMP_FORMAT).to_string())
            }
            FieldKind::Gender => {
                let gender = value
                    .as_str()
                    .and_then(Gender::from_code)
                    .ok_or_else(invalid)?;
                Value::String(gender.code().to_string())
            }
            FieldKind::GraphScale => {
                let raw = value.as_str().ok_or_else(invalid)?;
                Value::from(parse_graph_scale(self.wire, raw)?)
            }
        };

        Ok(converted)
    }
}

fn check_unknown_keys(
    leftover: &Map<String, Value>,
    policy: UnknownKeyPolicy,
) -> Result<(), ParseError> {
    match policy {
        UnknownKeyPolicy::Ignore => Ok(()),
        UnknownKeyPolicy::Log => {
            for key in leftover.keys() {
                debug!(key = %key, "ignoring unknown body composition key");
            }
            Ok(())
        }
        UnknownKeyPolicy::Reject => match leftover.keys().next() {
            Some(key) => Err(ParseError::UnknownField { field: key.clone() }),
            None => Ok(()),
        },
    }
}

/// One InBody scan for one member.
///
/// Weights are in pounds. Divider scales and plot points are kept for
/// classification but never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyCompositionData {
    pub member_uuid: String,
    pub member_id: String,
    pub scan_result_uuid: String,
    /// InBody ID, same as the member's email address
    #[serde(default)]
    pub inbody_id: String,
    #[serde(default)]
    pub email: String,
    /// Height in cm
    #[serde(default)]
    pub height: String,
    pub gender: Gender,
    pub age: i32,
    #[serde(deserialize_with = "serde_helpers::deserialize_timestamp")]
    pub scan_datetime: NaiveDateTime,
    /// Weight the member reported at scan time
    #[serde(default)]
    pub provided_weight: f64,

    #[serde(default)]
    pub lean_body_mass_details: SegmentReadings,
    #[serde(default)]
    pub lean_body_mass_percent_details: SegmentReadings,

    /// Measured by the scanner
    #[serde(default)]
    pub total_body_weight: f64,
    #[serde(default)]
    pub dry_lean_mass: f64,
    #[serde(default)]
    pub body_fat_mass: f64,
    #[serde(default)]
    pub lean_body_mass: f64,
    #[serde(default)]
    pub skeletal_muscle_mass: f64,
    #[serde(default)]
    pub body_mass_index: f64,
    pub percent_body_fat: f64,
    #[serde(default)]
    pub basal_metabolic_rate: f64,
    #[serde(default)]
    pub in_body_type: String,
    #[serde(default)]
    pub total_body_weight_over_lean_body_mass: f64,

    #[serde(default, skip_serializing)]
    pub body_fat_mass_dividers: Vec<f64>,
    #[serde(default, skip_serializing)]
    pub body_fat_mass_plot_point: f64,
    #[serde(default, skip_serializing)]
    pub skeletal_muscle_mass_dividers: Vec<f64>,
    #[serde(default, skip_serializing)]
    pub skeletal_muscle_mass_plot_point: f64,
    #[serde(default, skip_serializing)]
    pub weight_dividers: Vec<f64>,
    #[serde(default, skip_serializing)]
    pub weight_plot_point: f64,
}

impl BodyCompositionData {
    /// Parse a wire payload with the default [`ParseConfig`]
    pub fn from_payload(payload: &Value) -> Result<Self, ParseError> {
        Self::from_payload_with(payload, &ParseConfig::default())
    }

    pub fn from_payload_with(payload: &Value, config: &ParseConfig) -> Result<Self, ParseError> {
        let mut raw = payload.as_object().cloned().ok_or(ParseError::NotAnObject)?;
        let mut fields = Map::new();

        for (name, keys) in SEGMENT_GROUPS {
            let readings = keys.harvest(&mut raw)?;
            trace!(group = name, ?readings, "harvested segment group");
            fields.insert(name.to_string(), serde_json::to_value(readings)?);
        }

        for keys in EXCLUDED_SEGMENT_GROUPS {
            keys.discard(&mut raw);
        }
        for key in EXCLUDED_KEYS {
            raw.remove(*key);
        }

        for spec in FIELDS {
            let value = spec.convert(raw.remove(spec.wire))?;
            fields.insert(spec.name.to_string(), value);
        }

        check_unknown_keys(&raw, config.unknown_keys)?;

        let scan: Self = serde_json::from_value(Value::Object(fields))?;
        debug!(
            member_id = %scan.member_id,
            scan_result_uuid = %scan.scan_result_uuid,
            "parsed body composition scan"
        );
        Ok(scan)
    }

    /// Cacheable payload, with divider scales and plot points left out
    pub fn to_payload(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Lower is better for this band
    pub fn body_fat_mass_relative_descriptor(&self) -> AverageType {
        let dividers = classification::dividers_or_default(
            &self.body_fat_mass_dividers,
            &DEFAULT_BODY_FAT_MASS_DIVIDERS,
        );
        classification::relative_descriptor(self.body_fat_mass_plot_point, dividers)
    }

    /// Higher is better for this band
    pub fn skeletal_muscle_mass_relative_descriptor(&self) -> AverageType {
        let dividers = classification::dividers_or_default(
            &self.skeletal_muscle_mass_dividers,
            &DEFAULT_SKELETAL_MUSCLE_MASS_DIVIDERS,
        );
        classification::relative_descriptor(self.skeletal_muscle_mass_plot_point, dividers)
    }

    /// Lower is better for this band
    pub fn weight_relative_descriptor(&self) -> AverageType {
        let dividers =
            classification::dividers_or_default(&self.weight_dividers, &DEFAULT_WEIGHT_DIVIDERS);
        classification::relative_descriptor(self.weight_plot_point, dividers)
    }

    pub fn body_fat_percent_dividers(&self) -> BodyFatPercentDividers {
        classification::body_fat_percent_dividers(self.age, self.gender)
    }

    pub fn body_fat_percent_relative_descriptor(&self) -> BodyFatPercentIndicator {
        classification::body_fat_percent_indicator(
            self.percent_body_fat,
            &self.body_fat_percent_dividers(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyCompositionList {
    pub data: Vec<BodyCompositionData>,
}

impl BodyCompositionList {
    /// Accepts a bare array of scans or an object with a `data` array
    pub fn from_payload(payload: &Value) -> Result<Self, ParseError> {
        Self::from_payload_with(payload, &ParseConfig::default())
    }

    pub fn from_payload_with(payload: &Value, config: &ParseConfig) -> Result<Self, ParseError> {
        let items = match payload {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("data") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(ParseError::InvalidField {
                        field: "data",
                        expected: "an array",
                    });
                }
                None => return Err(ParseError::MissingField { field: "data" }),
            },
            _ => return Err(ParseError::NotAnObject),
        };

        let data = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                BodyCompositionData::from_payload_with(item, config).map_err(|source| {
                    ParseError::Item {
                        index,
                        source: Box::new(source),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { data })
    }

    /// Most recent scan by scan time
    pub fn latest(&self) -> Option<&BodyCompositionData> {
        self.data.iter().max_by_key(|scan| scan.scan_datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WEIGHT_SCALE: &str = "55.0;70.0;85.0;100.0;115.0;130.0;145.0;160.0;175.0;190.0;205.0";

    fn minimal_payload() -> Value {
        json!({
            "memberUUId": "m-uuid",
            "memberId": 42,
            "scanResultUUId": "scan-uuid",
            "gender": "F",
            "age": 35,
            "testDatetime": "2024-03-09T14:05:30",
            "pbf": 22.0
        })
    }

    #[test]
    fn graph_scale_parses_in_order() {
        let values = parse_graph_scale("wtGraphScale", WEIGHT_SCALE).expect("scale");
        assert_eq!(values, DEFAULT_WEIGHT_DIVIDERS.to_vec());
    }

    #[test]
    fn empty_graph_scale_is_empty() {
        assert!(parse_graph_scale("wtGraphScale", "").expect("scale").is_empty());
        assert!(parse_graph_scale("wtGraphScale", "  ").expect("scale").is_empty());
    }

    #[test]
    fn graph_scale_rejects_bad_segments() {
        let err = parse_graph_scale("smmGraphScale", "1;2;x").expect_err("bad segment");
        assert_eq!(err.field(), Some("smmGraphScale"));

        let err = parse_graph_scale("smmGraphScale", "1;2;3").expect_err("short scale");
        assert!(err.to_string().contains("expected 11 values, found 3"));

        let err = parse_graph_scale("smmGraphScale", "1;2;3;4;5;6;7;8;9;11;10")
            .expect_err("descending tail");
        assert!(err.to_string().contains("not ascending"));
    }

    #[test]
    fn graph_scale_rejects_non_finite_values() {
        for tail in ["NaN", "inf", "-infinity"] {
            let raw = format!("55;70;85;100;115;130;145;160;175;190;{tail}");
            let err = parse_graph_scale("wtGraphScale", &raw).expect_err("non-finite divider");
            assert_eq!(err.field(), Some("wtGraphScale"));
            assert!(err.to_string().contains(tail));
        }
    }

    #[test]
    fn non_finite_scale_in_payload_names_wire_key() {
        let mut payload = minimal_payload();
        payload["wtGraphScale"] = json!("55;70;85;100;115;130;145;160;175;190;NaN");

        let err = BodyCompositionData::from_payload(&payload).expect_err("NaN divider");
        assert_eq!(err.field(), Some("wtGraphScale"));
    }

    #[test]
    fn kilograms_convert_to_pounds() {
        assert!((kilograms_to_pounds(100.0) - 220.462262185).abs() < 1e-9);
        assert_eq!(kilograms_to_pounds(0.0), 0.0);
    }

    #[test]
    fn minimal_payload_defaults_optional_fields() {
        let scan = BodyCompositionData::from_payload(&minimal_payload()).expect("scan");

        assert_eq!(scan.member_id, "42");
        assert_eq!(scan.gender, Gender::Female);
        assert_eq!(scan.email, "");
        assert_eq!(scan.total_body_weight, 0.0);
        assert_eq!(scan.lean_body_mass_details, SegmentReadings::default());
        assert!(scan.weight_dividers.is_empty());
        assert_eq!(
            scan.body_fat_percent_relative_descriptor(),
            BodyFatPercentIndicator::GoalSettingFat
        );
    }

    #[test]
    fn null_required_field_is_missing() {
        let mut payload = minimal_payload();
        payload["gender"] = Value::Null;

        let err = BodyCompositionData::from_payload(&payload).expect_err("null gender");
        assert!(matches!(err, ParseError::MissingField { field: "gender" }));
    }

    #[test]
    fn wrong_type_names_wire_key() {
        let mut payload = minimal_payload();
        payload["bmi"] = json!("high");

        let err = BodyCompositionData::from_payload(&payload).expect_err("bad bmi");
        assert!(matches!(
            err,
            ParseError::InvalidField {
                field: "bmi",
                expected: "a number"
            }
        ));
    }

    #[test]
    fn integral_float_age_is_accepted() {
        let mut payload = minimal_payload();
        payload["age"] = json!(35.0);
        let scan = BodyCompositionData::from_payload(&payload).expect("scan");
        assert_eq!(scan.age, 35);

        payload["age"] = json!(35.5);
        assert!(BodyCompositionData::from_payload(&payload).is_err());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = BodyCompositionData::from_payload(&json!([1, 2])).expect_err("array");
        assert!(matches!(err, ParseError::NotAnObject));
    }

    #[test]
    fn list_accepts_data_envelope_and_bare_array() {
        let mut later = minimal_payload();
        later["scanResultUUId"] = json!("scan-2");
        later["testDatetime"] = json!("2024-06-01T08:00:00");

        let enveloped =
            BodyCompositionList::from_payload(&json!({ "data": [minimal_payload(), later.clone()] }))
                .expect("list");
        let bare = BodyCompositionList::from_payload(&json!([minimal_payload(), later]))
            .expect("list");

        assert_eq!(enveloped, bare);
        assert_eq!(enveloped.data.len(), 2);
        assert_eq!(
            enveloped.latest().map(|scan| scan.scan_result_uuid.as_str()),
            Some("scan-2")
        );
    }

    #[test]
    fn list_reports_failing_item() {
        let mut broken = minimal_payload();
        broken
            .as_object_mut()
            .expect("object")
            .remove("testDatetime");

        let err = BodyCompositionList::from_payload(&json!([minimal_payload(), broken]))
            .expect_err("broken item");
        match err {
            ParseError::Item { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, ParseError::MissingField { field: "testDatetime" }));
            }
            other => panic!("Expected Item error, got {other:?}"),
        }
    }

    #[test]
    fn list_without_data_is_missing_field() {
        let err = BodyCompositionList::from_payload(&json!({ "items": [] })).expect_err("no data");
        assert!(matches!(err, ParseError::MissingField { field: "data" }));
    }
}
