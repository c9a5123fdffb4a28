/*
[INPUT]:  Test requirements for scan and challenge payloads
[OUTPUT]: Shared JSON fixtures
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for otf-adapter tests

#![allow(dead_code)]

use serde_json::{json, Value};

pub const WEIGHT_SCALE: &str = "55.0;70.0;85.0;100.0;115.0;130.0;145.0;160.0;175.0;190.0;205.0";
pub const SMM_SCALE: &str = "60.0;70.0;80.0;90.0;100.0;110.0;120.0;130.0;140.0;150.0;160.0";
pub const BFM_SCALE: &str = "20.0;40.0;60.0;80.0;100.0;160.0;220.0;280.0;340.0;400.0;460.0";

/// Keys that must never survive into a serialized scan
pub const EXCLUDED_WIRE_KEYS: &[&str] = &[
    "bfmOfLeftArm",
    "bfmPercentOfTrunk",
    "tbwOfRightLeg",
    "icwOfLeftLeg",
    "ecwOfTrunk",
    "ecwOverTBWOfRightArm",
    "bfmControl",
    "vfl",
    "vfa",
    "bcm",
    "icw",
    "ecw",
    "ecwOverTBW",
    "lbmControl",
];

/// Model fields left out of serialized scans
pub const EXCLUDED_MODEL_FIELDS: &[&str] = &[
    "body_fat_mass_dividers",
    "body_fat_mass_plot_point",
    "skeletal_muscle_mass_dividers",
    "skeletal_muscle_mass_plot_point",
    "weight_dividers",
    "weight_plot_point",
    "body_fat_mass_details",
    "body_fat_mass_percent_details",
    "total_body_weight_details",
    "intra_cellular_water_details",
    "extra_cellular_water_details",
    "extra_cellular_water_over_total_body_water_details",
    "visceral_fat_level",
    "visceral_fat_area",
    "body_comp_measurement",
    "intracellular_water",
    "extracellular_water",
    "lean_body_mass_control",
];

fn segments(prefix: &str, values: [f64; 5]) -> Vec<(String, Value)> {
    ["LeftArm", "LeftLeg", "RightArm", "RightLeg", "Trunk"]
        .iter()
        .zip(values)
        .map(|(segment, value)| (format!("{prefix}{segment}"), json!(value)))
        .collect()
}

/// A complete scan as the API sends it, including excluded and unknown keys
pub fn full_scan_payload() -> Value {
    let mut payload = json!({
        "memberUUId": "0b9c2a4e-5d1f-4c8e-9a3b-7e6f5d4c3b2a",
        "memberId": 1234567,
        "scanResultUUId": "a1b2c3d4-e5f6-4789-abcd-ef0123456789",
        "id": "member@example.com",
        "email": "member@example.com",
        "height": "170.5",
        "gender": "M",
        "age": 42,
        "testDatetime": "2024-05-18T08:42:11",
        "weight": 182.0,
        "tbw": 82.5,
        "dlm": 19.8,
        "bfm": 16.2,
        "lbm": 66.3,
        "smm": 37.9,
        "bmi": 27.1,
        "pbf": 19.6,
        "bmr": 1802.0,
        "inBodyType": "InBody 570",
        "tbwOverLBM": 0.73,
        "bfmGraphScale": BFM_SCALE,
        "pfatnew": 95.0,
        "smmGraphScale": SMM_SCALE,
        "psmm": 125.0,
        "wtGraphScale": WEIGHT_SCALE,
        "pwt": 70.0,
        "bfmControl": -3.1,
        "vfl": 7.0,
        "vfa": 88.4,
        "bcm": 41.2,
        "icw": 29.5,
        "ecw": 18.3,
        "ecwOverTBW": 0.383,
        "lbmControl": 0.0,
        "firmwareRevision": "2.4.1"
    });

    let map = payload.as_object_mut().expect("fixture is an object");
    let groups = [
        ("lbmOf", [3.6, 10.1, 3.7, 10.2, 28.9]),
        ("lbmPercentOf", [104.2, 101.0, 106.1, 101.9, 103.3]),
        ("bfmOf", [0.0, 0.0, 0.0, 0.0, 0.0]),
        ("bfmPercentOf", [0.0, 0.0, 0.0, 0.0, 0.0]),
        ("tbwOf", [2.8, 7.9, 2.9, 8.0, 22.6]),
        ("icwOf", [1.7, 4.8, 1.8, 4.9, 13.9]),
        ("ecwOf", [1.1, 3.1, 1.1, 3.1, 8.7]),
        ("ecwOverTBWOf", [0.38, 0.39, 0.38, 0.39, 0.38]),
    ];
    for (prefix, values) in groups {
        map.extend(segments(prefix, values));
    }

    payload
}

/// The smallest scan that parses
pub fn minimal_scan_payload() -> Value {
    json!({
        "memberUUId": "m-1",
        "memberId": "m-1-id",
        "scanResultUUId": "scan-1",
        "gender": "F",
        "age": 35,
        "testDatetime": "2024-01-02T03:04:05",
        "pbf": 22.0
    })
}

pub fn challenge_tracker_detail_payload() -> Value {
    json!({
        "ChallengeCategoryId": 10,
        "ChallengeSubCategoryId": null,
        "EquipmentId": 4,
        "EquipmentName": "Rower",
        "MetricEntry": {
            "Title": "2000m Row",
            "EquipmentId": 4,
            "EntryType": "Time",
            "MetricKey": "TIME",
            "MinValue": "0",
            "MaxValue": "3600"
        },
        "ChallengeName": "2000m Row",
        "LogoUrl": "https://img.example.com/row.png",
        "BestRecord": "7:45.2",
        "LastRecord": "7:52.0",
        "PreviousRecord": "8:01.9",
        "Unit": null,
        "Goals": null,
        "ChallengeHistories": [
            {
                "ChallengeObjective": "Row 2000m as fast as possible",
                "ChallengeId": 991,
                "StudioId": 12,
                "StudioName": "Downtown",
                "StartDate": "2024-01-01T00:00:00",
                "EndDate": "2024-12-31T23:59:59",
                "TotalResult": 465.2,
                "IsFinished": false,
                "BenchmarkHistories": [
                    {
                        "StudioName": "Downtown",
                        "EquipmentId": 4,
                        "Result": 465.2,
                        "DateCreated": "2024-04-02T07:10:00",
                        "DateUpdated": "2024-04-02T07:10:00",
                        "ClassTime": "2024-04-02T06:00:00",
                        "ChallengeSubCategoryId": null,
                        "ClassId": 5512,
                        "SubstituteId": null,
                        "WeightLBS": 0,
                        "ClassName": "Orange 60",
                        "CoachName": "Alex",
                        "CoachImageUrl": "https://img.example.com/alex.png",
                        "WorkoutTypeId": null,
                        "WorkoutId": null,
                        "LinkedChallenges": []
                    },
                    {
                        "StudioName": "Uptown",
                        "EquipmentId": 4,
                        "Result": "7:52.0",
                        "DateCreated": "2024-06-10T18:40:00Z",
                        "DateUpdated": "2024-06-10T18:41:00Z",
                        "ClassTime": "2024-06-10T17:30:00Z",
                        "ChallengeSubCategoryId": null,
                        "ClassId": 6120,
                        "SubstituteId": 88,
                        "WeightLBS": 0,
                        "ClassName": "Strength 50",
                        "CoachName": "Jo",
                        "CoachImageUrl": "https://img.example.com/jo.png",
                        "WorkoutTypeId": null,
                        "WorkoutId": null,
                        "LinkedChallenges": [{ "ChallengeId": 992, "Linked": true }]
                    }
                ]
            }
        ]
    })
}
