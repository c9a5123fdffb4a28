/*
[INPUT]:  Parsed scan metrics, divider scales, member age and gender
[OUTPUT]: Qualitative bands (AverageType, BodyFatPercentIndicator)
[POS]:    Domain logic - pure classifiers over body-composition data
[UPDATE]: When band thresholds or default scales change
*/

use crate::types::{AverageType, BodyFatPercentIndicator, Gender};

/// Number of thresholds in a plot-point divider scale.
pub const DIVIDER_COUNT: usize = 11;

pub const DEFAULT_WEIGHT_DIVIDERS: [f64; DIVIDER_COUNT] = [
    55.0, 70.0, 85.0, 100.0, 115.0, 130.0, 145.0, 160.0, 175.0, 190.0, 205.0,
];

pub const DEFAULT_SKELETAL_MUSCLE_MASS_DIVIDERS: [f64; DIVIDER_COUNT] = [
    70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0, 170.0,
];

pub const DEFAULT_BODY_FAT_MASS_DIVIDERS: [f64; DIVIDER_COUNT] = [
    40.0, 60.0, 80.0, 100.0, 160.0, 220.0, 280.0, 340.0, 400.0, 460.0, 520.0,
];

/// `(0, low, high, 100)` divider tuple for percent body fat.
pub type BodyFatPercentDividers = [f64; 4];

const NO_BODY_FAT_DIVIDERS: BodyFatPercentDividers = [0.0, 0.0, 0.0, 0.0];

// (age band upper bound, dividers), bands start at 0 and are half-open
const MALE_BODY_FAT_DIVIDERS: [(i32, BodyFatPercentDividers); 5] = [
    (30, [0.0, 13.1, 21.1, 100.0]),
    (40, [0.0, 17.1, 23.1, 100.0]),
    (50, [0.0, 20.1, 25.1, 100.0]),
    (60, [0.0, 21.1, 26.1, 100.0]),
    (70, [0.0, 22.1, 27.1, 100.0]),
];

const FEMALE_BODY_FAT_DIVIDERS: [(i32, BodyFatPercentDividers); 5] = [
    (30, [0.0, 19.1, 26.1, 100.0]),
    (40, [0.0, 20.1, 27.1, 100.0]),
    (50, [0.0, 22.1, 30.1, 100.0]),
    (60, [0.0, 25.1, 32.1, 100.0]),
    (70, [0.0, 26.1, 33.1, 100.0]),
];

/// Place a plot point against its divider scale.
///
/// Directionless: whether a higher band is good depends on the metric.
pub fn relative_descriptor(value: f64, dividers: &[f64; DIVIDER_COUNT]) -> AverageType {
    if value <= dividers[2] {
        AverageType::BelowAverage
    } else if value <= dividers[4] {
        AverageType::Average
    } else {
        AverageType::AboveAverage
    }
}

/// Use the member's own scale when it is complete, otherwise `default`.
pub fn dividers_or_default<'a>(
    dividers: &'a [f64],
    default: &'a [f64; DIVIDER_COUNT],
) -> &'a [f64; DIVIDER_COUNT] {
    <&[f64; DIVIDER_COUNT]>::try_from(dividers).unwrap_or(default)
}

/// Age/gender specific percent-body-fat dividers.
///
/// Ages outside `[0, 70)` have no reference band and yield all zeros.
pub fn body_fat_percent_dividers(age: i32, gender: Gender) -> BodyFatPercentDividers {
    let table = match gender {
        Gender::Male => &MALE_BODY_FAT_DIVIDERS,
        Gender::Female => &FEMALE_BODY_FAT_DIVIDERS,
    };

    if age < 0 {
        return NO_BODY_FAT_DIVIDERS;
    }

    table
        .iter()
        .find(|(upper, _)| age < *upper)
        .map(|(_, dividers)| *dividers)
        .unwrap_or(NO_BODY_FAT_DIVIDERS)
}

pub fn body_fat_percent_indicator(
    percent_body_fat: f64,
    dividers: &BodyFatPercentDividers,
) -> BodyFatPercentIndicator {
    if percent_body_fat == 0.0 || dividers[3] == 0.0 {
        return BodyFatPercentIndicator::NoIndicator;
    }

    if percent_body_fat < dividers[1] {
        BodyFatPercentIndicator::HealthyBodyFat
    } else if percent_body_fat < dividers[2] {
        BodyFatPercentIndicator::GoalSettingFat
    } else {
        BodyFatPercentIndicator::HighBodyFat
    }
}
