//! Deterministic fixtures for tests and benchmarks.
//!
//! A small logistic model over the credit default schema, with encoder and
//! scaler statistics in the range of the public application data.

use std::collections::BTreeMap;

use risk_core::schema::{BINARY_FEATURES, CATEGORICAL_FEATURES, NUMERICAL_FEATURES};
use risk_core::{FeatureSchema, RawValue, RecordBatch};

use crate::encoder::{LevelCounts, WoeEncoder};
use crate::inference::{ClassifierSpec, LogisticRegression, ModelArtifact};
use crate::preprocessing::Preprocessor;
use crate::scaler::{ColumnStats, StandardScaler};
use crate::service::InferenceService;

/// Name of the fixture model
pub const MODEL_NAME: &str = "credit_default_logreg";

/// Version of the fixture model
pub const MODEL_VERSION: &str = "test-1";

fn coefficient(name: &str) -> f64 {
    match name {
        "EXT_SOURCE_1" | "EXT_SOURCE_2" | "EXT_SOURCE_3" => -0.8,
        "DAYS_BIRTH" => 0.25,
        "DAYS_EMPLOYED" => -0.1,
        "AMT_CREDIT" => 0.15,
        "AMT_GOODS_PRICE" => -0.12,
        "AMT_ANNUITY" => 0.05,
        "REGION_RATING_CLIENT_W_CITY" => 0.2,
        "FLAG_OWN_CAR" => -0.1,
        "FLAG_DOCUMENT_3" => 0.1,
        "REG_CITY_NOT_WORK_CITY" => 0.15,
        name if CATEGORICAL_FEATURES.contains(&name) => 0.9,
        _ => 0.01,
    }
}

/// Logistic model over the default column order
#[must_use]
pub fn model_artifact() -> ModelArtifact {
    let feature_names = FeatureSchema::credit_default().default_order();
    let coefficients = feature_names.iter().map(|n| coefficient(n)).collect();

    ModelArtifact {
        name: MODEL_NAME.to_string(),
        version: MODEL_VERSION.to_string(),
        feature_names,
        classifier: ClassifierSpec::LogisticRegression(LogisticRegression {
            coefficients,
            intercept: -2.2,
        }),
    }
}

fn levels(name: &str) -> Vec<(&'static str, LevelCounts)> {
    match name {
        "NAME_CONTRACT_TYPE" => vec![
            ("Cash loans", LevelCounts::new(2_300, 25_000)),
            ("Revolving loans", LevelCounts::new(140, 2_800)),
        ],
        "CODE_GENDER" => vec![
            ("F", LevelCounts::new(1_400, 19_000)),
            ("M", LevelCounts::new(1_000, 9_000)),
        ],
        "NAME_INCOME_TYPE" => vec![
            ("Working", LevelCounts::new(1_500, 14_000)),
            ("Pensioner", LevelCounts::new(300, 5_200)),
            ("Commercial associate", LevelCounts::new(500, 6_500)),
        ],
        "NAME_EDUCATION_TYPE" => vec![
            ("Secondary / secondary special", LevelCounts::new(2_000, 20_000)),
            ("Higher education", LevelCounts::new(400, 7_400)),
        ],
        "OCCUPATION_TYPE" => vec![
            ("Laborers", LevelCounts::new(600, 5_000)),
            ("Core staff", LevelCounts::new(180, 2_700)),
            ("Accountants", LevelCounts::new(40, 950)),
        ],
        "WEEKDAY_APPR_PROCESS_START" => vec![
            ("MONDAY", LevelCounts::new(400, 4_600)),
            ("TUESDAY", LevelCounts::new(420, 4_900)),
            ("SATURDAY", LevelCounts::new(250, 3_000)),
        ],
        _ => vec![
            ("Unaccompanied", LevelCounts::new(1_800, 20_000)),
            ("Married", LevelCounts::new(1_300, 16_000)),
            ("House / apartment", LevelCounts::new(2_100, 24_000)),
            ("Business Entity Type 3", LevelCounts::new(600, 6_000)),
            ("reg oper account", LevelCounts::new(200, 2_600)),
            ("block of flats", LevelCounts::new(900, 12_000)),
            ("Stone, brick", LevelCounts::new(400, 5_500)),
            ("No", LevelCounts::new(1_100, 14_000)),
        ],
    }
}

/// WOE encoder covering every categorical column
#[must_use]
pub fn encoder() -> WoeEncoder {
    let counts: BTreeMap<String, Vec<(String, LevelCounts)>> = CATEGORICAL_FEATURES
        .iter()
        .map(|name| {
            let levels = levels(name)
                .into_iter()
                .map(|(level, c)| (level.to_string(), c))
                .collect();
            ((*name).to_string(), levels)
        })
        .collect();
    WoeEncoder::from_counts(&counts, 1.0)
}

fn stats(name: &str) -> ColumnStats {
    match name {
        "CNT_CHILDREN" => ColumnStats::new(0.42, 0.72),
        "AMT_INCOME_TOTAL" => ColumnStats::new(168_797.9, 237_123.1),
        "AMT_CREDIT" => ColumnStats::new(599_026.0, 402_490.8),
        "AMT_ANNUITY" => ColumnStats::new(27_108.6, 14_493.7),
        "AMT_GOODS_PRICE" => ColumnStats::new(538_396.2, 369_446.5),
        "REGION_POPULATION_RELATIVE" => ColumnStats::new(0.0209, 0.0138),
        "DAYS_BIRTH" => ColumnStats::new(-16_037.0, 4_363.9),
        "DAYS_EMPLOYED" => ColumnStats::new(63_815.0, 141_275.8),
        "DAYS_REGISTRATION" => ColumnStats::new(-4_986.1, 3_522.9),
        "DAYS_ID_PUBLISH" => ColumnStats::new(-2_994.2, 1_509.5),
        "OWN_CAR_AGE" => ColumnStats::new(12.06, 11.94),
        "CNT_FAM_MEMBERS" => ColumnStats::new(2.15, 0.91),
        "REGION_RATING_CLIENT" | "REGION_RATING_CLIENT_W_CITY" => ColumnStats::new(2.05, 0.51),
        "HOUR_APPR_PROCESS_START" => ColumnStats::new(12.06, 3.27),
        "EXT_SOURCE_1" | "EXT_SOURCE_2" | "EXT_SOURCE_3" => ColumnStats::new(0.5, 0.2),
        "DAYS_LAST_PHONE_CHANGE" => ColumnStats::new(-962.9, 826.8),
        name if name.starts_with("OBS_") || name.starts_with("DEF_") => {
            ColumnStats::new(1.42, 2.4)
        }
        name if name.starts_with("AMT_REQ_CREDIT_BUREAU") => ColumnStats::new(0.3, 0.9),
        _ => ColumnStats::new(0.1, 0.12),
    }
}

/// Scaler covering every numerical column
#[must_use]
pub fn scaler() -> StandardScaler {
    let columns = NUMERICAL_FEATURES
        .iter()
        .map(|name| ((*name).to_string(), stats(name)))
        .collect();
    StandardScaler::new(columns).expect("fixture scaler is valid")
}

/// Preprocessor for the fixture model's column order
#[must_use]
pub fn preprocessor() -> Preprocessor {
    Preprocessor::new(
        &FeatureSchema::credit_default(),
        &model_artifact().feature_names,
        &encoder(),
        &scaler(),
    )
    .expect("fixture artifacts are consistent")
}

/// Service built from the fixtures
#[must_use]
pub fn service() -> InferenceService {
    InferenceService::from_artifacts(
        model_artifact(),
        &encoder(),
        &scaler(),
        &FeatureSchema::credit_default(),
    )
    .expect("fixture artifacts are consistent")
}

/// One applicant, every schema field present
#[must_use]
pub fn sample_row() -> Vec<(&'static str, RawValue)> {
    let mut row: Vec<(&'static str, RawValue)> = vec![
        ("FLAG_OWN_CAR", "N".into()),
        ("FLAG_OWN_REALTY", "Y".into()),
        ("FLAG_MOBIL", RawValue::Int(1)),
        ("FLAG_EMP_PHONE", RawValue::Int(1)),
        ("FLAG_CONT_MOBILE", RawValue::Int(1)),
        ("FLAG_PHONE", RawValue::Int(1)),
    ];
    for name in BINARY_FEATURES {
        if !row.iter().any(|(n, _)| *n == name) {
            row.push((name, RawValue::Int(0)));
        }
    }

    row.extend([
        ("CNT_CHILDREN", RawValue::Int(0)),
        ("AMT_INCOME_TOTAL", RawValue::Float(135_000.0)),
        ("AMT_CREDIT", RawValue::Float(513_000.0)),
        ("AMT_ANNUITY", RawValue::Float(20_000.0)),
        ("AMT_GOODS_PRICE", RawValue::Float(472_500.0)),
        ("REGION_POPULATION_RELATIVE", RawValue::Float(0.018_801)),
        ("DAYS_BIRTH", RawValue::Int(-10_000)),
        ("DAYS_EMPLOYED", RawValue::Int(-1_500)),
        ("DAYS_REGISTRATION", RawValue::Int(-3_000)),
        ("DAYS_ID_PUBLISH", RawValue::Int(-2_000)),
        ("OWN_CAR_AGE", RawValue::Float(5.0)),
        ("CNT_FAM_MEMBERS", RawValue::Int(2)),
        ("REGION_RATING_CLIENT", RawValue::Int(2)),
        ("REGION_RATING_CLIENT_W_CITY", RawValue::Int(2)),
        ("HOUR_APPR_PROCESS_START", RawValue::Int(12)),
        ("EXT_SOURCE_1", RawValue::Float(0.5)),
        ("EXT_SOURCE_2", RawValue::Float(0.5)),
        ("EXT_SOURCE_3", RawValue::Float(0.5)),
        ("OBS_30_CNT_SOCIAL_CIRCLE", RawValue::Int(0)),
        ("DEF_30_CNT_SOCIAL_CIRCLE", RawValue::Int(0)),
        ("OBS_60_CNT_SOCIAL_CIRCLE", RawValue::Int(0)),
        ("DEF_60_CNT_SOCIAL_CIRCLE", RawValue::Int(0)),
        ("DAYS_LAST_PHONE_CHANGE", RawValue::Int(-10)),
        ("AMT_REQ_CREDIT_BUREAU_YEAR", RawValue::Float(1.0)),
    ]);
    for name in NUMERICAL_FEATURES {
        if !row.iter().any(|(n, _)| *n == name) {
            let value = if name.starts_with("AMT_REQ") { 0.0 } else { 0.1 };
            row.push((name, RawValue::Float(value)));
        }
    }

    row.extend([
        ("NAME_CONTRACT_TYPE", "Cash loans".into()),
        ("CODE_GENDER", "F".into()),
        ("NAME_TYPE_SUITE", "Unaccompanied".into()),
        ("NAME_INCOME_TYPE", "Working".into()),
        ("NAME_EDUCATION_TYPE", "Secondary / secondary special".into()),
        ("NAME_FAMILY_STATUS", "Married".into()),
        ("NAME_HOUSING_TYPE", "House / apartment".into()),
        ("OCCUPATION_TYPE", "Laborers".into()),
        ("WEEKDAY_APPR_PROCESS_START", "MONDAY".into()),
        ("ORGANIZATION_TYPE", "Business Entity Type 3".into()),
        ("FONDKAPREMONT_MODE", "reg oper account".into()),
        ("HOUSETYPE_MODE", "block of flats".into()),
        ("WALLSMATERIAL_MODE", "Stone, brick".into()),
        ("EMERGENCYSTATE_MODE", "No".into()),
    ]);
    row
}

/// Single-row batch of [`sample_row`]
#[must_use]
pub fn sample_batch() -> RecordBatch {
    repeated_batch(1)
}

/// [`sample_row`] with some fields replaced
#[must_use]
pub fn sample_batch_with<I>(overrides: I) -> RecordBatch
where
    I: IntoIterator<Item = (&'static str, RawValue)>,
{
    let mut row = sample_row();
    for (name, value) in overrides {
        match row.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => row.push((name, value)),
        }
    }
    batch_of(row, 1)
}

/// `rows` copies of [`sample_row`]
#[must_use]
pub fn repeated_batch(rows: usize) -> RecordBatch {
    batch_of(sample_row(), rows)
}

fn batch_of(row: Vec<(&'static str, RawValue)>, rows: usize) -> RecordBatch {
    let columns = row
        .into_iter()
        .map(|(name, value)| (name, vec![value; rows]));
    RecordBatch::from_columns(columns).expect("fixture batch is rectangular")
}
