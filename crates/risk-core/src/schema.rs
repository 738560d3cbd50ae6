//! Feature schema: which input fields are binary flags, numerics or categoricals.
//!
//! The lists mirror the columns the offline pipeline trained on. The model
//! artifact carries the authoritative column order; this schema only decides
//! how each named column is treated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Y/N (or 0/1) flag fields
pub const BINARY_FEATURES: [&str; 34] = [
    "FLAG_OWN_CAR",
    "FLAG_OWN_REALTY",
    "FLAG_MOBIL",
    "FLAG_EMP_PHONE",
    "FLAG_WORK_PHONE",
    "FLAG_CONT_MOBILE",
    "FLAG_PHONE",
    "FLAG_EMAIL",
    "REG_REGION_NOT_LIVE_REGION",
    "REG_REGION_NOT_WORK_REGION",
    "LIVE_REGION_NOT_WORK_REGION",
    "REG_CITY_NOT_LIVE_CITY",
    "REG_CITY_NOT_WORK_CITY",
    "LIVE_CITY_NOT_WORK_CITY",
    "FLAG_DOCUMENT_2",
    "FLAG_DOCUMENT_3",
    "FLAG_DOCUMENT_4",
    "FLAG_DOCUMENT_5",
    "FLAG_DOCUMENT_6",
    "FLAG_DOCUMENT_7",
    "FLAG_DOCUMENT_8",
    "FLAG_DOCUMENT_9",
    "FLAG_DOCUMENT_10",
    "FLAG_DOCUMENT_11",
    "FLAG_DOCUMENT_12",
    "FLAG_DOCUMENT_13",
    "FLAG_DOCUMENT_14",
    "FLAG_DOCUMENT_15",
    "FLAG_DOCUMENT_16",
    "FLAG_DOCUMENT_17",
    "FLAG_DOCUMENT_18",
    "FLAG_DOCUMENT_19",
    "FLAG_DOCUMENT_20",
    "FLAG_DOCUMENT_21",
];

/// Raw numeric fields, standardized with the fitted scaler
pub const NUMERICAL_FEATURES: [&str; 72] = [
    "CNT_CHILDREN",
    "AMT_INCOME_TOTAL",
    "AMT_CREDIT",
    "AMT_ANNUITY",
    "AMT_GOODS_PRICE",
    "REGION_POPULATION_RELATIVE",
    "DAYS_BIRTH",
    "DAYS_EMPLOYED",
    "DAYS_REGISTRATION",
    "DAYS_ID_PUBLISH",
    "OWN_CAR_AGE",
    "CNT_FAM_MEMBERS",
    "REGION_RATING_CLIENT",
    "REGION_RATING_CLIENT_W_CITY",
    "HOUR_APPR_PROCESS_START",
    "EXT_SOURCE_1",
    "EXT_SOURCE_2",
    "EXT_SOURCE_3",
    "APARTMENTS_AVG",
    "BASEMENTAREA_AVG",
    "YEARS_BEGINEXPLUATATION_AVG",
    "YEARS_BUILD_AVG",
    "COMMONAREA_AVG",
    "ELEVATORS_AVG",
    "ENTRANCES_AVG",
    "FLOORSMAX_AVG",
    "FLOORSMIN_AVG",
    "LANDAREA_AVG",
    "LIVINGAPARTMENTS_AVG",
    "LIVINGAREA_AVG",
    "NONLIVINGAPARTMENTS_AVG",
    "NONLIVINGAREA_AVG",
    "APARTMENTS_MODE",
    "BASEMENTAREA_MODE",
    "YEARS_BEGINEXPLUATATION_MODE",
    "YEARS_BUILD_MODE",
    "COMMONAREA_MODE",
    "ELEVATORS_MODE",
    "ENTRANCES_MODE",
    "FLOORSMAX_MODE",
    "FLOORSMIN_MODE",
    "LANDAREA_MODE",
    "LIVINGAPARTMENTS_MODE",
    "LIVINGAREA_MODE",
    "NONLIVINGAPARTMENTS_MODE",
    "NONLIVINGAREA_MODE",
    "APARTMENTS_MEDI",
    "BASEMENTAREA_MEDI",
    "YEARS_BEGINEXPLUATATION_MEDI",
    "YEARS_BUILD_MEDI",
    "COMMONAREA_MEDI",
    "ELEVATORS_MEDI",
    "ENTRANCES_MEDI",
    "FLOORSMAX_MEDI",
    "FLOORSMIN_MEDI",
    "LANDAREA_MEDI",
    "LIVINGAPARTMENTS_MEDI",
    "LIVINGAREA_MEDI",
    "NONLIVINGAPARTMENTS_MEDI",
    "NONLIVINGAREA_MEDI",
    "TOTALAREA_MODE",
    "OBS_30_CNT_SOCIAL_CIRCLE",
    "DEF_30_CNT_SOCIAL_CIRCLE",
    "OBS_60_CNT_SOCIAL_CIRCLE",
    "DEF_60_CNT_SOCIAL_CIRCLE",
    "DAYS_LAST_PHONE_CHANGE",
    "AMT_REQ_CREDIT_BUREAU_HOUR",
    "AMT_REQ_CREDIT_BUREAU_DAY",
    "AMT_REQ_CREDIT_BUREAU_WEEK",
    "AMT_REQ_CREDIT_BUREAU_MON",
    "AMT_REQ_CREDIT_BUREAU_QRT",
    "AMT_REQ_CREDIT_BUREAU_YEAR",
];

/// Categorical fields, weight-of-evidence encoded
pub const CATEGORICAL_FEATURES: [&str; 14] = [
    "NAME_CONTRACT_TYPE",
    "CODE_GENDER",
    "NAME_TYPE_SUITE",
    "NAME_INCOME_TYPE",
    "NAME_EDUCATION_TYPE",
    "NAME_FAMILY_STATUS",
    "NAME_HOUSING_TYPE",
    "OCCUPATION_TYPE",
    "WEEKDAY_APPR_PROCESS_START",
    "ORGANIZATION_TYPE",
    "FONDKAPREMONT_MODE",
    "HOUSETYPE_MODE",
    "WALLSMATERIAL_MODE",
    "EMERGENCYSTATE_MODE",
];

/// How a named field is turned into a model feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Y/N flag mapped to 0/1
    Binary,
    /// Numeric value standardized with the fitted scaler
    Numerical,
    /// Category level replaced by its weight of evidence
    Categorical,
    /// Not in any group; copied through as a number
    Passthrough,
}

/// Three disjoint, ordered groups of feature names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    binary: Vec<String>,
    numerical: Vec<String>,
    categorical: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::credit_default()
    }
}

impl FeatureSchema {
    /// The schema of the credit default model
    #[must_use]
    pub fn credit_default() -> Self {
        Self {
            binary: owned(&BINARY_FEATURES),
            numerical: owned(&NUMERICAL_FEATURES),
            categorical: owned(&CATEGORICAL_FEATURES),
        }
    }

    /// Build a schema, rejecting names listed more than once
    pub fn new(
        binary: Vec<String>,
        numerical: Vec<String>,
        categorical: Vec<String>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for name in binary.iter().chain(&numerical).chain(&categorical) {
            if !seen.insert(name.as_str()) {
                duplicates.push(name.clone());
            }
        }
        if !duplicates.is_empty() {
            return Err(Error::Schema(format!(
                "fields listed in more than one group: {}",
                duplicates.join(", ")
            )));
        }

        Ok(Self {
            binary,
            numerical,
            categorical,
        })
    }

    /// Treatment for a field
    #[must_use]
    pub fn kind_of(&self, name: &str) -> FeatureKind {
        if self.binary.iter().any(|n| n == name) {
            FeatureKind::Binary
        } else if self.categorical.iter().any(|n| n == name) {
            FeatureKind::Categorical
        } else if self.numerical.iter().any(|n| n == name) {
            FeatureKind::Numerical
        } else {
            FeatureKind::Passthrough
        }
    }

    /// Binary flag names
    #[must_use]
    pub fn binary(&self) -> &[String] {
        &self.binary
    }

    /// Numerical names
    #[must_use]
    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    /// Categorical names
    #[must_use]
    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Binary, then categorical, then numerical
    #[must_use]
    pub fn default_order(&self) -> Vec<String> {
        self.binary
            .iter()
            .chain(&self.categorical)
            .chain(&self.numerical)
            .cloned()
            .collect()
    }

    /// Total number of named features
    #[must_use]
    pub fn len(&self) -> usize {
        self.binary.len() + self.numerical.len() + self.categorical.len()
    }

    /// Whether the schema names no features
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
