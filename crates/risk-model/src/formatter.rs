//! Turning class probabilities into labelled predictions.

use ndarray::Array2;
use risk_core::error::{Error, Result};
use risk_core::PredictionResult;

/// Index of the default class in the probability matrix
const POSITIVE_CLASS: usize = 1;

/// One result per row of a `[p(0), p(1)]` probability matrix
pub fn format_predictions(probabilities: &Array2<f64>) -> Result<Vec<PredictionResult>> {
    if probabilities.ncols() <= POSITIVE_CLASS {
        return Err(Error::Prediction(format!(
            "expected two class columns, got {}",
            probabilities.ncols()
        )));
    }

    Ok(probabilities
        .column(POSITIVE_CLASS)
        .iter()
        .map(|&p| PredictionResult::from_probability(p))
        .collect())
}

/// Result for the first row only
pub fn format_prediction(probabilities: &Array2<f64>) -> Result<PredictionResult> {
    format_predictions(probabilities)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Prediction("no rows to format".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use risk_core::RiskCategory;

    #[test]
    fn test_one_result_per_row() {
        let probs = array![[0.9, 0.1], [0.7, 0.3], [0.2, 0.8]];
        let results = format_predictions(&probs).unwrap();

        let categories: Vec<_> = results.iter().map(|r| r.risk_category).collect();
        assert_eq!(
            categories,
            vec![RiskCategory::Low, RiskCategory::Medium, RiskCategory::High]
        );
        assert_eq!(results[2].default_probability, 0.8);
    }

    #[test]
    fn test_first_row() {
        let probs = array![[0.6, 0.4], [0.95, 0.05]];
        let result = format_prediction(&probs).unwrap();
        assert_eq!(result.risk_category, RiskCategory::High);
        assert_eq!(result.default_probability, 0.4);
    }

    #[test]
    fn test_boundaries() {
        let probs = array![[1.0, 0.0], [0.80001, 0.19999], [0.8, 0.2], [0.60001, 0.39999], [0.6, 0.4], [0.0, 1.0]];
        let labels: Vec<String> = format_predictions(&probs)
            .unwrap()
            .iter()
            .map(|r| r.risk_category.to_string())
            .collect();
        assert_eq!(
            labels,
            vec!["Low Risk", "Low Risk", "Medium Risk", "Medium Risk", "High Risk", "High Risk"]
        );
    }

    #[test]
    fn test_bad_shapes() {
        assert!(format_predictions(&array![[0.5]]).is_err());
        assert!(format_prediction(&Array2::zeros((0, 2))).is_err());
    }
}
