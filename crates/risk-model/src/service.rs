//! End-to-end inference: batch in, labelled predictions out.

use std::time::{Duration, Instant};

use risk_core::error::Result;
use risk_core::{FeatureSchema, PredictionResult, RecordBatch};

use crate::artifact::{load_json, ArtifactPaths};
use crate::encoder::WoeEncoder;
use crate::formatter::format_predictions;
use crate::inference::{ModelArtifact, Predictor};
use crate::preprocessing::Preprocessor;
use crate::scaler::StandardScaler;

/// Predictions for a whole batch plus stage timings
#[derive(Debug, Clone)]
pub struct BatchPrediction {
    /// One result per input row, in input order
    pub results: Vec<PredictionResult>,
    /// Time spent preprocessing
    pub preprocess_time: Duration,
    /// Time spent in the model
    pub inference_time: Duration,
}

impl BatchPrediction {
    /// Result of the first row
    #[must_use]
    pub fn first(&self) -> Option<&PredictionResult> {
        self.results.first()
    }
}

/// Loaded preprocessor and predictor, immutable after construction
#[derive(Debug, Clone)]
pub struct InferenceService {
    preprocessor: Preprocessor,
    predictor: Predictor,
}

impl InferenceService {
    /// Load all artifacts from disk, failing if any is missing or inconsistent
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let model: ModelArtifact = load_json(&paths.model)?;
        let encoder: WoeEncoder = load_json(&paths.encoder)?;
        let mut scaler: StandardScaler = load_json(&paths.scaler)?;
        scaler.normalize()?;

        let service = Self::from_artifacts(
            model,
            &encoder,
            &scaler,
            &FeatureSchema::credit_default(),
        )?;

        tracing::info!(
            model = service.model_name(),
            version = service.model_version(),
            features = service.n_features(),
            model_path = %paths.model.display(),
            encoder_path = %paths.encoder.display(),
            scaler_path = %paths.scaler.display(),
            "artifacts loaded"
        );
        Ok(service)
    }

    /// Build a service from in-memory artifacts
    pub fn from_artifacts(
        model: ModelArtifact,
        encoder: &WoeEncoder,
        scaler: &StandardScaler,
        schema: &FeatureSchema,
    ) -> Result<Self> {
        encoder.validate()?;
        let predictor = Predictor::new(model)?;
        let preprocessor =
            Preprocessor::new(schema, predictor.feature_names(), encoder, scaler)?;

        Ok(Self {
            preprocessor,
            predictor,
        })
    }

    /// Preprocess, score and label every row of a batch
    pub fn predict(&self, batch: &RecordBatch) -> Result<BatchPrediction> {
        let start = Instant::now();
        let features = self.preprocessor.transform(batch)?;
        let preprocess_time = start.elapsed();

        let start = Instant::now();
        let probabilities = self.predictor.predict(&features)?;
        let inference_time = start.elapsed();

        let results = format_predictions(&probabilities)?;

        tracing::debug!(
            rows = batch.num_rows(),
            preprocess_us = preprocess_time.as_micros() as u64,
            inference_us = inference_time.as_micros() as u64,
            "batch scored"
        );

        Ok(BatchPrediction {
            results,
            preprocess_time,
            inference_time,
        })
    }

    /// The preprocessing stage
    #[must_use]
    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Model name
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.predictor.name()
    }

    /// Model version
    #[must_use]
    pub fn model_version(&self) -> &str {
        self.predictor.version()
    }

    /// Number of model features
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.predictor.n_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::save_json;
    use crate::testing;
    use risk_core::{Error, RawValue};
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("risk-service-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_artifacts(dir: &std::path::Path) -> ArtifactPaths {
        let paths = ArtifactPaths {
            model: dir.join("model.json"),
            encoder: dir.join("woe_encoder.json"),
            scaler: dir.join("scaler.json"),
        };
        save_json(&testing::model_artifact(), &paths.model).unwrap();
        save_json(&testing::encoder(), &paths.encoder).unwrap();
        save_json(&testing::scaler(), &paths.scaler).unwrap();
        paths
    }

    #[test]
    fn test_load_from_disk() {
        let dir = temp_dir("load");
        let paths = write_artifacts(&dir);

        let service = InferenceService::load(&paths).unwrap();
        assert_eq!(service.n_features(), 120);
        assert_eq!(service.model_name(), testing::MODEL_NAME);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_fails_atomically() {
        let dir = temp_dir("missing");
        let paths = write_artifacts(&dir);
        std::fs::remove_file(&paths.scaler).unwrap();

        let err = InferenceService::load(&paths).unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad { .. }));
        assert!(err.to_string().contains("scaler.json"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_encoder_must_cover_model_columns() {
        let encoder = WoeEncoder::new(Default::default(), 1.0);
        let err = InferenceService::from_artifacts(
            testing::model_artifact(),
            &encoder,
            &testing::scaler(),
            &FeatureSchema::credit_default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no encoder mapping"));
    }

    #[test]
    fn test_predict_sample() {
        let service = testing::service();
        let prediction = service.predict(&testing::sample_batch()).unwrap();

        assert_eq!(prediction.results.len(), 1);
        let first = prediction.first().unwrap();
        assert!((0.0..=1.0).contains(&first.default_probability));
        assert_eq!(
            first.risk_category,
            risk_core::RiskCategory::from_probability(first.default_probability)
        );
    }

    #[test]
    fn test_predict_every_row() {
        let service = testing::service();
        let prediction = service.predict(&testing::repeated_batch(4)).unwrap();
        assert_eq!(prediction.results.len(), 4);
        // identical rows score identically
        assert!(prediction
            .results
            .windows(2)
            .all(|w| w[0].default_probability == w[1].default_probability));
    }

    #[test]
    fn test_predict_is_deterministic() {
        let service = testing::service();
        let batch = testing::sample_batch();
        let a = service.predict(&batch).unwrap();
        let b = service.predict(&batch).unwrap();
        assert_eq!(a.results, b.results);
    }

    #[test]
    fn test_riskier_applicant_scores_higher() {
        let service = testing::service();
        let base = service.predict(&testing::sample_batch()).unwrap();

        let risky = testing::sample_batch_with([
            ("EXT_SOURCE_1", RawValue::Float(0.05)),
            ("EXT_SOURCE_2", RawValue::Float(0.05)),
            ("EXT_SOURCE_3", RawValue::Float(0.05)),
        ]);
        let worse = service.predict(&risky).unwrap();

        assert!(
            worse.results[0].default_probability > base.results[0].default_probability
        );
    }
}
