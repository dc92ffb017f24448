use crate::domain::ml::FittedPipeline;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON file holding the fitted pipeline artifact.
pub struct ModelStore {
    file_path: PathBuf,
}

impl ModelStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn load(&self) -> Result<FittedPipeline> {
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read model artifact {:?}", self.file_path))?;
        let pipeline: FittedPipeline =
            serde_json::from_str(&content).context("Failed to parse model artifact JSON")?;

        info!(
            features = pipeline.feature_count(),
            trained_at = %pipeline.trained_at,
            "Loaded model from {:?}",
            self.file_path
        );
        Ok(pipeline)
    }

    pub fn save(&self, pipeline: &FittedPipeline) -> Result<()> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create model directory")?;
        }
        let content = serde_json::to_string(pipeline).context("Failed to serialize model")?;

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp model file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename model file")?;

        info!("Saved model to {:?}", self.file_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{ClassifierKind, PipelineConfig, TransactionClassifier};

    fn pipeline() -> FittedPipeline {
        let config = PipelineConfig {
            classifier: ClassifierKind::Prior,
            ..PipelineConfig::default()
        };
        let rows = vec![vec![Some(1.0)], vec![None], vec![Some(3.0)], vec![Some(0.0)]];
        FittedPipeline::fit(&rows, &[1, 0, 0, 0], &config).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models").join("pipeline.json"));
        let original = pipeline();

        store.save(&original).unwrap();
        assert!(!store.path().with_extension("tmp").exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.preprocessor, original.preprocessor);
        assert_eq!(loaded.predict_proba(&[vec![None]]).unwrap(), vec![0.25]);
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("pipeline.json"));
        fs::write(store.path(), "stale").unwrap();
        store.save(&pipeline()).unwrap();
        assert!(store.load().is_ok());
    }

    #[test]
    fn test_missing_or_corrupt_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_err());

        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }
}
