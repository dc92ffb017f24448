use crate::application::prediction::csv_codec;
use crate::domain::transactions::LabeledDataset;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub const DEFAULT_DATASET_URL: &str =
    "https://drive.google.com/uc?export=download&id=1YH12g1xl4pMTi27PPSncxTpXbJWH8z_a&confirm=t";

/// Labeled training data on disk, fetched once from `url` when absent.
pub struct DatasetSource {
    path: PathBuf,
    url: String,
    timeout: Duration,
}

impl DatasetSource {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Download the dataset unless a cached copy already exists.
    pub async fn ensure_local(&self) -> Result<()> {
        if self.path.exists() {
            info!("Using cached dataset at {:?}", self.path);
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create dataset directory")?;
        }

        info!("Downloading dataset from {}", self.url);
        let client = HttpClientFactory::create_client(self.timeout);
        let mut response = client
            .get(&self.url)
            .send()
            .await
            .context("Dataset request failed")?
            .error_for_status()
            .context("Dataset server returned an error")?;

        // Atomic write: stream to temp file then rename
        let temp_path = self.path.with_extension("part");
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .context("Failed to create temp dataset file")?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.context("Dataset download interrupted")? {
            file.write_all(&chunk)
                .await
                .context("Failed to write dataset")?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to move dataset into place")?;

        info!(bytes = written, "Dataset saved to {:?}", self.path);
        Ok(())
    }

    /// Parse the cached file on the blocking pool.
    pub async fn load(&self) -> Result<LabeledDataset> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_labeled(&path))
            .await
            .context("Dataset loader panicked")?
    }
}

pub fn load_labeled(path: &Path) -> Result<LabeledDataset> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let dataset = csv_codec::parse_labeled(BufReader::new(file))
        .with_context(|| format!("Failed to parse {:?}", path))?;
    info!(
        rows = dataset.len(),
        positives = dataset.positive_count(),
        "Loaded labeled dataset"
    );
    Ok(dataset)
}
