use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

const ROWS_ENDPOINT: &str = "https://datasets-server.huggingface.co/rows";
const PAGE_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Corpus not downloaded: {0:?}")]
    NotDownloaded(PathBuf),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed corpus row: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Corpus verification failed for {0:?}")]
    VerificationFailed(PathBuf),
    #[error("Corpus download stopped at {received} of {expected} rows")]
    Truncated { expected: usize, received: usize },
}

/// Where a public corpus lives and how its rows are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusInfo {
    pub dataset: String,
    pub config: String,
    pub split: String,
}

impl CorpusInfo {
    /// The `dair-ai/emotion` training split.
    pub fn reference() -> Self {
        Self {
            dataset: "dair-ai/emotion".to_string(),
            config: "split".to_string(),
            split: "train".to_string(),
        }
    }

    fn cache_name(&self) -> String {
        self.dataset.replace('/', "-")
    }
}

/// One labeled row of the corpus; labels are already class indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRow {
    pub text: String,
    pub label: i64,
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<PageRow>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct PageRow {
    row: CorpusRow,
}

/// Downloads a corpus as JSON Lines into a cache directory and verifies the
/// cached copy against a SHA-256 sidecar before reuse.
#[derive(Clone)]
pub struct CorpusManager {
    cache_dir: PathBuf,
    info: CorpusInfo,
    client: reqwest::Client,
    download_lock: Arc<Mutex<()>>,
}

impl CorpusManager {
    /// Creates a CorpusManager for the reference corpus in the default cache directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_cache_dir(), CorpusInfo::reference())
    }

    /// Returns the default dataset cache directory
    pub fn get_default_cache_dir() -> PathBuf {
        if let Ok(path) = env::var("LIMBIC_CACHE") {
            return PathBuf::from(path).join("datasets");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("limbic").join("datasets");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("limbic").join("datasets");
        }

        env::temp_dir().join("limbic").join("datasets")
    }

    pub fn new<P: AsRef<Path>>(cache_dir: P, info: CorpusInfo) -> io::Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            info,
            client: reqwest::Client::new(),
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn get_corpus_path(&self) -> PathBuf {
        self.cache_dir
            .join(self.info.cache_name())
            .join(format!("{}.jsonl", self.info.split))
    }

    pub fn get_checksum_path(&self) -> PathBuf {
        self.cache_dir
            .join(self.info.cache_name())
            .join(format!("{}.jsonl.sha256", self.info.split))
    }

    pub fn is_corpus_downloaded(&self) -> bool {
        let corpus_path = self.get_corpus_path();
        let checksum_path = self.get_checksum_path();
        log::debug!("Corpus path: {:?} (exists: {})", corpus_path, corpus_path.exists());
        corpus_path.exists() && checksum_path.exists()
    }

    /// True when both files exist and the corpus hashes to the recorded checksum.
    pub fn verify_corpus(&self) -> Result<bool, CorpusError> {
        if !self.is_corpus_downloaded() {
            return Ok(false);
        }
        let expected = fs::read_to_string(self.get_checksum_path())?;
        let actual = sha256_hex(&fs::read(self.get_corpus_path())?);
        log::debug!("Corpus hash: {} (expected {})", actual, expected.trim());
        Ok(actual == expected.trim())
    }

    /// Fetches every row page by page and stores the result.
    pub async fn download_corpus(&self) -> Result<(), CorpusError> {
        let _lock = self.download_lock.lock().await;
        log::info!(
            "Downloading {} ({}/{}) into {:?}",
            self.info.dataset,
            self.info.config,
            self.info.split,
            self.cache_dir
        );

        match self.fetch_rows().await {
            Ok(rows) => {
                self.store_corpus(&rows)?;
                log::info!("Corpus ready: {} rows", rows.len());
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to download corpus: {}", e);
                let _ = self.remove_download();
                Err(e)
            }
        }
    }

    async fn fetch_rows(&self) -> Result<Vec<CorpusRow>, CorpusError> {
        let mut rows = Vec::new();
        let mut total = None;
        while total.map_or(true, |total| rows.len() < total) {
            let page = self.fetch_page(rows.len()).await?;
            let expected = *total.get_or_insert(page.num_rows_total);
            if page.rows.is_empty() {
                return Err(CorpusError::Truncated {
                    expected,
                    received: rows.len(),
                });
            }
            rows.extend(page.rows.into_iter().map(|r| r.row));
            log::debug!("Fetched {}/{} rows", rows.len(), expected);
        }
        Ok(rows)
    }

    async fn fetch_page(&self, offset: usize) -> Result<RowsPage, CorpusError> {
        let offset = offset.to_string();
        let length = PAGE_SIZE.to_string();
        let page = self
            .client
            .get(ROWS_ENDPOINT)
            .query(&[
                ("dataset", self.info.dataset.as_str()),
                ("config", self.info.config.as_str()),
                ("split", self.info.split.as_str()),
                ("offset", offset.as_str()),
                ("length", length.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<RowsPage>()
            .await?;
        Ok(page)
    }

    /// Writes `rows` as JSON Lines plus the checksum sidecar.
    pub fn store_corpus(&self, rows: &[CorpusRow]) -> Result<(), CorpusError> {
        let corpus_path = self.get_corpus_path();
        if let Some(parent) = corpus_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut contents = String::new();
        for row in rows {
            contents.push_str(&serde_json::to_string(row)?);
            contents.push('\n');
        }
        fs::write(&corpus_path, &contents)?;
        fs::write(self.get_checksum_path(), sha256_hex(contents.as_bytes()))?;

        if !self.verify_corpus()? {
            return Err(CorpusError::VerificationFailed(corpus_path));
        }
        Ok(())
    }

    pub fn remove_download(&self) -> Result<(), CorpusError> {
        let corpus_path = self.get_corpus_path();
        let checksum_path = self.get_checksum_path();
        if corpus_path.exists() {
            fs::remove_file(&corpus_path)?;
        }
        if checksum_path.exists() {
            fs::remove_file(&checksum_path)?;
        }
        Ok(())
    }

    /// Downloads the corpus unless a verified copy is already cached.
    pub async fn ensure_corpus_downloaded(&self) -> Result<(), CorpusError> {
        if !self.is_corpus_downloaded() {
            log::info!("Corpus not cached, downloading...");
            self.download_corpus().await?;
        } else if !self.verify_corpus()? {
            log::warn!("Cached corpus failed verification, re-downloading...");
            self.remove_download()?;
            self.download_corpus().await?;
        } else {
            log::info!("Using cached corpus at {:?}", self.get_corpus_path());
        }
        Ok(())
    }

    pub fn read_corpus(&self) -> Result<Vec<CorpusRow>, CorpusError> {
        let path = self.get_corpus_path();
        if !path.exists() {
            return Err(CorpusError::NotDownloaded(path));
        }
        fs::read_to_string(&path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(CorpusError::from))
            .collect()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<CorpusRow> {
        vec![
            CorpusRow {
                text: "i feel lonely".to_string(),
                label: 0,
            },
            CorpusRow {
                text: "what a wonderful day".to_string(),
                label: 1,
            },
        ]
    }

    #[test]
    fn test_store_and_read_corpus() -> Result<(), CorpusError> {
        let dir = tempfile::tempdir()?;
        let manager = CorpusManager::new(dir.path(), CorpusInfo::reference())?;
        assert!(!manager.is_corpus_downloaded());
        assert!(!manager.verify_corpus()?);

        manager.store_corpus(&rows())?;
        assert!(manager
            .get_corpus_path()
            .ends_with("dair-ai-emotion/train.jsonl"));
        assert!(manager.verify_corpus()?);
        assert_eq!(manager.read_corpus()?, rows());
        Ok(())
    }

    #[test]
    fn test_tampered_corpus_fails_verification() -> Result<(), CorpusError> {
        let dir = tempfile::tempdir()?;
        let manager = CorpusManager::new(dir.path(), CorpusInfo::reference())?;
        manager.store_corpus(&rows())?;

        fs::write(manager.get_corpus_path(), "{\"text\":\"x\",\"label\":5}\n")?;
        assert!(!manager.verify_corpus()?);

        manager.remove_download()?;
        assert!(!manager.is_corpus_downloaded());
        assert!(matches!(
            manager.read_corpus(),
            Err(CorpusError::NotDownloaded(_))
        ));
        Ok(())
    }

    #[test]
    fn test_verified_cache_skips_download() -> Result<(), CorpusError> {
        let dir = tempfile::tempdir()?;
        let manager = CorpusManager::new(dir.path(), CorpusInfo::reference())?;
        manager.store_corpus(&rows())?;
        tokio_test::block_on(manager.ensure_corpus_downloaded())?;
        assert_eq!(manager.read_corpus()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_default_cache_dir() {
        env::set_var("LIMBIC_CACHE", "/tmp/limbic-test-cache");
        let path = CorpusManager::get_default_cache_dir();
        assert_eq!(path, PathBuf::from("/tmp/limbic-test-cache/datasets"));
        env::remove_var("LIMBIC_CACHE");

        let path = CorpusManager::get_default_cache_dir();
        assert!(path.ends_with("limbic/datasets"));
    }
}
