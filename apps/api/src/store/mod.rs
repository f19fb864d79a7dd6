//! Application store: optional on-disk copies of generated letters.
//!
//! ## Layout
//!
//! ```text
//! {output_dir}/
//! ├── {application_id}_cover_letter.txt
//! └── {application_id}_metadata.json    # ApplicationRecord, no applicant data
//! ```
//!
//! Writes go to a temp file first and are renamed into place, so readers
//! never see a partial letter.

pub mod handlers;

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ApplicationRecord;

const LETTER_SUFFIX: &str = "_cover_letter.txt";
const METADATA_SUFFIX: &str = "_metadata.json";

#[derive(Debug, Clone)]
pub struct ApplicationStore {
    root: PathBuf,
}

impl ApplicationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn letter_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}{LETTER_SUFFIX}"))
    }

    fn metadata_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}{METADATA_SUFFIX}"))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Stores the letter and its metadata under `record.application_id`.
    pub async fn save(&self, record: &ApplicationRecord, letter: &str) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let id = record.application_id;
        self.write_atomic(&self.letter_path(id), letter.as_bytes())
            .await?;
        let metadata = serde_json::to_vec_pretty(record).map_err(anyhow::Error::from)?;
        self.write_atomic(&self.metadata_path(id), &metadata).await?;

        debug!("Stored application {id} in {}", self.root.display());
        Ok(())
    }

    /// All stored applications, newest first. Unreadable metadata files are
    /// skipped with a warning.
    pub async fn list(&self) -> Result<Vec<ApplicationRecord>, AppError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(METADATA_SUFFIX) {
                continue;
            }
            let bytes = tokio::fs::read(entry.path()).await?;
            match serde_json::from_slice::<ApplicationRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable metadata {:?}: {e}", name),
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Letter text for `raw_id`. The id must be a UUID, which also keeps
    /// callers from reaching outside the output directory.
    pub async fn load_letter(&self, raw_id: &str) -> Result<String, AppError> {
        let id = parse_id(raw_id)?;
        match tokio::fs::read_to_string(self.letter_path(id)).await {
            Ok(letter) => Ok(letter),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Application {id} not found")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the letter and metadata for `raw_id`.
    pub async fn delete(&self, raw_id: &str) -> Result<(), AppError> {
        let id = parse_id(raw_id)?;
        let mut removed = false;
        for path in [self.letter_path(id), self.metadata_path(id)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if removed {
            debug!("Deleted application {id}");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Application {id} not found")))
        }
    }
}

fn parse_id(raw_id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw_id.trim())
        .map_err(|_| AppError::invalid("application_id", "must be a UUID"))
}
