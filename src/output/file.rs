//! File storage for generated images and their metadata

use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::output::{ArtifactMetadata, PersistedArtifact};
use crate::provider::ImageSize;

/// Timestamp embedded in artifact names
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension used when the payload's format is not recognised
const FALLBACK_EXTENSION: &str = "jpg";

/// Upper bound on `_n` suffixes tried for one stem
const MAX_SUFFIX: u32 = 10_000;

/// Writer for image artifacts in the output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    save_metadata: bool,
}

impl ArtifactWriter {
    /// Create a new writer
    pub fn new(output_dir: impl Into<PathBuf>, save_metadata: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            save_metadata,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Ensure the output directory exists
    pub async fn ensure_output_dir(&self) -> Result<()> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).await?;
            debug!(path = ?self.output_dir, "Created output directory");
        }
        Ok(())
    }

    /// Persist image bytes (and metadata, if enabled) for a successful generation
    pub async fn persist(
        &self,
        provider: &str,
        prompt: &str,
        size: ImageSize,
        data: &[u8],
    ) -> Result<PersistedArtifact> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.persist_at(provider, prompt, size, data, &timestamp)
            .await
    }

    async fn persist_at(
        &self,
        provider: &str,
        prompt: &str,
        size: ImageSize,
        data: &[u8],
        timestamp: &str,
    ) -> Result<PersistedArtifact> {
        self.ensure_output_dir().await?;

        let extension = detect_image_format(data).unwrap_or(FALLBACK_EXTENSION);
        let stem = format!("{}_{}", provider, timestamp);
        let Reservation {
            image_path,
            image,
            metadata,
        } = self.reserve(&stem, extension).await?;
        let metadata_path = metadata.as_ref().map(|(path, _)| path.clone());
        let mut artifact = vec![image_path.as_path()];
        artifact.extend(metadata_path.as_deref());

        write_or_discard(image, data, &artifact).await?;

        let filename = file_name(&image_path);
        debug!(path = ?image_path, size = data.len(), "Saved image file");

        if let Some((path, file)) = metadata {
            let record = ArtifactMetadata {
                prompt: prompt.to_string(),
                provider: provider.to_string(),
                timestamp: timestamp.to_string(),
                size: size.to_string(),
                filename: filename.clone(),
            };
            let bytes = match serde_json::to_vec_pretty(&record) {
                Ok(bytes) => bytes,
                Err(e) => {
                    discard(&artifact).await;
                    return Err(e.into());
                }
            };
            write_or_discard(file, &bytes, &artifact).await?;
            debug!(path = ?path, "Saved metadata file");
        }

        Ok(PersistedArtifact {
            image_path,
            metadata_path,
            filename,
            timestamp: timestamp.to_string(),
        })
    }

    /// Claim a free stem for the image and, if enabled, its metadata file.
    ///
    /// `stem.ext` is tried first, then `stem_N.ext`. A stem is only taken when
    /// every file it needs can be created fresh, so an existing image or
    /// metadata record is never reused or truncated.
    async fn reserve(&self, stem: &str, extension: &str) -> Result<Reservation> {
        for n in 0..MAX_SUFFIX {
            let base = if n == 0 {
                stem.to_string()
            } else {
                format!("{}_{}", stem, n)
            };

            let metadata = if self.save_metadata {
                let path = self.output_dir.join(format!("{}.json", base));
                match create_new(&path).await? {
                    Some(file) => Some((path, file)),
                    None => continue,
                }
            } else {
                None
            };

            let image_path = self.output_dir.join(format!("{}.{}", base, extension));
            let image = match create_new(&image_path).await {
                Ok(Some(file)) => file,
                outcome => {
                    if let Some((path, file)) = metadata {
                        drop(file);
                        discard(&[path.as_path()]).await;
                    }
                    match outcome {
                        Ok(_) => continue,
                        Err(e) => return Err(e),
                    }
                }
            };

            return Ok(Reservation {
                image_path,
                image,
                metadata,
            });
        }

        Err(AppError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for '{}'", stem),
        )))
    }

    /// Read every metadata record in the output directory, sorted by file name
    pub async fn list_metadata(&self) -> Result<Vec<ArtifactMetadata>> {
        let mut records = Vec::new();

        if !self.output_dir.exists() {
            return Ok(records);
        }

        let mut entries = fs::read_dir(&self.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let raw = fs::read(&path).await?;
            match serde_json::from_slice::<ArtifactMetadata>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = ?path, error = %e, "Skipping unreadable metadata"),
            }
        }

        records.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(records)
    }
}

/// Freshly created files backing one artifact
struct Reservation {
    image_path: PathBuf,
    image: fs::File,
    metadata: Option<(PathBuf, fs::File)>,
}

/// Create `path` only if nothing exists there yet; `None` when it is taken
async fn create_new(path: &Path) -> Result<Option<fs::File>> {
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Remove the files of an artifact that could not be completed
async fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            warn!(path = ?path, error = %e, "Failed to remove partial artifact");
        }
    }
}

/// Write `data` and close the file, discarding the whole artifact on failure
async fn write_or_discard(mut file: fs::File, data: &[u8], artifact: &[&Path]) -> Result<()> {
    let written = write_all(&mut file, data).await;
    drop(file);
    if written.is_err() {
        discard(artifact).await;
    }
    written
}

async fn write_all(file: &mut fs::File, data: &[u8]) -> Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Detect image format from binary data using magic bytes
fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Some("bmp");
    }

    None
}
