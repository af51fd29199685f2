//! Append-only image store backing the `/static` URL space.
//!
//! Files are written once and never updated or deleted; there is no eviction,
//! so the directory grows without bound.

use crate::Result;
use image::{ImageFormat, RgbImage};
use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StaticStore {
    dir: PathBuf,
}

/// A persisted image and the relative URL it is served under.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
    /// Millisecond timestamp actually used in the filename. May differ from
    /// the requested one if a collision forced a bump.
    pub timestamp: i64,
}

impl StaticStore {
    /// Opens the store, creating the directory if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timestamp_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Writes `{prefix}_{timestamp}.jpg`. Two requests landing on the same
    /// millisecond must not silently overwrite each other, so the write uses
    /// create-new semantics and bumps the timestamp until it finds a free name.
    pub fn save_jpeg(&self, prefix: &str, timestamp: i64, image: &RgbImage) -> Result<StoredImage> {
        let mut ts = timestamp;
        loop {
            let filename = format!("{}_{}.jpg", prefix, ts);
            let path = self.dir.join(&filename);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    let mut writer = BufWriter::new(file);
                    image.write_to(&mut writer, ImageFormat::Jpeg)?;
                    tracing::info!("Saved image: {}", path.display());
                    return Ok(StoredImage {
                        url: format!("/static/{}", filename),
                        filename,
                        timestamp: ts,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    ts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
