//! Filesystem-based object source.
//!
//! Resolves objects under a root directory:
//! ```text
//! {root}/{bucket}/{key}    (preferred)
//! {root}/{key}             (fallback, single-bucket layouts)
//! ```

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{FetchError, ObjectSource, Result};
use crate::event::ObjectRef;

/// Filesystem-based object source.
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn candidates(&self, object: &ObjectRef) -> Result<[PathBuf; 2]> {
        let key = Path::new(&object.key);
        let escapes = key
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || object.bucket.contains(&['/', '\\'][..]) || object.bucket == ".." {
            return Err(FetchError::InvalidKey(object.to_string()));
        }
        Ok([self.root.join(&object.bucket).join(key), self.root.join(key)])
    }
}

#[async_trait]
impl ObjectSource for FilesystemSource {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        for path in self.candidates(object)? {
            match fs::read(&path).await {
                Ok(bytes) => {
                    debug!(path = %path.display(), size = bytes.len(), "Read object from filesystem");
                    return Ok(bytes);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(FetchError::NotFound(object.to_string()))
    }
}
