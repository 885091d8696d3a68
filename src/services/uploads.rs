use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::{info, warn};

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

/// Reduce an uploaded filename to a basename that is safe to join onto the
/// uploads directory. Returns `None` when nothing usable is left.
///
/// ```rust
/// use wishlist::services::uploads::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My cat.jpg").as_deref(), Some("My_cat.jpg"));
/// assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("etc_passwd"));
/// assert_eq!(sanitize_filename("..."), None);
/// ```
#[must_use]
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let ascii: String = filename.chars().filter(char::is_ascii).collect();
    let separated = ascii.replace(['/', '\\'], " ");
    let joined = separated.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extensions accepted for gift images. Uploads are served from this origin,
/// so anything else (html, js, svg) is refused.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[must_use]
pub fn has_image_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Writes gift images into the configured uploads directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to a hidden temporary file next to its final name.
    /// Nothing visible changes until [`StagedUpload::commit`].
    pub async fn stage(&self, filename: &str, bytes: &[u8]) -> Result<StagedUpload> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).await.with_context(|| {
                format!("Failed to create uploads directory {}", self.root.display())
            })?;
        }

        let target = self.root.join(filename);
        let staged = self
            .root
            .join(format!(".{}.part", uuid::Uuid::new_v4()));

        fs::write(&staged, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", staged.display()))?;

        Ok(StagedUpload { staged, target })
    }
}

/// An image written to disk but not yet under its public name.
#[derive(Debug)]
pub struct StagedUpload {
    staged: PathBuf,
    target: PathBuf,
}

impl StagedUpload {
    /// Move the file to its public name. An existing file with that name is
    /// replaced.
    pub async fn commit(self) -> Result<PathBuf> {
        fs::rename(&self.staged, &self.target)
            .await
            .with_context(|| format!("Failed to move image to {}", self.target.display()))?;

        info!(path = %self.target.display(), "Saved uploaded image");
        Ok(self.target)
    }

    pub async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.staged).await {
            warn!(path = %self.staged.display(), error = %e, "Failed to remove staged upload");
        }
    }
}
