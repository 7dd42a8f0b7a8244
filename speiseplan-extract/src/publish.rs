use std::path::PathBuf;

use tracing::info;

use crate::error::ExtractError;

/// Stores a dish image and returns the stable public URL it can be
/// fetched from.
pub trait ImagePublisher {
    fn publish(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Writes images into a directory that is served under `base_url`.
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    directory: PathBuf,
    base_url: String,
}

impl DirectoryPublisher {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file_name)
    }
}

impl ImagePublisher for DirectoryPublisher {
    fn publish(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(ExtractError::InvalidOption(format!(
                "invalid image file name '{file_name}'"
            )));
        }
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(file_name);
        std::fs::write(&path, bytes)?;
        let url = self.url_for(file_name);
        info!(path = %path.display(), %url, "published dish image");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectoryPublisher, ImagePublisher};
    use crate::error::ExtractError;

    #[test]
    fn writes_file_and_returns_public_url() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let publisher =
            DirectoryPublisher::new(temp.path().join("images"), "https://cdn.example.org/menu/");

        let url = publisher
            .publish("2024-10-17_dish1.png", b"png")
            .expect("publish should succeed");

        assert_eq!(url, "https://cdn.example.org/menu/2024-10-17_dish1.png");
        let written = std::fs::read(temp.path().join("images/2024-10-17_dish1.png"))
            .expect("image should exist");
        assert_eq!(written, b"png");
    }

    #[test]
    fn rejects_nested_file_names() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let publisher = DirectoryPublisher::new(temp.path(), "https://cdn.example.org");
        let error = publisher
            .publish("../escape.png", b"png")
            .expect_err("path separators are rejected");
        assert!(matches!(error, ExtractError::InvalidOption(_)));
    }
}
