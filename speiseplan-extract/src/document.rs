use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::error::ExtractError;
use crate::model::PageLayout;
use crate::pdf_reader::read_first_page;

#[derive(Debug)]
enum PageSource {
    Pdf(Box<Document>),
    Layout(PageLayout),
}

/// A weekly menu document held in memory. Only the first page is consulted.
#[derive(Debug)]
pub struct MenuDocument {
    source: PageSource,
    text: Option<String>,
}

impl MenuDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let document = Document::load_mem(bytes)?;
        let text = pdf_extract::extract_text_from_mem(bytes).ok();
        Ok(Self {
            source: PageSource::Pdf(Box::new(document)),
            text,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Wraps an already decoded page, e.g. one produced by another reader.
    #[must_use]
    pub fn from_layout(layout: PageLayout) -> Self {
        Self {
            source: PageSource::Layout(layout),
            text: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn first_page_layout(&self) -> Result<PageLayout, ExtractError> {
        match &self.source {
            PageSource::Pdf(document) => read_first_page(document),
            PageSource::Layout(layout) => Ok(layout.clone()),
        }
    }

    /// Plain document text, when it could be extracted.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Supplies the raw bytes of this week's menu document.
pub trait DocumentSource {
    fn fetch(&self) -> Result<Vec<u8>, ExtractError>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>, ExtractError> {
        let bytes = std::fs::read(&self.path).map_err(|error| {
            ExtractError::UpstreamUnavailable(format!("{}: {error}", self.path.display()))
        })?;
        if bytes.is_empty() {
            return Err(ExtractError::UpstreamUnavailable(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(bytes)
    }
}
