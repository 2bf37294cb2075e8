//! References to the document a session renders

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

const URL_SCHEMES: &[&str] = &["file", "http", "https", "data", "about"];

/// A local file or URL to render.
///
/// Construction only checks syntax. Whether the document is reachable is
/// decided when a session is opened, so an unreachable reference surfaces as
/// a [`Error::RenderInitError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    Path(PathBuf),
    Url(Url),
}

impl DocumentRef {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidJob("empty document reference".into()));
        }

        match Url::parse(input) {
            // Single-letter schemes are Windows drive letters (`C:\icon.html`).
            Ok(url) if url.scheme().len() > 1 => {
                if URL_SCHEMES.contains(&url.scheme()) {
                    Ok(DocumentRef::Url(url))
                } else {
                    Err(Error::InvalidJob(format!(
                        "unsupported URL scheme '{}' in {}",
                        url.scheme(),
                        input
                    )))
                }
            }
            _ => Ok(DocumentRef::Path(PathBuf::from(input))),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        DocumentRef::Path(path.into())
    }

    /// Resolve to the URL handed to the render engine. Local files must exist.
    pub fn locate(&self) -> Result<Url> {
        match self {
            DocumentRef::Path(path) => file_url(path),
            DocumentRef::Url(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::RenderInitError(format!("not a local file URL: {}", url)))?;
                file_url(&path)
            }
            DocumentRef::Url(url) => Ok(url.clone()),
        }
    }
}

fn file_url(path: &Path) -> Result<Url> {
    let absolute = path.canonicalize().map_err(|e| {
        Error::RenderInitError(format!("document {} is not readable: {}", path.display(), e))
    })?;
    if !absolute.is_file() {
        return Err(Error::RenderInitError(format!(
            "document {} is not a file",
            absolute.display()
        )));
    }
    Url::from_file_path(&absolute).map_err(|_| {
        Error::RenderInitError(format!("cannot express {} as a file URL", absolute.display()))
    })
}

impl FromStr for DocumentRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRef::Path(p) => write!(f, "{}", p.display()),
            DocumentRef::Url(u) => write!(f, "{}", u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_paths_and_urls() {
        assert!(matches!(DocumentRef::parse("icon.html").unwrap(), DocumentRef::Path(_)));
        assert!(matches!(
            DocumentRef::parse("http://127.0.0.1:8080/icon").unwrap(),
            DocumentRef::Url(_)
        ));
        assert!(matches!(
            DocumentRef::parse(r"C:\icons\house.html").unwrap(),
            DocumentRef::Path(_)
        ));
        assert!(matches!(DocumentRef::parse("ftp://host/icon.html"), Err(Error::InvalidJob(_))));
        assert!(matches!(DocumentRef::parse("  "), Err(Error::InvalidJob(_))));
    }

    #[test]
    fn locates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("icon.html");
        std::fs::write(&page, "<html></html>").unwrap();

        let url = DocumentRef::from_path(&page).locate().unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/icon.html"));

        let via_url = DocumentRef::parse(url.as_str()).unwrap().locate().unwrap();
        assert_eq!(via_url, url);
    }

    #[test]
    fn missing_file_is_render_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentRef::from_path(dir.path().join("missing.html"))
            .locate()
            .unwrap_err();
        assert!(matches!(err, Error::RenderInitError(_)));

        let err = DocumentRef::from_path(dir.path()).locate().unwrap_err();
        assert!(matches!(err, Error::RenderInitError(_)));
    }

    #[test]
    fn remote_urls_pass_through() {
        let doc = DocumentRef::parse("https://example.com/icon.html").unwrap();
        assert_eq!(doc.locate().unwrap().as_str(), "https://example.com/icon.html");
    }
}
