//! Resolutions, capture entries and ordered capture jobs

use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// A viewport size in CSS pixels. Both dimensions are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Large application icon (512×512)
    pub const ICON_LARGE: Resolution = Resolution { width: 512, height: 512 };
    /// Small application icon (192×192)
    pub const ICON_SMALL: Resolution = Resolution { width: 192, height: 192 };

    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidJob(format!(
                "resolution must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn square(side: u32) -> Result<Self> {
        Self::new(side, side)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WIDTHxHEIGHT`, or a single number for a square.
impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| Error::InvalidJob(format!("invalid resolution '{}'", s)))
        };
        match s.trim().split_once(['x', 'X']) {
            Some((w, h)) => Self::new(parse(w)?, parse(h)?),
            None => Self::square(parse(s)?),
        }
    }
}

/// One step of a capture job: render at `resolution`, write to `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEntry {
    pub resolution: Resolution,
    pub destination: PathBuf,
}

impl CaptureEntry {
    pub fn new(resolution: Resolution, destination: impl Into<PathBuf>) -> Self {
        Self {
            resolution,
            destination: destination.into(),
        }
    }
}

/// Parses `WIDTHxHEIGHT=PATH`.
impl FromStr for CaptureEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (res, path) = s.split_once('=').ok_or_else(|| {
            Error::InvalidJob(format!("expected WIDTHxHEIGHT=PATH, got '{}'", s))
        })?;
        if path.trim().is_empty() {
            return Err(Error::InvalidJob(format!("missing output path in '{}'", s)));
        }
        Ok(Self::new(res.parse()?, path.trim()))
    }
}

/// An ordered, non-empty list of capture entries with distinct destinations.
#[derive(Debug, Clone)]
pub struct CaptureJob {
    entries: Vec<CaptureEntry>,
}

impl CaptureJob {
    pub fn new(entries: Vec<CaptureEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidJob("a capture job needs at least one entry".into()));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(normalize(&entry.destination)) {
                return Err(Error::InvalidJob(format!(
                    "destination {} is used by more than one entry",
                    entry.destination.display()
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The 512×512 and 192×192 icon pair, written as `<prefix>-512.png` and
    /// `<prefix>-192.png` inside `dir`.
    pub fn icon_pair(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        Self::new(
            [Resolution::ICON_LARGE, Resolution::ICON_SMALL]
                .into_iter()
                .map(|r| CaptureEntry::new(r, dir.join(format!("{}-{}.png", prefix, r.width()))))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[CaptureEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptureEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a CaptureJob {
    type Item = &'a CaptureEntry;
    type IntoIter = std::slice::Iter<'a, CaptureEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lexically absolute form of `path`, used only for duplicate detection.
/// Symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolutions() {
        assert_eq!("512x512".parse::<Resolution>().unwrap(), Resolution::ICON_LARGE);
        assert_eq!("192".parse::<Resolution>().unwrap(), Resolution::ICON_SMALL);
        let r: Resolution = "1280X720".parse().unwrap();
        assert_eq!((r.width(), r.height()), (1280, 720));
        assert!("0x10".parse::<Resolution>().is_err());
        assert!("wide".parse::<Resolution>().is_err());
        assert!("10x".parse::<Resolution>().is_err());
    }

    #[test]
    fn parses_entries() {
        let e: CaptureEntry = "48x48=out/favicon.png".parse().unwrap();
        assert_eq!(e.resolution, Resolution::new(48, 48).unwrap());
        assert_eq!(e.destination, PathBuf::from("out/favicon.png"));
        assert!("48x48".parse::<CaptureEntry>().is_err());
        assert!("48x48= ".parse::<CaptureEntry>().is_err());
    }

    #[test]
    fn rejects_duplicate_destinations() {
        let err = CaptureJob::new(vec![
            CaptureEntry::new(Resolution::ICON_LARGE, "public/a.png"),
            CaptureEntry::new(Resolution::ICON_SMALL, "public/./b/../a.png"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidJob(_)));
    }

    #[test]
    fn rejects_empty_job() {
        assert!(matches!(CaptureJob::new(Vec::new()), Err(Error::InvalidJob(_))));
    }

    #[test]
    fn icon_pair_is_largest_first() {
        let job = CaptureJob::icon_pair("public", "icon-v2").unwrap();
        let sizes: Vec<_> = job.iter().map(|e| e.resolution.width()).collect();
        assert_eq!(sizes, vec![512, 192]);
        assert_eq!(job.entries()[1].destination, PathBuf::from("public/icon-v2-192.png"));
    }

    #[test]
    fn resolution_serializes_as_object() {
        let json = serde_json::to_string(&Resolution::ICON_SMALL).unwrap();
        assert_eq!(json, r#"{"width":192,"height":192}"#);
    }
}
