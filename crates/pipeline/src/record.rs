use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A file discovered during a run.
///
/// Only the path is captured at discovery time. Existence is checked lazily
/// with [`FileRecord::exists`], since anything can happen to a file on a
/// network share between discovery and the stage that acts on it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileRecord {
    path: PathBuf,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// The extension, without the dot. `None` for `report` and `report.`
    /// alike.
    ///
    /// Unlike [`Path::extension`], a name whose only dot is the leading one
    /// has an extension: `.profile` is `profile`.
    pub fn extension(&self) -> Option<&OsStr> {
        let extension = match self.path.extension() {
            Some(extension) => extension,
            None => self.path.file_name()?.to_str()?.strip_prefix('.').map(OsStr::new)?,
        };
        Some(extension).filter(|ext| !ext.is_empty())
    }

    pub fn has_extension(&self) -> bool {
        self.extension().is_some()
    }

    /// Case-insensitive (ASCII) comparison, so `JOB.PS` is as much a
    /// PostScript file as `job.ps`.
    pub fn has_extension_of(&self, extension: &str) -> bool {
        self.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// The path with its extension stripped; siblings differing only in
    /// extension share a stem.
    pub(crate) fn stem(&self) -> PathBuf {
        self.path.with_extension("")
    }

    /// Checks the filesystem right now. Symlinks are followed.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl From<PathBuf> for FileRecord {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for FileRecord {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
