//! Directory and file discovery.
//!
//! Walking is breadth-first and never fails as a whole: a directory that
//! cannot be read (permissions, vanished mid-walk, flaky share) simply
//! contributes nothing, and the walk carries on with its siblings.
//! Symbolic links are never followed, so link cycles cannot trap a walk.

use crate::dispatch::fan_out;
use crate::{Context, FileRecord};
use std::collections::{HashSet, VecDeque};
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};

/// How far below a root to look.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Immediate subdirectories only.
    TopLevel,
    /// Every subdirectory at any depth.
    #[default]
    Recursive,
}

enum WalkEntry {
    File(FileRecord),
    Descend(PathBuf),
    Skip,
}

fn log_io_error(err: &io::Error, path: &Path) {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            tracing::debug!(path = %path.display(), error = %err, "Skipping unreadable path");
        },
        _ => tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable path"),
    }
}

fn process_entry(entry: &DirEntry) -> WalkEntry {
    let path = entry.path();
    // `DirEntry::file_type` does not traverse symlinks.
    match entry.file_type() {
        Ok(file_type) if file_type.is_dir() => WalkEntry::Descend(path),
        Ok(file_type) if file_type.is_file() => WalkEntry::File(FileRecord::new(path)),
        Ok(_) => WalkEntry::Skip,
        Err(e) => {
            log_io_error(&e, &path);
            WalkEntry::Skip
        },
    }
}

fn read_entries(dir: &Path) -> Vec<WalkEntry> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log_io_error(&e, dir);
            return Vec::new();
        },
    };
    entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(process_entry(&entry)),
            Err(e) => {
                log_io_error(&e, dir);
                None
            },
        })
        .collect()
}

/// All subdirectories of `root` (not including `root` itself), shallowest
/// first. Unreadable directories are silently pruned.
pub fn subdirectories(root: &Path, traversal: Traversal) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        for entry in read_entries(&dir) {
            if let WalkEntry::Descend(sub) = entry {
                if traversal == Traversal::Recursive {
                    queue.push_back(sub.clone());
                }
                found.push(sub);
            }
        }
    }
    found
}

/// Regular files directly inside `dir`.
pub fn files_in(dir: &Path) -> Vec<FileRecord> {
    read_entries(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            WalkEntry::File(record) => Some(record),
            _ => None,
        })
        .collect()
}

/// The Directory Set: every root that exists, plus all of its
/// subdirectories. One blocking walk per root, merged in root order and
/// de-duplicated for nested or repeated roots.
pub async fn directory_set(roots: &[PathBuf], ctx: &Context) -> Vec<PathBuf> {
    let jobs = roots.iter().cloned().map(|root| {
        move || {
            if !root.is_dir() {
                tracing::warn!(root = %root.display(), "Archive root is missing or not a directory");
                return Vec::new();
            }
            let mut dirs = subdirectories(&root, Traversal::Recursive);
            dirs.insert(0, root);
            dirs
        }
    });
    let mut seen = HashSet::new();
    fan_out(ctx.concurrency, jobs)
        .await
        .into_iter()
        .flatten()
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

/// Every regular file in `directories`, listed in batches.
pub async fn list_files(directories: &[PathBuf], ctx: &Context) -> Vec<FileRecord> {
    let jobs = directories.chunks(ctx.batch_size.max(1)).map(<[PathBuf]>::to_vec).map(|batch| {
        move || batch.iter().flat_map(|dir| files_in(dir)).collect::<Vec<_>>()
    });
    fan_out(ctx.concurrency, jobs).await.into_iter().flatten().collect()
}
