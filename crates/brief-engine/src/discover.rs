use std::io;
use std::path::{Component, Path, PathBuf};

use brief_core::records::FileRecord;
use brief_core::taxonomy::{classify, ClassifiedError};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::filter::PathFilter;

/// Counters gathered during one discovery walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Directories whose entries were listed.
    pub dirs_listed: usize,
    /// Skip-listed directories that were never opened.
    pub dirs_pruned: usize,
    pub files_ignored: usize,
    /// Classified listing failures: subdirectories that contributed nothing
    /// and single entries that could not be read.
    pub unreadable: Vec<ClassifiedError>,
}

impl DiscoveryStats {
    /// Classify a listing failure, log it, and keep it.
    fn record_unreadable(&mut self, path: &Path, error: &io::Error, what: &str) {
        let classified = classify(error).with_context("path", path.display().to_string());
        warn!(
            path = %path.display(),
            code = %classified.code,
            error = %classified.message,
            "skipping unreadable {what}"
        );
        self.unreadable.push(classified);
    }
}

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Other,
}

/// Depth-first walk of a scan root yielding eligible files.
#[derive(Debug, Clone)]
pub struct Discoverer {
    filter: PathFilter,
}

impl Discoverer {
    pub fn new(filter: PathFilter) -> Self {
        Self { filter }
    }

    pub async fn discover(&self, root: &Path) -> Result<Vec<FileRecord>, EngineError> {
        self.discover_with_stats(root).await.map(|(records, _)| records)
    }

    /// Walk `root`. Entries of each directory are visited in name order.
    /// Failing to list the root itself is an error; failing to list any
    /// subdirectory only drops that subtree.
    pub async fn discover_with_stats(
        &self,
        root: &Path,
    ) -> Result<(Vec<FileRecord>, DiscoveryStats), EngineError> {
        let mut stats = DiscoveryStats::default();
        let mut records = Vec::new();

        let top = list_dir(root, &mut stats).await.map_err(|source| EngineError::ScanRoot {
            path: root.to_path_buf(),
            source,
        })?;
        stats.dirs_listed += 1;
        let mut stack = vec![top.into_iter()];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.next(),
                None => break,
            };
            let Some(entry) = next else {
                stack.pop();
                continue;
            };

            match entry.kind {
                EntryKind::Dir => {
                    if self.filter.should_skip_directory(&entry.name) {
                        debug!(path = %entry.path.display(), "pruning skip-listed directory");
                        stats.dirs_pruned += 1;
                        continue;
                    }
                    match list_dir(&entry.path, &mut stats).await {
                        Ok(children) => {
                            stats.dirs_listed += 1;
                            stack.push(children.into_iter());
                        }
                        Err(e) => stats.record_unreadable(&entry.path, &e, "directory"),
                    }
                }
                EntryKind::File => {
                    let Some(relative) = relative_path(root, &entry.path) else {
                        continue;
                    };
                    if self.filter.is_ignored(&relative) {
                        stats.files_ignored += 1;
                        continue;
                    }
                    records.push(FileRecord::new(entry.path, relative));
                }
                EntryKind::Other => {}
            }
        }

        debug!(
            files = records.len(),
            dirs_listed = stats.dirs_listed,
            dirs_pruned = stats.dirs_pruned,
            unreadable = stats.unreadable.len(),
            files_ignored = stats.files_ignored,
            "discovery complete"
        );
        Ok((records, stats))
    }
}

/// Read one directory, sorted by name. Opening `dir` is the only fatal
/// step; an entry that cannot be read is recorded and the rest are kept.
async fn list_dir(dir: &Path, stats: &mut DiscoveryStats) -> io::Result<Vec<Entry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    loop {
        let dirent = match reader.next_entry().await {
            Ok(Some(dirent)) => dirent,
            Ok(None) => break,
            Err(e) => {
                // the iterator cannot resume after an error
                stats.record_unreadable(dir, &e, "directory entry");
                break;
            }
        };
        let path = dirent.path();
        let file_type = dirent.file_type().await;
        if let Err(e) = &file_type {
            stats.record_unreadable(&path, e, "directory entry");
        }
        let kind = entry_kind(&path, file_type).await;
        entries.push(Entry {
            name: dirent.file_name().to_string_lossy().into_owned(),
            path,
            kind,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Symlinks are resolved; a link to a directory is not followed to keep
/// the walk free of cycles. An unknown type is `Other`.
async fn entry_kind(path: &Path, file_type: io::Result<std::fs::FileType>) -> EntryKind {
    let Ok(file_type) = file_type else {
        return EntryKind::Other;
    };
    if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_symlink() {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => EntryKind::File,
            _ => EntryKind::Other,
        }
    } else {
        EntryKind::Other
    }
}

/// `/`-separated path of `path` below `root`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::taxonomy::ErrorCode;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    fn rel_paths(records: &[FileRecord]) -> Vec<&str> {
        records.iter().map(|r| r.relative_path.as_str()).collect()
    }

    #[tokio::test]
    async fn walks_depth_first_in_name_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.js");
        touch(dir.path(), "a/z.py");
        touch(dir.path(), "a/inner/m.rs");
        touch(dir.path(), "c.go");

        let records = Discoverer::new(PathFilter::empty())
            .discover(dir.path())
            .await
            .unwrap();
        assert_eq!(rel_paths(&records), vec!["a/inner/m.rs", "a/z.py", "b.js", "c.go"]);
        assert_eq!(records[0].absolute_path, dir.path().join("a/inner/m.rs"));
    }

    #[tokio::test]
    async fn ignore_file_excludes_matches() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "ignored.js").unwrap();
        touch(dir.path(), "index.js");
        touch(dir.path(), "ignored.js");

        let discoverer = Discoverer::new(PathFilter::load(dir.path(), ".gitignore"));
        let (records, stats) = discoverer.discover_with_stats(dir.path()).await.unwrap();
        assert_eq!(rel_paths(&records), vec!["index.js"]);
        assert_eq!(stats.files_ignored, 2);
    }

    #[tokio::test]
    async fn skip_listed_directories_are_pruned() {
        async fn listed_with(n: usize) -> DiscoveryStats {
            let dir = TempDir::new().unwrap();
            touch(dir.path(), "main.js");
            for i in 0..n {
                touch(dir.path(), &format!("node_modules/pkg{i}/index.js"));
            }
            let (records, stats) = Discoverer::new(PathFilter::empty())
                .discover_with_stats(dir.path())
                .await
                .unwrap();
            assert_eq!(rel_paths(&records), vec!["main.js"]);
            stats
        }

        let small = listed_with(1).await;
        let large = listed_with(40).await;
        assert_eq!(small.dirs_listed, 1);
        assert_eq!(small.dirs_listed, large.dirs_listed);
        assert_eq!(large.dirs_pruned, 1);
    }

    #[tokio::test]
    async fn unreadable_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let err = Discoverer::new(PathFilter::empty())
            .discover(&missing)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ScanRoot { .. }));
    }

    #[tokio::test]
    async fn file_as_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "single.js");
        let err = Discoverer::new(PathFilter::empty())
            .discover(&dir.path().join("single.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ScanRoot { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_subtree_contributes_nothing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "ok.js");
        touch(dir.path(), "locked/secret.js");
        let locked = dir.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory.
        let readable = std::fs::read_dir(&locked).is_ok();

        let (records, stats) = Discoverer::new(PathFilter::empty())
            .discover_with_stats(dir.path())
            .await
            .unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            assert_eq!(records.len(), 2);
            assert!(stats.unreadable.is_empty());
        } else {
            assert_eq!(rel_paths(&records), vec!["ok.js"]);
            assert_eq!(stats.unreadable.len(), 1);
            let failure = &stats.unreadable[0];
            assert_eq!(failure.code, ErrorCode::FileSystemError);
            assert_eq!(failure.context_value("kind"), Some("PermissionDenied"));
            assert_eq!(
                failure.context_value("path"),
                Some(locked.display().to_string().as_str())
            );
        }
    }

    #[test]
    fn listing_failures_are_classified() {
        let mut stats = DiscoveryStats::default();
        let error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        stats.record_unreadable(Path::new("/scan/locked"), &error, "directory");

        assert_eq!(stats.unreadable.len(), 1);
        let failure = &stats.unreadable[0];
        assert_eq!(failure.code, ErrorCode::FileSystemError);
        assert!(failure.message.starts_with("permission denied"));
        assert_eq!(failure.context_value("path"), Some("/scan/locked"));
        assert_eq!(failure.context_value("kind"), Some("PermissionDenied"));
    }

    #[tokio::test]
    async fn unreadable_entry_type_is_other() {
        let error = io::Error::other("stat failed");
        assert_eq!(entry_kind(Path::new("/scan/x"), Err(error)).await, EntryKind::Other);
    }

    #[tokio::test]
    async fn entry_kinds_from_file_types() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.rs");
        touch(dir.path(), "sub/b.rs");

        let file = dir.path().join("a.rs");
        let file_type = std::fs::symlink_metadata(&file).map(|m| m.file_type());
        assert_eq!(entry_kind(&file, file_type).await, EntryKind::File);

        let sub = dir.path().join("sub");
        let file_type = std::fs::symlink_metadata(&sub).map(|m| m.file_type());
        assert_eq!(entry_kind(&sub, file_type).await, EntryKind::Dir);
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/scan");
        assert_eq!(
            relative_path(root, Path::new("/scan/a/b.rs")).as_deref(),
            Some("a/b.rs")
        );
        assert_eq!(relative_path(root, Path::new("/elsewhere/x")), None);
        assert_eq!(relative_path(root, root), None);
    }
}
