//! Local-save capability: persisting a finished item under its resolved filename.

use crate::config::FileCollisionAction;
use crate::error::Result;
use crate::utils::{MAX_COMPONENT_BYTES, get_unique_path, truncate_filename};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Saves the bytes of one item as a named file on the user's device.
#[async_trait::async_trait]
pub trait SaveSink: Send + Sync {
    /// Save `bytes` as `filename`, returning where the file ended up
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// [`SaveSink`] writing into a download directory
///
/// Data goes to a hidden `.part` file next to the target and is renamed into place
/// once fully written; the partial file is removed on every error path.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    collision: FileCollisionAction,
}

impl DirectorySink {
    /// Create a sink writing into `dir`
    pub fn new(dir: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            dir: dir.into(),
            collision,
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Hidden staging name for `name`, shortened so it fits in one path component.
fn part_file_name(name: &str) -> String {
    let budget = MAX_COMPONENT_BYTES - ".".len() - ".part".len();
    format!(".{}.part", truncate_filename(name, budget))
}

/// Removes the partial file unless the write was committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed
            && let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove partial file");
        }
    }
}

#[async_trait::async_trait]
impl SaveSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = get_unique_path(&self.dir.join(filename), self.collision)?;
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);
        let mut partial = PartialFile {
            path: self.dir.join(part_file_name(name)),
            committed: false,
        };

        let mut file = tokio::fs::File::create(&partial.path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&partial.path, &target).await?;
        partial.committed = true;

        tracing::debug!(path = %target.display(), bytes = bytes.len(), "saved item");
        Ok(target)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn save_writes_file_and_leaves_no_partial() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path().join("out"), FileCollisionAction::Rename);

        let path = sink.save("My Song.mp3", b"ID3data").await.unwrap();

        assert_eq!(path, temp.path().join("out").join("My Song.mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3data");
        assert_eq!(entries(sink.dir()), vec!["My Song.mp3"]);
    }

    #[tokio::test]
    async fn collisions_are_renamed() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path(), FileCollisionAction::Rename);

        let first = sink.save("a.mp3", b"1").await.unwrap();
        let second = sink.save("a.mp3", b"2").await.unwrap();

        assert_eq!(first, temp.path().join("a.mp3"));
        assert_eq!(second, temp.path().join("a (1).mp3"));
        assert_eq!(std::fs::read(&first).unwrap(), b"1");
        assert_eq!(std::fs::read(&second).unwrap(), b"2");
    }

    #[tokio::test]
    async fn skip_policy_fails_and_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path(), FileCollisionAction::Skip);
        sink.save("a.mp3", b"original").await.unwrap();

        let err = sink.save("a.mp3", b"new").await.unwrap_err();

        assert!(matches!(err, Error::FileCollision { .. }));
        assert_eq!(std::fs::read(temp.path().join("a.mp3")).unwrap(), b"original");
        assert_eq!(entries(temp.path()), vec!["a.mp3"]);
    }

    #[tokio::test]
    async fn overwrite_policy_replaces_content() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path(), FileCollisionAction::Overwrite);
        sink.save("a.mp4", b"old").await.unwrap();
        let path = sink.save("a.mp4", b"new").await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"new");
        assert_eq!(entries(temp.path()), vec!["a.mp4"]);
    }

    #[tokio::test]
    async fn name_at_component_limit_is_saved() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path(), FileCollisionAction::Rename);
        let name = format!("{}.mp3", "a".repeat(248));

        let path = sink.save(&name, b"data").await.unwrap();

        assert_eq!(path, temp.path().join(&name));
        assert_eq!(entries(temp.path()), vec![name]);
    }

    #[tokio::test]
    async fn long_multibyte_title_from_header_is_saved() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path(), FileCollisionAction::Rename);
        let header = format!(
            "attachment; filename*=utf-8''{}.mp3",
            urlencoding::encode(&"音".repeat(90))
        );
        let name = crate::utils::resolve_filename(
            Some(&header),
            &crate::types::ItemId::from("a"),
            crate::types::OutputFormat::Audio,
        );

        let first = sink.save(&name, b"1").await.unwrap();
        let second = sink.save(&name, b"2").await.unwrap();

        assert_eq!(std::fs::read(first).unwrap(), b"1");
        assert_eq!(std::fs::read(second).unwrap(), b"2");
        assert_eq!(entries(temp.path()).len(), 2);
    }

    #[test]
    fn part_name_fits_in_one_component() {
        let name = format!("{}.mp4", "b".repeat(251));
        let part = part_file_name(&name);
        assert!(part.len() <= MAX_COMPONENT_BYTES);
        assert!(part.starts_with(".b") && part.ends_with(".mp4.part"));
    }

    #[test]
    fn uncommitted_partial_file_is_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".x.part");
        std::fs::write(&path, b"half").unwrap();

        drop(PartialFile {
            path: path.clone(),
            committed: false,
        });

        assert!(!path.exists());
    }
}
