//! Filesystem helpers for tool outputs.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Size of a produced file, or [`MediaError::EmptyOutput`] when it is
/// missing or zero bytes.
pub async fn output_size(path: impl AsRef<Path>) -> MediaResult<u64> {
    let path = path.as_ref();
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(MediaError::EmptyOutput(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MediaError::EmptyOutput(path.to_path_buf()))
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Remove a file, treating "already gone" as success.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> MediaResult<()> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Escape a path for a single-quoted concat-demuxer `file` line.
pub fn concat_escape(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_output_size() {
        let temp = TempDir::new().unwrap();
        let full = temp.path().join("clip.mp4");
        let empty = temp.path().join("empty.mp4");
        fs::write(&full, b"data").await.unwrap();
        fs::write(&empty, b"").await.unwrap();

        assert_eq!(output_size(&full).await.unwrap(), 4);
        assert!(matches!(output_size(&empty).await, Err(MediaError::EmptyOutput(_))));
        assert!(matches!(
            output_size(temp.path().join("missing.mp4")).await,
            Err(MediaError::EmptyOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunk.mp3");
        fs::write(&path, b"x").await.unwrap();

        remove_if_exists(&path).await.unwrap();
        assert!(!path.exists());
        remove_if_exists(&path).await.unwrap();
    }

    #[test]
    fn test_concat_escape() {
        assert_eq!(concat_escape(Path::new("/tmp/it's.mp4")), "/tmp/it'\\''s.mp4");
    }
}
