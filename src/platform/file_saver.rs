use std::fs;
use std::path::{Path, PathBuf};

use super::FileSaver;
use crate::errors::WebcamError;
use crate::types::RecordedVideo;

/// Saves artifacts into a fixed directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    directory: PathBuf,
}

impl DirectorySaver {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, video: &RecordedVideo, file_name: &str) -> Result<(), WebcamError> {
        // Names come from the host; keep writes inside the directory.
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name == ".."
        {
            return Err(WebcamError::Save(format!(
                "Invalid file name: {:?}",
                file_name
            )));
        }

        fs::create_dir_all(&self.directory).map_err(|e| {
            WebcamError::Save(format!("Failed to create download directory: {}", e))
        })?;

        let path = self.path_for(file_name);
        fs::write(&path, &video.data)
            .map_err(|e| WebcamError::Save(format!("Failed to write {:?}: {}", path, e)))?;

        log::info!(
            "Saved {} bytes ({}) to {:?}",
            video.len(),
            video.mime_type,
            path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;

    fn video(data: &'static [u8]) -> RecordedVideo {
        RecordedVideo {
            data: Bytes::from_static(data),
            mime_type: "video/webm".to_string(),
            chunk_count: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path().join("nested"));

        saver.save(&video(b"abc"), "clip.webm").unwrap();

        let written = fs::read(dir.path().join("nested").join("clip.webm")).unwrap();
        assert_eq!(written, b"abc");
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path());

        let result = saver.save(&video(b"abc"), "../escape.webm");
        assert!(matches!(result, Err(WebcamError::Save(_))));
    }
}
