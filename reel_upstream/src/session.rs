//! Persistence of the session blob (`session.json`).
//!
//! Written atomically (temp file in the same directory, then rename) so a
//! crash mid-write never leaves a half-written file for the next process
//! to read.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBlob {
    pub token: String,
    pub csrf_token: Option<String>,
}

/// Reads the persisted session blob, if one exists. A missing file is not
/// an error: it simply means mode (a) doesn't apply yet.
pub fn load_session(path: &Path) -> io::Result<Option<SessionBlob>> {
    match fs::read(path) {
        Ok(bytes) => {
            let blob = serde_json::from_slice(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Ok(Some(blob))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes the session blob atomically: a temp file in `path`'s own
/// directory, then an atomic rename over the final path.
pub fn save_session(path: &Path, blob: &SessionBlob) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            NamedTempFile::new_in(dir)?
        }
        None => NamedTempFile::new()?,
    };

    let body = serde_json::to_vec_pretty(blob)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    io::Write::write_all(&mut tmp, &body)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        assert!(load_session(&path).unwrap().is_none());

        let blob = SessionBlob {
            token: "tok-123".to_string(),
            csrf_token: Some("csrf-abc".to_string()),
        };
        save_session(&path, &blob).unwrap();

        let loaded = load_session(&path).unwrap().expect("blob should exist");
        assert_eq!(loaded.token, "tok-123");
        assert_eq!(loaded.csrf_token.as_deref(), Some("csrf-abc"));
    }

    #[test]
    fn overwrite_replaces_previous_blob_atomically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        save_session(
            &path,
            &SessionBlob { token: "first".to_string(), csrf_token: None },
        )
        .unwrap();
        save_session(
            &path,
            &SessionBlob { token: "second".to_string(), csrf_token: None },
        )
        .unwrap();

        let loaded = load_session(&path).unwrap().unwrap();
        assert_eq!(loaded.token, "second");
    }

    #[test]
    fn creates_parent_directory_if_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        save_session(
            &path,
            &SessionBlob { token: "tok".to_string(), csrf_token: None },
        )
        .unwrap();

        assert!(path.exists());
    }
}
