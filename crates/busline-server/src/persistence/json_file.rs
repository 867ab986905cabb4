//! Whole-document JSON file helpers.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use busline_core::TrackerError;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Read a file, returning `None` when it does not exist.
pub async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, TrackerError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(TrackerError::storage(path, err)),
    }
}

/// Serialize `value` as pretty JSON and replace `path` with it.
///
/// The document is written to a sibling `.tmp` file, flushed to disk and then
/// renamed into place, so neither readers nor a crash ever see a half-written
/// snapshot.
pub async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), TrackerError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| TrackerError::storage(path, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| TrackerError::storage(parent, e))?;
    }

    let tmp = temp_path(path);
    if let Err(err) = write_synced(&tmp, &data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(TrackerError::storage(&tmp, err));
    }

    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(TrackerError::storage(path, err));
    }

    Ok(())
}

async fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("busline-json-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let path = scratch_dir().join("absent.json");
        assert!(read_if_exists(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_creates_parents_and_leaves_no_temp_file() {
        let dir = scratch_dir();
        let path = dir.join("nested").join("doc.json");
        let mut doc = BTreeMap::new();
        doc.insert("driver1", "pass123");

        write_pretty(&path, &doc).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"driver1\": \"pass123\"\n}");
        assert!(!temp_path(&path).exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn rewrite_replaces_previous_document() {
        let dir = scratch_dir();
        let path = dir.join("doc.json");

        write_pretty(&path, &vec!["first"]).await.unwrap();
        write_pretty(&path, &vec!["second"]).await.unwrap();

        let stored: Vec<String> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, vec!["second".to_string()]);
        assert!(!temp_path(&path).exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_document() {
        let dir = scratch_dir();
        let path = dir.join("doc.json");
        write_pretty(&path, &vec!["kept"]).await.unwrap();

        std::fs::create_dir_all(temp_path(&path)).unwrap();
        let err = write_pretty(&path, &vec!["lost"]).await.unwrap_err();
        assert!(matches!(err, TrackerError::StorageUnavailable { .. }));

        let stored: Vec<String> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, vec!["kept".to_string()]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("/data/locations.json")),
            PathBuf::from("/data/locations.json.tmp")
        );
    }
}
