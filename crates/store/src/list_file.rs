use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use nestbot_core::{ChildRecord, EventRecord};

/// A record type that lives in a JSON array file.
pub trait ListRecord: Serialize + DeserializeOwned {
    /// Decode the whole file.  Override to accept older layouts.
    fn decode_list(raw: &str) -> serde_json::Result<Vec<Self>> {
        serde_json::from_str(raw)
    }
}

impl ListRecord for EventRecord {}

impl ListRecord for ChildRecord {
    /// Also accepts the legacy `{"Name": "YYYY-MM-DD"}` map layout.
    fn decode_list(raw: &str) -> serde_json::Result<Vec<Self>> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum ChildrenFile {
            List(Vec<ChildRecord>),
            Legacy(BTreeMap<String, NaiveDate>),
        }

        Ok(match serde_json::from_str(raw)? {
            ChildrenFile::List(list) => list,
            ChildrenFile::Legacy(map) => map
                .into_iter()
                .map(|(name, birth)| ChildRecord { name, birth })
                .collect(),
        })
    }
}

/// A pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonListFile<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: ListRecord> JsonListFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, or start empty when it is missing or unreadable.
    ///
    /// A file that exists but does not decode is first copied to a `.bak`
    /// sibling so the next save cannot destroy the only copy.
    pub fn load(&self) -> Vec<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %self.path.display(), ?err, "failed to read records; starting empty");
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }

        match T::decode_list(&raw) {
            Ok(records) => {
                info!(path = %self.path.display(), count = records.len(), "records loaded");
                records
            }
            Err(err) => {
                warn!(path = %self.path.display(), ?err, "corrupt records file; starting empty");
                match self.backup() {
                    Ok(bak) => warn!(backup = %bak.display(), "corrupt file preserved"),
                    Err(err) => warn!(?err, "failed to back up corrupt records file"),
                }
                Vec::new()
            }
        }
    }

    /// Atomically replace the file with `records`.
    ///
    /// The content goes to a `.tmp` sibling which is synced and renamed over
    /// the target path, so a crash leaves either the old or the new file.
    pub fn save(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.sibling("tmp");
        let write_result: Result<()> = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            let rendered = serde_json::to_string_pretty(records)?;
            file.write_all(rendered.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            Ok(())
        })();

        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }

    /// Copy the current file to a `.bak` sibling.
    pub fn backup(&self) -> Result<PathBuf> {
        let bak_path = self.sibling("bak");
        fs::copy(&self.path, &bak_path)?;
        Ok(bak_path)
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "records.json".to_string());
        self.path.with_file_name(format!("{filename}.{extension}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let file = JsonListFile::<ChildRecord>::new(dir.path().join("babies.json"));
        assert!(file.load().is_empty());
    }

    #[test]
    fn save_then_load_keeps_records_and_order() {
        let dir = TempDir::new().unwrap();
        let file = JsonListFile::<EventRecord>::new(dir.path().join("nested/events.json"));
        let events = vec![
            EventRecord::new("Утренник", d(2025, 3, 20)),
            EventRecord::new("Прививка", d(2025, 3, 1)),
        ];
        file.save(&events).unwrap();
        assert!(!dir.path().join("nested/events.json.tmp").exists());
        assert_eq!(file.load(), events);
    }

    #[test]
    fn saved_file_is_human_readable_utf8() {
        let dir = TempDir::new().unwrap();
        let file = JsonListFile::<ChildRecord>::new(dir.path().join("babies.json"));
        file.save(&[ChildRecord::new("Маша", d(2024, 3, 15))]).unwrap();
        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"name\": \"Маша\""));
        assert!(raw.contains("\"birth\": \"2024-03-15\""));
    }

    #[test]
    fn legacy_map_layout_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("babies.json");
        fs::write(&path, r#"{"Маша": "2024-03-15", "Аня": "2024-01-01"}"#).unwrap();
        let children = JsonListFile::<ChildRecord>::new(&path).load();
        assert_eq!(
            children,
            vec![
                ChildRecord::new("Аня", d(2024, 1, 1)),
                ChildRecord::new("Маша", d(2024, 3, 15)),
            ]
        );
    }

    #[test]
    fn corrupt_file_loads_empty_and_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "[{\"title\": \"Прививка\", \"date\": \"soon\"}]").unwrap();
        let file = JsonListFile::<EventRecord>::new(&path);
        assert!(file.load().is_empty());
        let bak = dir.path().join("events.json.bak");
        assert!(bak.exists());
        assert!(fs::read_to_string(bak).unwrap().contains("soon"));
    }
}
