//! Record-oriented dataset I/O.
//!
//! The corpus is a headered CSV file: rows are records, columns are named
//! text fields. It is read once at pipeline start and written once at the
//! end. The write path serializes the whole dataset into memory first and
//! then swaps it into place via a temp file + rename, so a late failure can
//! never leave a truncated output file. Dataset-level I/O failures are the
//! only fatal errors in the pipeline.

use std::path::Path;

use tracing::{debug, info};

use assetporter_shared::{AssetPorterError, Result};

/// A single content record: one CSV row, parallel to [`Dataset::headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Field values, one per header column.
    pub values: Vec<String>,
}

/// An in-memory corpus: header row plus records in input order.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column names, in file order.
    pub headers: Vec<String>,
    /// Records, in file order.
    pub records: Vec<Record>,
}

impl Dataset {
    /// Read a dataset from a CSV file.
    ///
    /// Ragged rows (field count differing from the header) are a read error,
    /// not a recoverable condition — a malformed corpus must not be migrated
    /// half-blind.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| AssetPorterError::dataset_read(path, e.to_string()))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AssetPorterError::dataset_read(path, e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AssetPorterError::dataset_read(path, format!("row {}: {e}", row + 2))
            })?;
            records.push(Record {
                values: record.iter().map(str::to_string).collect(),
            });
        }

        info!(
            path = %path.display(),
            columns = headers.len(),
            records = records.len(),
            "dataset read"
        );

        Ok(Self { headers, records })
    }

    /// Write the dataset to a CSV file, atomically.
    ///
    /// The full file is built in memory, flushed to a sibling temp file, and
    /// renamed over the target. Quoting-sensitive fields get the standard
    /// doubled-quote escaping.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.headers)
            .map_err(|e| AssetPorterError::dataset_write(path, e.to_string()))?;

        for record in &self.records {
            writer
                .write_record(&record.values)
                .map_err(|e| AssetPorterError::dataset_write(path, e.to_string()))?;
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| AssetPorterError::dataset_write(path, e.to_string()))?;

        let tmp_path = sibling_tmp_path(path);
        std::fs::write(&tmp_path, &buffer)
            .map_err(|e| AssetPorterError::dataset_write(&tmp_path, e.to_string()))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|e| AssetPorterError::dataset_write(path, e.to_string()))?;

        debug!(path = %path.display(), bytes = buffer.len(), "dataset written");
        Ok(())
    }

    /// Index of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Temp file next to the target so the final rename stays on one filesystem.
fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "dataset.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ap-dataset-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn read_simple_dataset() {
        let dir = temp_dir();
        let path = dir.join("posts.csv");
        std::fs::write(&path, "id,title,body\n1,First,hello\n2,Second,world\n").unwrap();

        let dataset = Dataset::read(&path).unwrap();
        assert_eq!(dataset.headers, vec!["id", "title", "body"]);
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[1].values, vec!["2", "Second", "world"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn roundtrip_preserves_quoting_sensitive_fields() {
        let dir = temp_dir();
        let path = dir.join("tricky.csv");

        let dataset = Dataset {
            headers: vec!["id".into(), "body".into()],
            records: vec![Record {
                values: vec![
                    "1".into(),
                    "line one\nline two, with \"quotes\" and ,commas,".into(),
                ],
            }],
        };

        dataset.write(&path).unwrap();
        let reread = Dataset::read(&path).unwrap();
        assert_eq!(reread.records[0], dataset.records[0]);

        // Doubled-quote escaping on disk.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#"""quotes"""#));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn ragged_row_is_a_read_error() {
        let dir = temp_dir();
        let path = dir.join("ragged.csv");
        std::fs::write(&path, "id,title,body\n1,only-two-fields\n").unwrap();

        let err = Dataset::read(&path).unwrap_err();
        assert!(matches!(err, AssetPorterError::DatasetRead { .. }));
        assert!(err.to_string().contains("row 2"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let err = Dataset::read(Path::new("/nonexistent/posts.csv")).unwrap_err();
        assert!(matches!(err, AssetPorterError::DatasetRead { .. }));
    }

    #[test]
    fn write_leaves_no_tmp_file_behind() {
        let dir = temp_dir();
        let path = dir.join("out.csv");

        let dataset = Dataset {
            headers: vec!["id".into()],
            records: vec![Record {
                values: vec!["1".into()],
            }],
        };
        dataset.write(&path).unwrap();

        assert!(path.is_file());
        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_to_missing_directory_fails_without_touching_target() {
        let dataset = Dataset {
            headers: vec!["id".into()],
            records: vec![],
        };
        let target = Path::new("/nonexistent-dir/out.csv");
        let err = dataset.write(target).unwrap_err();
        assert!(matches!(err, AssetPorterError::DatasetWrite { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn column_index_lookup() {
        let dataset = Dataset {
            headers: vec!["id".into(), "cover_image".into(), "body".into()],
            records: vec![],
        };
        assert_eq!(dataset.column_index("cover_image"), Some(1));
        assert_eq!(dataset.column_index("missing"), None);
    }
}
