use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};
use thiserror::Error;

/// Columns of a stored row, in file order.
pub const COLUMNS: [&str; 4] = ["Date", "Amount", "Category", "Description"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed expense file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub date: String,
    pub amount: String,
    pub category: String,
    pub description: String,
}

impl ExpenseRecord {
    fn fields(&self) -> [&str; 4] {
        [&self.date, &self.amount, &self.category, &self.description]
    }

    fn from_row(row: &StringRecord) -> Self {
        let field = |i: usize| row.get(i).unwrap_or_default().to_owned();
        Self {
            date: field(0),
            amount: field(1),
            category: field(2),
            description: field(3),
        }
    }
}

/// Flat CSV file holding one expense per line, no header.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row. A missing file is a first run and yields no records.
    ///
    /// Rows with the wrong number of fields are kept: missing fields become
    /// empty and extra fields are dropped.
    pub fn load_all(&self) -> Result<Vec<ExpenseRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.path.display(),
                    "no existing expense file found, a new one will be created when you add an expense"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| self.csv_error(e))?;
            if row.len() != COLUMNS.len() {
                tracing::warn!(
                    path = %self.path.display(),
                    line = row.position().map(|p| p.line()).unwrap_or_default(),
                    fields = row.len(),
                    "loading malformed expense row"
                );
            }
            records.push(ExpenseRecord::from_row(&row));
        }

        tracing::debug!(path = %self.path.display(), count = records.len(), "loaded expenses");
        Ok(records)
    }

    /// Adds one row at the end of the file, creating it if needed.
    pub fn append(&self, record: &ExpenseRecord) -> Result<()> {
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        // a hand-edited file may lack the final newline
        if !ends_with_newline(&mut file).map_err(|e| self.io_error(e))? {
            file.write_all(b"\n").map_err(|e| self.io_error(e))?;
        }

        let mut writer = csv_writer(file);
        writer
            .write_record(record.fields())
            .map_err(|e| self.csv_error(e))?;
        writer.flush().map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), date = %record.date, "appended expense");
        Ok(())
    }

    /// Replaces the whole file with `records`.
    ///
    /// Rows go to a sibling temp file first, which is then renamed over the
    /// store, so a failed write leaves the previous contents in place.
    pub fn rewrite_all(&self, records: &[ExpenseRecord]) -> Result<()> {
        self.ensure_parent()?;
        let tmp = self.tmp_path();

        let written = self.write_rows(&tmp, records);
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
            return written;
        }
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "rewrote expenses");
        Ok(())
    }

    fn write_rows(&self, path: &Path, records: &[ExpenseRecord]) -> Result<()> {
        let file = File::create(path).map_err(|e| self.io_error(e))?;
        let mut writer = csv_writer(file);
        for record in records {
            writer
                .write_record(record.fields())
                .map_err(|e| self.csv_error(e))?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| self.io_error(e.into_error()))?;
        file.sync_all().map_err(|e| self.io_error(e))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("expenses.csv"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))
            }
            _ => Ok(()),
        }
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

fn csv_writer(file: File) -> Writer<File> {
    WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file)
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, amount: &str, category: &str, description: &str) -> ExpenseRecord {
        ExpenseRecord {
            date: date.to_owned(),
            amount: amount.to_owned(),
            category: category.to_owned(),
            description: description.to_owned(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("expenses.csv"));

        assert!(store.load_all().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn append_writes_plain_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("expenses.csv"));

        store
            .append(&record("2024-01-01", "12.50", "Food", "Lunch"))
            .unwrap();
        store
            .append(&record("2024-01-01", "40", "Utilities", ""))
            .unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "2024-01-01,12.50,Food,Lunch\n2024-01-01,40,Utilities,\n");
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn append_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("nested/data/expenses.csv"));

        store.append(&record("2024-03-09", "5", "Other", "")).unwrap();

        assert_eq!(store.load_all().unwrap(), vec![record("2024-03-09", "5", "Other", "")]);
    }

    #[test]
    fn append_after_file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        fs::write(&path, "2024-01-01,3,Food,Tea").unwrap();
        let store = RecordStore::new(&path);

        store.append(&record("2024-01-02", "4", "Food", "Cake")).unwrap();

        assert_eq!(
            store.load_all().unwrap(),
            vec![
                record("2024-01-01", "3", "Food", "Tea"),
                record("2024-01-02", "4", "Food", "Cake"),
            ]
        );
    }

    #[test]
    fn delimiters_in_text_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("expenses.csv"));
        let tricky = record("2024-02-02", "9.99", "Food, drinks", "said \"hi\"\nthen left");

        store.append(&tricky).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("2024-02-02,9.99,\"Food, drinks\",\"said \"\"hi\"\""));
        assert_eq!(store.load_all().unwrap(), vec![tricky]);
    }

    #[test]
    fn rewrite_of_loaded_rows_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        let original = "2024-01-01,12.50,Food,Lunch\n\
                        2024-01-02,7,\"Transportation, bus\",\n\
                        2024-01-03,20,Entertainment,\"a \"\"good\"\" film\"\n";
        fs::write(&path, original).unwrap();
        let store = RecordStore::new(&path);

        let loaded = store.load_all().unwrap();
        store.rewrite_all(&loaded).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn rewrite_truncates_to_given_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("expenses.csv"));
        store.append(&record("2024-01-01", "1", "Food", "a")).unwrap();
        store.append(&record("2024-01-01", "2", "Food", "b")).unwrap();

        store.rewrite_all(&[record("2024-01-01", "2", "Food", "b")]).unwrap();
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "2024-01-01,2,Food,b\n"
        );

        store.rewrite_all(&[]).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "");
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn failed_rewrite_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("expenses.csv"));
        store.append(&record("2024-01-01", "1", "Food", "a")).unwrap();
        fs::create_dir(store.tmp_path()).unwrap();

        let err = store.rewrite_all(&[]).unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "2024-01-01,1,Food,a\n"
        );
    }

    #[test]
    fn short_and_long_rows_load_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        fs::write(&path, "2024-01-01,5\n\n2024-01-02,6,Food,Soup,extra\n").unwrap();
        let store = RecordStore::new(&path);

        assert_eq!(
            store.load_all().unwrap(),
            vec![
                record("2024-01-01", "5", "", ""),
                record("2024-01-02", "6", "Food", "Soup"),
            ]
        );
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        assert!(store.load_all().is_err());
        assert!(store.append(&record("2024-01-01", "1", "Food", "")).is_err());
    }
}
