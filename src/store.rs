use crate::record::SetRecord;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Everything read back from the training log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct History {
    /// Distinct workout names, sorted.
    pub workouts: Vec<String>,
    /// Distinct exercise names, sorted.
    pub exercises: Vec<String>,
    /// All rows in file order.
    pub rows: Vec<SetRecord>,
}

impl History {
    fn from_rows(rows: Vec<SetRecord>) -> Self {
        let workouts: BTreeSet<&str> = rows.iter().map(|r| r.workout_name.as_str()).collect();
        let exercises: BTreeSet<&str> = rows.iter().map(|r| r.exercise_name.as_str()).collect();
        Self {
            workouts: workouts.into_iter().map(str::to_string).collect(),
            exercises: exercises.into_iter().map(str::to_string).collect(),
            rows,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "could not write training log: {e}"),
            StoreError::Csv(e) => write!(f, "could not encode set: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Csv(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e)
    }
}

/// Append-only CSV log of saved sets.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole log.
    ///
    /// A missing or unreadable file yields empty history. Rows that fail to
    /// parse are skipped so one bad line does not hide the rest.
    pub fn load(&self) -> History {
        if !self.path.exists() {
            log::debug!("No training log at {}", self.path.display());
            return History::default();
        }
        let data = match std::fs::read(&self.path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Training log {} unavailable: {e}", self.path.display());
                return History::default();
            }
        };
        let rows = parse_log(data.as_slice());
        log::debug!("Loaded {} sets from {}", rows.len(), self.path.display());
        History::from_rows(rows)
    }

    /// Append one record, writing the header first if the log is new.
    ///
    /// The row is encoded fully in memory and handed to a single write call,
    /// so a failed encode never touches the file.
    pub fn append(&self, record: &SetRecord) -> Result<(), StoreError> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(Vec::new());
        wtr.serialize(record)?;
        let mut bytes = wtr
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;
        if !needs_header && !ends_with_newline(&self.path)? {
            bytes.insert(0, b'\n');
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&bytes)?;
        file.flush()?;
        log::info!(
            "Appended set {} of {} to {}",
            record.set_number,
            record.exercise_name,
            self.path.display()
        );
        Ok(())
    }
}

/// Whether the last byte of an existing, non-empty log is a line break.
fn ends_with_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn parse_log<R: std::io::Read>(reader: R) -> Vec<SetRecord> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<SetRecord>().enumerate() {
        match result {
            Ok(r) => rows.push(r),
            Err(e) if e.is_io_error() => {
                log::warn!("Stopped reading training log: {e}");
                break;
            }
            Err(e) => log::warn!("Skipping unreadable log row {}: {e}", i + 1),
        }
    }
    rows
}
