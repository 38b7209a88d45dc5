//! Campaign record persistence.
//!
//! The bot keeps exactly one campaign record: a mapping from aspect name to
//! its current value. The store interface mirrors that contract directly and
//! makes the zero-record and many-record cases explicit errors instead of
//! undefined behavior. Handlers read-modify-write through this interface;
//! nothing here guards against two writers racing on the same record, so a
//! multi-user deployment needs a compare-and-swap at this seam.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single shared mapping of aspect name to current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord(BTreeMap<String, i64>);

impl CampaignRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of an aspect; an aspect never written yet reads as 0.
    pub fn get(&self, aspect: &str) -> i64 {
        self.0.get(aspect).copied().unwrap_or(0)
    }

    pub fn set(&mut self, aspect: impl Into<String>, value: i64) {
        self.0.insert(aspect.into(), value);
    }

    /// Aspect entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Store invariant violations and plumbing failures. Fatal to the current
/// request; never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no campaign record exists in the store")]
    RecordNotFound,
    #[error("expected exactly one campaign record, found {0}")]
    MultipleRecordsFound(usize),
    #[error("store I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("campaign record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The record store as the handlers see it: fetch the one record, put it back.
pub trait CampaignStore {
    /// Fetch the single campaign record.
    ///
    /// # Errors
    /// - [`StoreError::RecordNotFound`] if the store holds no record.
    /// - [`StoreError::MultipleRecordsFound`] if it somehow holds more than one.
    fn fetch_campaign_record(&self) -> Result<CampaignRecord, StoreError>;

    /// Replace the single campaign record.
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the record cannot be written.
    fn put_campaign_record(&self, record: &CampaignRecord) -> Result<(), StoreError>;
}

/// Select the single record from however many the backend returned.
fn single_record(records: &[CampaignRecord]) -> Result<CampaignRecord, StoreError> {
    match records {
        [] => Err(StoreError::RecordNotFound),
        [record] => Ok(record.clone()),
        many => Err(StoreError::MultipleRecordsFound(many.len())),
    }
}

/// File-backed store holding a JSON array of records.
///
/// An array rather than a bare object so that the empty and multi-record
/// invariant violations are representable and surface as the typed errors
/// the handlers expect.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `initial` as the campaign record if no record file exists yet.
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the directory or file cannot be created.
    pub fn ensure_record(&self, initial: &CampaignRecord) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        self.write_records(std::slice::from_ref(initial))?;
        info!("created campaign record at {}", self.path.display());
        Ok(())
    }

    fn read_records(&self) -> Result<Vec<CampaignRecord>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::RecordNotFound);
            },
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_records(&self, records: &[CampaignRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl CampaignStore for JsonFileStore {
    fn fetch_campaign_record(&self) -> Result<CampaignRecord, StoreError> {
        single_record(&self.read_records()?)
    }

    fn put_campaign_record(&self, record: &CampaignRecord) -> Result<(), StoreError> {
        self.write_records(std::slice::from_ref(record))
    }
}

/// In-process store used by tests and local experimentation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CampaignRecord>>,
}

impl MemoryStore {
    /// A store holding no record at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_record(record: CampaignRecord) -> Self {
        Self {
            records: Mutex::new(vec![record]),
        }
    }

    /// A store deliberately violating the one-record invariant.
    pub fn with_records(records: Vec<CampaignRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl CampaignStore for MemoryStore {
    fn fetch_campaign_record(&self) -> Result<CampaignRecord, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        single_record(&records)
    }

    fn put_campaign_record(&self, record: &CampaignRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        *records = vec![record.clone()];
        Ok(())
    }
}
