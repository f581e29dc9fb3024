//! Placeholder / Data Consumer (spec.md §4.6, component C6): loads the data
//! row CSV, hands each Session exactly one row for the duration of its run,
//! and expands `%Name%` tokens against it.
//!
//! Row assignment is two-phase so concurrent Sessions (C8) never race for
//! the same row: [`DataConsumer::reserve`] claims a row in memory only;
//! [`DataConsumer::commit`] marks it used and persists; [`DataConsumer::release`]
//! returns it to the pool without touching disk. This is stricter than
//! §4.6's prose ("on success persist, on failure leave available") requires
//! of the on-disk state, but it is the only way to satisfy that prose when
//! more than one Session is consuming the same file at once.

mod dataset;
mod error;
mod placeholder;
mod row;

pub use error::{DataConsumerError, UnknownPlaceholder};
pub use placeholder::expand;
pub use row::DataRow;

use std::path::PathBuf;

use parking_lot::Mutex;
use runner_core_types::RowPreference;

use dataset::Dataset;

struct Inner {
    path: PathBuf,
    dataset: Dataset,
    /// Indices currently held by an in-flight Session, not yet committed or
    /// released.
    reserved: Vec<usize>,
}

pub struct DataConsumer {
    inner: Mutex<Inner>,
}

/// A row claimed for the duration of one Session. Holds a snapshot of the
/// row's fields so placeholder expansion never needs to re-lock the
/// consumer mid-step.
#[derive(Clone, Debug)]
pub struct ReservedRow {
    index: usize,
    row: DataRow,
}

impl ReservedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.row.get(column)
    }

    pub fn scenario(&self) -> runner_core_types::Scenario {
        self.row.scenario
    }
}

impl DataConsumer {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DataConsumerError> {
        let path = path.into();
        let dataset = Dataset::load(&path)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                path,
                dataset,
                reserved: Vec::new(),
            }),
        })
    }

    pub fn open_default() -> Result<Self, DataConsumerError> {
        Self::open(dataset::default_path())
    }

    pub fn in_memory(rows: Vec<DataRow>, columns: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                path: PathBuf::new(),
                dataset: Dataset { columns, rows },
                reserved: Vec::new(),
            }),
        }
    }

    /// Claim the first row, in file order, whose `used` flag is unset and
    /// whose scenario satisfies `preference` (§4.6, "Selection is
    /// deterministic"). Rows already reserved by another in-flight Session
    /// are skipped even though they are not yet `used` on disk. Returns
    /// `None` if no such row exists — the caller reports `NoDataAvailable`.
    pub fn reserve(&self, preference: RowPreference) -> Option<ReservedRow> {
        let mut inner = self.inner.lock();
        let index = inner.dataset.rows.iter().enumerate().find_map(|(i, row)| {
            let available = !row.used && !inner.reserved.contains(&i) && preference.accepts(row.scenario);
            available.then_some(i)
        })?;
        inner.reserved.push(index);
        let row = inner.dataset.rows[index].clone();
        Some(ReservedRow { index, row })
    }

    /// Session succeeded: mark the row used and persist (§4.6).
    pub fn commit(&self, reserved: &ReservedRow) -> Result<(), DataConsumerError> {
        let mut inner = self.inner.lock();
        inner.reserved.retain(|&i| i != reserved.index);
        if let Some(row) = inner.dataset.rows.get_mut(reserved.index) {
            row.used = true;
        }
        let path = inner.path.clone();
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        inner.dataset.persist(&path)
    }

    /// Session failed: the row stays available for a future run, nothing is
    /// written to disk (§4.6).
    pub fn release(&self, reserved: &ReservedRow) {
        let mut inner = self.inner.lock();
        inner.reserved.retain(|&i| i != reserved.index);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().dataset.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> PathBuf {
        self.inner.lock().path.clone()
    }
}

/// Expand every `%Name%` token in `target`/`value` against a reserved row,
/// per §4.6's "Expansion" paragraph.
pub fn expand_step_strings(
    reserved: &ReservedRow,
    target: Option<&str>,
    value: Option<&str>,
) -> Result<(Option<String>, Option<String>), UnknownPlaceholder> {
    let target = target.map(|t| expand(t, &reserved.row)).transpose()?;
    let value = value.map(|v| expand(v, &reserved.row)).transpose()?;
    Ok((target, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner_core_types::Scenario;
    use tempfile::tempdir;

    fn sample_rows() -> Vec<DataRow> {
        vec![
            DataRow {
                scenario: Scenario::Positive,
                used: false,
                fields: vec![("County".to_string(), "Loudoun".to_string())],
            },
            DataRow {
                scenario: Scenario::Negative,
                used: false,
                fields: vec![("County".to_string(), "Fairfax".to_string())],
            },
        ]
    }

    #[test]
    fn reserve_picks_first_matching_row_in_file_order() {
        let consumer = DataConsumer::in_memory(sample_rows(), vec!["County".to_string()]);
        let row = consumer.reserve(RowPreference::Mixed).unwrap();
        assert_eq!(row.get("County"), Some("Loudoun"));
    }

    #[test]
    fn reserve_respects_preference() {
        let consumer = DataConsumer::in_memory(sample_rows(), vec!["County".to_string()]);
        let row = consumer.reserve(RowPreference::Negative).unwrap();
        assert_eq!(row.get("County"), Some("Fairfax"));
    }

    #[test]
    fn reserved_row_is_invisible_to_concurrent_reserve() {
        let consumer = DataConsumer::in_memory(sample_rows(), vec!["County".to_string()]);
        let first = consumer.reserve(RowPreference::Positive).unwrap();
        assert!(consumer.reserve(RowPreference::Positive).is_none());
        consumer.release(&first);
        assert!(consumer.reserve(RowPreference::Positive).is_some());
    }

    #[test]
    fn commit_persists_used_flag_and_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            "Scenario Type,Data Used,County\n'Positive','False','Loudoun'\n",
        )
        .unwrap();

        let consumer = DataConsumer::open(&path).unwrap();
        let row = consumer.reserve(RowPreference::Positive).unwrap();
        consumer.commit(&row).unwrap();

        let reloaded = DataConsumer::open(&path).unwrap();
        assert!(reloaded.reserve(RowPreference::Positive).is_none());
    }

    #[test]
    fn missing_file_is_an_empty_dataset_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let consumer = DataConsumer::open(&path).unwrap();
        assert!(consumer.is_empty());
        assert!(consumer.reserve(RowPreference::Mixed).is_none());
    }

    #[test]
    fn no_rows_available_after_exhaustion() {
        let consumer = DataConsumer::in_memory(
            vec![DataRow {
                scenario: Scenario::Positive,
                used: true,
                fields: vec![],
            }],
            vec![],
        );
        assert!(consumer.reserve(RowPreference::Mixed).is_none());
    }
}
