//! Loading and atomic rewriting of the data CSV (spec.md §6.3).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use runner_core_types::Scenario;

use crate::error::DataConsumerError;
use crate::row::{format_bool_cell, parse_bool_cell, quote, unquote, DataRow};

pub(crate) struct Dataset {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<DataRow>,
}

impl Dataset {
    /// A missing file is an empty dataset, not an error, mirroring the
    /// Learning Store's "absence is equivalent to empty" convention (§6.2) —
    /// generation is an external hook this crate does not perform (§4.6).
    pub(crate) fn load(path: &Path) -> Result<Self, DataConsumerError> {
        if !path.exists() {
            return Ok(Dataset {
                columns: Vec::new(),
                rows: Vec::new(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|source| DataConsumerError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let headers = reader
            .headers()
            .map_err(|source| DataConsumerError::Parse {
                path: path.to_path_buf(),
                source,
            })?
            .clone();
        if headers.len() < 2 {
            return Err(DataConsumerError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
        let columns: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| DataConsumerError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            let scenario = Scenario::parse(&unquote(&record[0])).unwrap_or(Scenario::Positive);
            let used = parse_bool_cell(&record[1]);
            let fields = columns
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), unquote(&record[i + 2])))
                .collect();
            rows.push(DataRow {
                scenario,
                used,
                fields,
            });
        }

        Ok(Dataset { columns, rows })
    }

    /// Rewrite the whole file, preserving the literal single-quote cell
    /// convention the reader above expects (§6.3) rather than the csv
    /// crate's own double-quote escaping.
    pub(crate) fn persist(&self, path: &Path) -> Result<(), DataConsumerError> {
        let mut body = String::new();
        body.push_str("Scenario Type,Data Used");
        for column in &self.columns {
            body.push(',');
            body.push_str(column);
        }
        body.push('\n');

        for row in &self.rows {
            body.push_str(&quote(row.scenario.as_str()));
            body.push(',');
            body.push_str(&format_bool_cell(row.used));
            for (_, value) in &row.fields {
                body.push(',');
                body.push_str(&quote(value));
            }
            body.push('\n');
        }

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            fs::create_dir_all(dir).map_err(|source| DataConsumerError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let mut tmp = if let Some(dir) = dir {
            tempfile::NamedTempFile::new_in(dir)
        } else {
            tempfile::NamedTempFile::new()
        }
        .map_err(|source| DataConsumerError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tmp.write_all(body.as_bytes())
            .map_err(|source| DataConsumerError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        tmp.persist(path).map_err(|err| DataConsumerError::Write {
            path: path.to_path_buf(),
            source: err.error,
        })?;
        Ok(())
    }
}

pub(crate) fn default_path() -> PathBuf {
    PathBuf::from("test_data.csv")
}
