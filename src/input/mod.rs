//! Input table handling for the epic creator.
//!
//! At most one CSV table may be supplied. Rows are streamed in file order,
//! so a failure part way through leaves the remaining rows unread.

use crate::errors::{EpicError, Result};
use crate::models::issue_row::IssueRow;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Returns the single configured table, `None` when there is none.
pub fn single_input_table(tables: &[PathBuf]) -> Result<Option<&Path>> {
    match tables {
        [] => Ok(None),
        [table] => Ok(Some(table.as_path())),
        _ => Err(EpicError::TooManyInputTables(tables.len())),
    }
}

/// Streaming reader over the rows of an issue table.
pub struct IssueTable {
    rows: csv::DeserializeRecordsIntoIter<File, IssueRow>,
}

impl IssueTable {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(|e| EpicError::InputTable(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            rows: reader.into_deserialize(),
        })
    }
}

impl Iterator for IssueTable {
    type Item = Result<IssueRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| row.map_err(EpicError::from))
    }
}
