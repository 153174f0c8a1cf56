//! Column-major in-memory table.
//!
//! Cells are kept as the text read from CSV. An empty string is the single
//! representation of a missing value; loaders normalise the usual null
//! spellings to it before a [`Table`] is built.

use thiserror::Error;

/// Errors raised by structural table operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("column '{name}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("split row {row} is beyond the table length {rows}")]
    SplitOutOfRange { row: usize, rows: usize },
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Returns true if a cell holds no value.
#[inline]
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty()
}

/// A table of named string columns with equal lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<String>>,
    rows: usize,
}

impl Table {
    /// Creates an empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, cells)` pairs.
    ///
    /// Later pairs with an already used name replace the earlier column.
    pub fn from_columns<N, C, S>(columns: Vec<(N, C)>) -> Result<Self>
    where
        N: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, cells) in columns {
            table.set_column(name, cells.into_iter().map(Into::into).collect())?;
        }
        Ok(table)
    }

    /// Builds a table from a header row and row-major records.
    ///
    /// Short records are padded with missing cells, long ones truncated.
    pub fn from_rows(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let rows = records.len();
        let mut columns: Vec<Vec<String>> = headers
            .iter()
            .map(|_| Vec::with_capacity(rows))
            .collect();

        for mut record in records {
            record.resize(headers.len(), String::new());
            for (column, cell) in columns.iter_mut().zip(record) {
                column.push(cell);
            }
        }

        Self {
            headers,
            columns,
            rows,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in output order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of the named column.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.column_index(name).map(|idx| self.columns[idx].as_slice())
    }

    /// Sets a column, replacing it in place if the name exists and
    /// appending it otherwise. Returns true when a column was replaced.
    ///
    /// The first column added to a table without columns fixes the row count.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<bool> {
        let name = name.into();

        if self.headers.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(TableError::LengthMismatch {
                name,
                expected: self.rows,
                actual: values.len(),
            });
        }

        match self.column_index(&name) {
            Some(idx) => {
                self.columns[idx] = values;
                Ok(true)
            }
            None => {
                self.headers.push(name);
                self.columns.push(values);
                Ok(false)
            }
        }
    }

    /// Removes a column, returning its cells if it existed.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.column_index(name)?;
        self.headers.remove(idx);
        Some(self.columns.remove(idx))
    }

    /// Removes every column whose name starts with `prefix`.
    ///
    /// Returns the dropped names; an empty result is not an error.
    pub fn drop_prefix(&mut self, prefix: &str) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut idx = 0;
        while idx < self.headers.len() {
            if self.headers[idx].starts_with(prefix) {
                dropped.push(self.headers.remove(idx));
                self.columns.remove(idx);
            } else {
                idx += 1;
            }
        }
        dropped
    }

    /// Iterates the cells of one row in column order.
    pub fn row(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(move |column| column[idx].as_str())
    }

    /// Stacks `other` below `self`.
    ///
    /// The result has the union of both column sets: columns of `self` first,
    /// then columns only `other` has, in their original order. Cells a side
    /// does not have are missing.
    pub fn concat(mut self, other: Table) -> Table {
        let top_rows = self.rows;
        let total = self.rows + other.rows;

        for column in self.columns.iter_mut() {
            column.reserve(other.rows);
        }

        let mut seen = vec![false; self.headers.len()];
        for (name, cells) in other.headers.into_iter().zip(other.columns) {
            match self.column_index(&name) {
                Some(idx) => {
                    self.columns[idx].extend(cells);
                    seen[idx] = true;
                }
                None => {
                    let mut column = vec![String::new(); top_rows];
                    column.extend(cells);
                    self.headers.push(name);
                    self.columns.push(column);
                    seen.push(true);
                }
            }
        }

        for (column, seen) in self.columns.iter_mut().zip(seen) {
            if !seen {
                column.resize(total, String::new());
            }
        }

        self.rows = total;
        self
    }

    /// Splits the table into rows `[0, row)` and `[row, len)`.
    ///
    /// Both halves keep every column.
    pub fn split_at(mut self, row: usize) -> Result<(Table, Table)> {
        if row > self.rows {
            return Err(TableError::SplitOutOfRange {
                row,
                rows: self.rows,
            });
        }

        let tail_columns: Vec<Vec<String>> = self
            .columns
            .iter_mut()
            .map(|column| column.split_off(row))
            .collect();

        let tail = Table {
            headers: self.headers.clone(),
            columns: tail_columns,
            rows: self.rows - row,
        };
        self.rows = row;

        Ok((self, tail))
    }
}
