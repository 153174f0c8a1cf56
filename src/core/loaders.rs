//! CSV table loader.
//!
//! Reads listing tables permissively: no schema, ragged records allowed,
//! and the null spellings pandas-style exports produce are all read as a
//! missing cell. Duplicate header names are disambiguated with a `.N`
//! suffix so every column stays addressable.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::debug;
use thiserror::Error;

use super::table::Table;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Cell spellings read as missing.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn normalize_cell(cell: &str) -> String {
    if NULL_TOKENS.contains(&cell) {
        String::new()
    } else {
        cell.to_string()
    }
}

fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut headers = Vec::with_capacity(raw.len());

    for name in raw {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

/// Read a table from any CSV source.
///
/// `path` is only used in error messages.
pub fn read_table<R: Read>(source: R, path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let csv_err = |source: csv::Error| LoaderError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if raw_headers.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    let headers = dedupe_headers(raw_headers);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        records.push(record.iter().map(normalize_cell).collect::<Vec<String>>());
    }

    debug!(
        "{}: read {} rows x {} columns",
        path.display(),
        records.len(),
        headers.len()
    );

    Ok(Table::from_rows(headers, records))
}

/// Load a table from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not valid CSV, or has
/// no header row.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoaderError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_table(BufReader::with_capacity(64 * 1024, file), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_table() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,name,price").unwrap();
        writeln!(file, "1,\"12 Oak St, Normal\",250000").unwrap();
        writeln!(file, "2,,NaN").unwrap();
        file.flush().unwrap();

        let table = load_table(file.path())?;
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("name").unwrap()[0], "12 Oak St, Normal");
        assert_eq!(table.column("name").unwrap()[1], "");
        assert_eq!(table.column("price").unwrap()[1], "");

        Ok(())
    }

    #[test]
    fn test_ragged_rows_are_padded() -> Result<()> {
        let data = "a,b,c\n1,2\n4,5,6\n";
        let table = read_table(data.as_bytes(), Path::new("inline.csv"))?;
        assert_eq!(table.column("c").unwrap(), &["", "6"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() -> Result<()> {
        let data = "a,a,b\n1,2,3\n";
        let table = read_table(data.as_bytes(), Path::new("inline.csv"))?;
        assert_eq!(
            table.headers(),
            &["a".to_string(), "a.1".to_string(), "b".to_string()]
        );
        assert_eq!(table.column("a.1").unwrap()[0], "2");
        Ok(())
    }

    #[test]
    fn test_list_literal_cells_survive_quoting() -> Result<()> {
        let data = "features\n\"['Fenced Yard', 'Corner Lot']\"\n";
        let table = read_table(data.as_bytes(), Path::new("inline.csv"))?;
        assert_eq!(
            table.column("features").unwrap()[0],
            "['Fenced Yard', 'Corner Lot']"
        );
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = load_table("/nonexistent/listings.csv");
        assert!(matches!(result, Err(LoaderError::Open { .. })));
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let result = load_table(file.path());
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }
}
