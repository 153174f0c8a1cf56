//! Categorical encoding: one-hot expansion and cyclic date features.
//!
//! Train and test tables are encoded together so both end up with the same
//! indicator columns, then split back at the original boundary.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::{EncodingConfig, MissingCategories, PathsConfig};
use crate::core::loaders::load_table;
use crate::core::table::Table;
use crate::core::writers::{format_optional, write_table};

use super::cell::CellValue;
use super::cyclic::{encode_dates, format_date};
use super::dictionary::CategoryDictionary;

/// Name of the indicator column for `token`.
///
/// Spaces become underscores; no other character is changed.
pub fn indicator_column_name(prefix: &str, token: &str) -> String {
    format!("{}{}", prefix, token.replace(' ', "_"))
}

/// What one-hot expansion of a single column produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneHotOutcome {
    /// Indicator column names in creation order
    pub indicators: Vec<String>,
    /// Missing cells that were encoded under the missing-category policy
    pub missing: usize,
    /// Cells that held text but no list literal
    pub unparseable: usize,
    /// Indicator names that overwrote an existing column
    pub collisions: Vec<String>,
}

/// Totals for a whole encoding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Columns of each output table
    pub output_columns: usize,
    pub encoded_columns: Vec<String>,
    pub indicator_columns: usize,
    /// Configured columns that were not present
    pub skipped_columns: Vec<String>,
    pub missing_cells: usize,
    pub unparseable_cells: usize,
    pub unparsed_dates: usize,
}

/// Expand one column of parsed cells into indicator columns.
///
/// Every cell is coerced to its token list (see [`CellValue::into_tokens`]),
/// the distinct tokens are recorded in `dictionary` under `column`, and one
/// `0`/`1` column per token is written in sorted token order. The source
/// column is dropped afterwards.
pub fn one_hot_encode(
    table: &mut Table,
    column: &str,
    values: Vec<CellValue>,
    config: &EncodingConfig,
    dictionary: &mut CategoryDictionary,
) -> Result<OneHotOutcome> {
    let mut outcome = OneHotOutcome::default();

    let missing_rows: Vec<bool> = values.iter().map(CellValue::is_missing).collect();
    outcome.missing = missing_rows.iter().filter(|m| **m).count();
    outcome.unparseable = values
        .iter()
        .filter(|v| matches!(v, CellValue::Unparseable(_)))
        .count();

    let rows: Vec<Vec<String>> = values.into_iter().map(CellValue::into_tokens).collect();

    let distinct: BTreeSet<String> = rows.iter().flatten().cloned().collect();
    dictionary.insert(column, distinct.clone());

    let index: HashMap<&str, usize> = distinct
        .iter()
        .enumerate()
        .map(|(i, token)| (token.as_str(), i))
        .collect();

    let mut indicators: Vec<Vec<&'static str>> = vec![vec!["0"; rows.len()]; distinct.len()];
    for (row, tokens) in rows.iter().enumerate() {
        for token in tokens {
            indicators[index[token.as_str()]][row] = "1";
        }
    }

    if config.missing_categories == MissingCategories::Propagate {
        for (row, missing) in missing_rows.iter().enumerate() {
            if *missing {
                for column in indicators.iter_mut() {
                    column[row] = "";
                }
            }
        }
    }

    for (token, cells) in distinct.iter().zip(indicators) {
        let name = indicator_column_name(&config.indicator_prefix, token);
        let replaced = table.set_column(
            name.clone(),
            cells.into_iter().map(str::to_string).collect(),
        )?;
        if replaced {
            warn!(
                "Indicator column '{}' from '{}' overwrites an existing column",
                name, column
            );
            outcome.collisions.push(name.clone());
        }
        if !outcome.indicators.contains(&name) {
            outcome.indicators.push(name);
        }
    }

    table.drop_column(column);
    Ok(outcome)
}

/// Apply list normalisation and one-hot expansion to every configured column.
///
/// Columns named in `prepare` get their scalars wrapped into single-element
/// lists first; a prepared column that is not one-hot encoded is written
/// back in list-literal form. Absent columns are skipped with a warning.
pub fn encode_categories(
    table: &mut Table,
    config: &EncodingConfig,
    stats: &mut EncodeStats,
) -> Result<CategoryDictionary> {
    let mut dictionary = CategoryDictionary::new();
    let mut prepared: BTreeMap<String, Vec<CellValue>> = BTreeMap::new();

    for name in &config.prepare {
        let Some(cells) = table.column(name) else {
            warn!("Column '{}' not found in table. Skipping preparation...", name);
            if !config.columns_to_one_hot.contains(name) {
                stats.skipped_columns.push(name.clone());
            }
            continue;
        };

        let values: Vec<CellValue> = cells
            .iter()
            .map(|c| CellValue::from_cell(c).normalize_scalar())
            .collect();

        if config.columns_to_one_hot.contains(name) {
            prepared.insert(name.clone(), values);
        } else {
            let rendered = values.iter().map(CellValue::to_cell).collect();
            table.set_column(name.clone(), rendered)?;
        }
    }

    for name in &config.columns_to_one_hot {
        let values: Vec<CellValue> = match prepared.remove(name) {
            Some(values) => values,
            None => match table.column(name) {
                Some(cells) => cells.iter().map(|c| CellValue::from_cell(c)).collect(),
                None => {
                    warn!("Column '{}' not found in table. Skipping...", name);
                    stats.skipped_columns.push(name.clone());
                    continue;
                }
            },
        };

        let values: Vec<CellValue> = values.into_iter().map(CellValue::parse_list).collect();
        let outcome = one_hot_encode(table, name, values, config, &mut dictionary)?;

        if outcome.missing > 0 {
            match config.missing_categories {
                MissingCategories::NoCategories => warn!(
                    "{} missing cells in '{}' encoded as having no categories",
                    outcome.missing, name
                ),
                MissingCategories::Propagate => info!(
                    "{} missing cells in '{}' left missing in indicator columns",
                    outcome.missing, name
                ),
            }
        }
        if outcome.unparseable > 0 {
            debug!(
                "{} cells in '{}' were not list literals and have no categories",
                outcome.unparseable, name
            );
        }
        info!(
            "Encoded '{}' into {} indicator columns",
            name,
            outcome.indicators.len()
        );

        stats.encoded_columns.push(name.clone());
        stats.indicator_columns += outcome.indicators.len();
        stats.missing_cells += outcome.missing;
        stats.unparseable_cells += outcome.unparseable;
    }

    Ok(dictionary)
}

/// Append cyclic month and day encodings of the configured date column.
///
/// Adds `month_sin`, `month_cos`, `day_sin` and `day_cos`. The date column is
/// kept but rewritten as `YYYY-MM-DD`, with unparseable cells left missing.
/// Columns named `month` or `day` are removed from the output. Returns the
/// number of non-empty cells that failed to parse, or `None` when the
/// column is absent.
pub fn encode_close_date(table: &mut Table, config: &EncodingConfig) -> Result<Option<usize>> {
    let Some(cells) = table.column(&config.date_column) else {
        warn!(
            "Column '{}' not found in table. Skipping date encoding...",
            config.date_column
        );
        return Ok(None);
    };

    let features = encode_dates(cells);

    let render = |values: &[Option<f64>]| -> Vec<String> {
        values.iter().map(|v| format_optional(*v)).collect()
    };

    let dates = features.dates.iter().map(|d| format_date(*d)).collect();
    table.set_column(config.date_column.clone(), dates)?;

    table.set_column("month_sin", render(&features.month_sin))?;
    table.set_column("month_cos", render(&features.month_cos))?;
    table.set_column("day_sin", render(&features.day_sin))?;
    table.set_column("day_cos", render(&features.day_cos))?;

    for scratch in ["month", "day"] {
        if table.drop_column(scratch).is_some() {
            debug!("Dropped column '{}'", scratch);
        }
    }

    if features.unparsed > 0 {
        warn!(
            "{} values in '{}' are not dates; their cyclic features are missing",
            features.unparsed, config.date_column
        );
    }

    Ok(Some(features.unparsed))
}

/// Encode a train and a test table together.
///
/// Returns the encoded train and test tables, the category dictionary and
/// run statistics. Both tables share the same columns in the same order.
pub fn encode_tables(
    train: Table,
    test: Table,
    config: &EncodingConfig,
) -> Result<(Table, Table, CategoryDictionary, EncodeStats)> {
    let mut stats = EncodeStats {
        train_rows: train.num_rows(),
        test_rows: test.num_rows(),
        ..EncodeStats::default()
    };

    let mut combined = train.concat(test);

    let dictionary = encode_categories(&mut combined, config, &mut stats)?;
    if let Some(unparsed) = encode_close_date(&mut combined, config)? {
        stats.unparsed_dates = unparsed;
    } else {
        stats.skipped_columns.push(config.date_column.clone());
    }

    stats.output_columns = combined.num_columns();
    debug!("Output columns: {:?}", combined.headers());

    let (train, test) = combined.split_at(stats.train_rows)?;
    Ok((train, test, dictionary, stats))
}

/// Run the categorical encoder on the configured train and test files.
///
/// The category dictionary is written once one-hot expansion is complete;
/// the output tables are written last.
pub fn run_encoding_job(paths: &PathsConfig, config: &EncodingConfig) -> Result<EncodeStats> {
    let test_path = paths.table(&paths.encode_test_input);
    let train_path = paths.table(&paths.encode_train_input);

    info!("Loading {}", test_path.display());
    let test = load_table(&test_path)
        .with_context(|| format!("Failed to load test listings from {}", test_path.display()))?;

    info!("Loading {}", train_path.display());
    let train = load_table(&train_path).with_context(|| {
        format!("Failed to load train listings from {}", train_path.display())
    })?;

    let (train, test, dictionary, stats) = encode_tables(train, test, config)?;

    let dictionary_path: PathBuf = paths.dictionary_path();
    dictionary.save(&dictionary_path).with_context(|| {
        format!(
            "Failed to save category dictionary to {}",
            dictionary_path.display()
        )
    })?;
    info!(
        "Category dictionary with {} columns saved to {}",
        dictionary.len(),
        dictionary_path.display()
    );

    info!("Output tables have {} columns", stats.output_columns);

    for (table, name) in [
        (&train, &paths.encode_train_output),
        (&test, &paths.encode_test_output),
    ] {
        let path = paths.table(name);
        write_table(&path, table)
            .with_context(|| format!("Failed to save dataset to {}", path.display()))?;
        info!("Dataset saved to {}", path.display());
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(columns: &[&str]) -> EncodingConfig {
        EncodingConfig {
            prepare: Vec::new(),
            columns_to_one_hot: columns.iter().map(|s| s.to_string()).collect(),
            ..EncodingConfig::default()
        }
    }

    fn cells(table: &Table, name: &str) -> Vec<String> {
        table.column(name).unwrap().to_vec()
    }

    #[test]
    fn test_indicator_column_name() {
        assert_eq!(
            indicator_column_name("one_hot_", "Central Air"),
            "one_hot_Central_Air"
        );
        assert_eq!(indicator_column_name("one_hot_", "R-1"), "one_hot_R-1");
    }

    #[test]
    fn test_one_hot_two_categories() {
        let mut table = Table::from_columns(vec![
            ("id", vec!["1", "2", "3"]),
            ("tags", vec!["['a']", "['b', 'a']", "[]"]),
        ])
        .unwrap();
        let config = config_for(&["tags"]);
        let mut stats = EncodeStats::default();

        let dictionary = encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(
            table.headers(),
            &["id".to_string(), "one_hot_a".to_string(), "one_hot_b".to_string()]
        );
        assert_eq!(cells(&table, "one_hot_a"), vec!["1", "1", "0"]);
        assert_eq!(cells(&table, "one_hot_b"), vec!["0", "1", "0"]);
        assert_eq!(stats.indicator_columns, 2);

        let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dictionary.get("tags"), Some(&expected));
    }

    #[test]
    fn test_unparseable_and_missing_have_no_categories() {
        let mut table = Table::from_columns(vec![(
            "cooling",
            vec!["['Central Air']", "Central Air, Fans", ""],
        )])
        .unwrap();
        let config = config_for(&["cooling"]);
        let mut stats = EncodeStats::default();

        encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(cells(&table, "one_hot_Central_Air"), vec!["1", "0", "0"]);
        assert_eq!(stats.unparseable_cells, 1);
        assert_eq!(stats.missing_cells, 1);
    }

    #[test]
    fn test_missing_cells_can_propagate() {
        let mut table =
            Table::from_columns(vec![("cooling", vec!["['Central Air']", "", "[]"])]).unwrap();
        let config = EncodingConfig {
            missing_categories: MissingCategories::Propagate,
            ..config_for(&["cooling"])
        };
        let mut stats = EncodeStats::default();

        encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(cells(&table, "one_hot_Central_Air"), vec!["1", "", "0"]);
    }

    #[test]
    fn test_prepare_wraps_scalars() {
        let mut table = Table::from_columns(vec![
            ("Tax.Zoning", vec!["R-1", "", "B 2"]),
            ("Property.PropertyType", vec!["Residential", "Land", ""]),
        ])
        .unwrap();
        let config = EncodingConfig {
            prepare: vec!["Tax.Zoning".into(), "Property.PropertyType".into()],
            columns_to_one_hot: vec!["Tax.Zoning".into()],
            ..EncodingConfig::default()
        };
        let mut stats = EncodeStats::default();

        let dictionary = encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(cells(&table, "one_hot_R-1"), vec!["1", "0", "0"]);
        assert_eq!(cells(&table, "one_hot_B_2"), vec!["0", "0", "1"]);
        assert_eq!(dictionary.get("Tax.Zoning").unwrap().len(), 2);
        // Prepared but not encoded: written back as list literals
        assert_eq!(
            cells(&table, "Property.PropertyType"),
            vec!["['Residential']", "['Land']", ""]
        );
    }

    #[test]
    fn test_unknown_columns_are_skipped() {
        let mut table = Table::from_columns(vec![("tags", vec!["['a']"])]).unwrap();
        let config = EncodingConfig {
            prepare: vec!["Nope".into()],
            ..config_for(&["Missing.Column", "tags"])
        };
        let mut stats = EncodeStats::default();

        let dictionary = encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(stats.skipped_columns, vec!["Nope", "Missing.Column"]);
        assert_eq!(stats.encoded_columns, vec!["tags"]);
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn test_indicator_collision_overwrites() {
        let mut table = Table::from_columns(vec![
            ("a", vec!["['x']", "[]"]),
            ("b", vec!["[]", "['x']"]),
        ])
        .unwrap();
        let config = config_for(&["a", "b"]);
        let mut stats = EncodeStats::default();

        let dictionary = encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(table.headers(), &["one_hot_x".to_string()]);
        assert_eq!(cells(&table, "one_hot_x"), vec!["0", "1"]);
        assert_eq!(dictionary.len(), 2);
    }

    #[test]
    fn test_tokens_sharing_an_indicator_count_once() {
        let mut table = Table::from_columns(vec![(
            "cooling",
            vec!["['Central Air']", "['Central_Air']", "[]"],
        )])
        .unwrap();
        let config = config_for(&["cooling"]);
        let mut stats = EncodeStats::default();

        let dictionary = encode_categories(&mut table, &config, &mut stats).unwrap();

        assert_eq!(table.headers(), &["one_hot_Central_Air".to_string()]);
        // Later token in sorted order wins the shared column
        assert_eq!(cells(&table, "one_hot_Central_Air"), vec!["0", "1", "0"]);
        assert_eq!(stats.indicator_columns, 1);
        assert_eq!(dictionary.get("cooling").unwrap().len(), 2);
    }

    #[test]
    fn test_one_hot_records_dictionary_before_drop() {
        let mut table = Table::from_columns(vec![("tags", vec!["['z', 'y']"])]).unwrap();
        let mut dictionary = CategoryDictionary::new();

        let outcome = one_hot_encode(
            &mut table,
            "tags",
            vec![CellValue::List(vec!["z".into(), "y".into()])],
            &config_for(&["tags"]),
            &mut dictionary,
        )
        .unwrap();

        assert_eq!(outcome.indicators, vec!["one_hot_y", "one_hot_z"]);
        assert!(!table.contains("tags"));
        assert!(dictionary.get("tags").is_some());
    }

    #[test]
    fn test_encode_close_date() {
        let mut table = Table::from_columns(vec![(
            "Listing.Dates.CloseDate",
            vec!["2024-01-15", "bad", ""],
        )])
        .unwrap();
        let config = EncodingConfig::default();

        let unparsed = encode_close_date(&mut table, &config).unwrap();

        assert_eq!(unparsed, Some(1));
        assert!(table.contains("Listing.Dates.CloseDate"));
        assert!(!table.contains("month"));
        assert!(!table.contains("day"));

        let month_sin: f64 = cells(&table, "month_sin")[0].parse().unwrap();
        assert!((month_sin - (2.0 * std::f64::consts::PI / 12.0).sin()).abs() < 1e-15);
        assert_eq!(cells(&table, "month_cos")[1], "");
        assert_eq!(cells(&table, "day_cos")[2], "");
    }

    #[test]
    fn test_close_date_is_rewritten_canonically() {
        let mut table = Table::from_columns(vec![(
            "Listing.Dates.CloseDate",
            vec!["2024-01-15", "not-a-date", "06/15/2024"],
        )])
        .unwrap();

        encode_close_date(&mut table, &EncodingConfig::default()).unwrap();

        assert_eq!(
            cells(&table, "Listing.Dates.CloseDate"),
            vec!["2024-01-15", "", "2024-06-15"]
        );
    }

    #[test]
    fn test_close_date_removes_month_and_day_columns() {
        let mut table = Table::from_columns(vec![
            ("month", vec!["5"]),
            ("Listing.Dates.CloseDate", vec!["2024-05-10"]),
            ("day", vec!["10"]),
        ])
        .unwrap();

        encode_close_date(&mut table, &EncodingConfig::default()).unwrap();

        assert_eq!(
            table.headers(),
            &[
                "Listing.Dates.CloseDate".to_string(),
                "month_sin".to_string(),
                "month_cos".to_string(),
                "day_sin".to_string(),
                "day_cos".to_string(),
            ]
        );
    }

    #[test]
    fn test_encode_tables_share_columns() {
        let train = Table::from_columns(vec![
            ("id", vec!["1", "2"]),
            ("tags", vec!["['only train']", "[]"]),
            ("Listing.Dates.CloseDate", vec!["2024-03-01", "2024-12-31"]),
        ])
        .unwrap();
        let test = Table::from_columns(vec![
            ("id", vec!["3"]),
            ("tags", vec!["['only test']"]),
            ("Listing.Dates.CloseDate", vec!["2024-07-04"]),
        ])
        .unwrap();

        let (train, test, dictionary, stats) =
            encode_tables(train, test, &config_for(&["tags"])).unwrap();

        assert_eq!(train.headers(), test.headers());
        assert_eq!(train.num_rows(), 2);
        assert_eq!(test.num_rows(), 1);
        assert_eq!(cells(&train, "one_hot_only_test"), vec!["0", "0"]);
        assert_eq!(cells(&test, "one_hot_only_train"), vec!["0"]);
        assert_eq!(cells(&test, "one_hot_only_test"), vec!["1"]);
        assert_eq!(dictionary.get("tags").unwrap().len(), 2);
        assert_eq!(stats.output_columns, train.num_columns());
        assert!(stats.skipped_columns.is_empty());
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn job_paths(dir: &Path) -> PathsConfig {
        PathsConfig {
            dataset_dir: dir.join("dataset"),
            dictionary: PathBuf::from("../backend/data/saved_data.json"),
            ..PathsConfig::default()
        }
    }

    #[test]
    fn test_run_encoding_job_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let dataset = temp_dir.path().join("dataset");
        fs::create_dir_all(&dataset).unwrap();

        write_file(
            &dataset,
            "train_imputed.csv",
            "id,Structure.Cooling,Tax.Zoning,Listing.Dates.CloseDate\n\
             1,\"['Central Air', 'Ceiling Fan(s)']\",R-1,2024-05-10\n\
             2,,B-2,2024-11-30\n",
        );
        write_file(
            &dataset,
            "test_imputed.csv",
            "id,Structure.Cooling,Tax.Zoning,Listing.Dates.CloseDate\n\
             3,\"['Window Unit']\",R-1,not-a-date\n",
        );

        let paths = job_paths(temp_dir.path());
        let config = EncodingConfig::default();

        let stats = run_encoding_job(&paths, &config).unwrap();
        assert_eq!(stats.train_rows, 2);
        assert_eq!(stats.test_rows, 1);
        assert_eq!(stats.unparsed_dates, 1);

        let train_first = fs::read(dataset.join("df_train.csv")).unwrap();
        let test_first = fs::read(dataset.join("df_test.csv")).unwrap();

        let dictionary_path = temp_dir.path().join("backend/data/saved_data.json");
        let dictionary = CategoryDictionary::load(&dictionary_path).unwrap();
        assert_eq!(dictionary.get("Structure.Cooling").unwrap().len(), 3);
        assert_eq!(dictionary.get("Tax.Zoning").unwrap().len(), 2);

        run_encoding_job(&paths, &config).unwrap();
        assert_eq!(fs::read(dataset.join("df_train.csv")).unwrap(), train_first);
        assert_eq!(fs::read(dataset.join("df_test.csv")).unwrap(), test_first);

        let content = String::from_utf8(train_first).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "id,Listing.Dates.CloseDate,one_hot_Ceiling_Fan(s),one_hot_Central_Air,\
             one_hot_Window_Unit,one_hot_B-2,one_hot_R-1,month_sin,month_cos,day_sin,day_cos"
        );
    }

    #[test]
    fn test_run_encoding_job_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let paths = job_paths(temp_dir.path());

        let result = run_encoding_job(&paths, &EncodingConfig::default());

        assert!(result.is_err());
        assert!(!temp_dir.path().join("backend/data/saved_data.json").exists());
    }
}
