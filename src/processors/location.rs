//! Location cleaning: coordinate repair and polar conversion.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::{LocationConfig, PathsConfig};
use crate::core::loaders::load_table;
use crate::core::table::{is_missing, Table};
use crate::core::transforms::{coordinates_to_polar, GeoPoint, ReferencePoint};
use crate::core::writers::{format_float, format_optional, write_table};

/// Counts of what a cleaning pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub rows: usize,
    /// Rows whose coordinates matched the redaction placeholder
    pub redacted: usize,
    /// Rows whose coordinates came from an address override
    pub overridden: usize,
    /// Rows that received a polar coordinate
    pub converted: usize,
    /// Raw location columns removed
    pub dropped_columns: usize,
}

fn parse_coordinate(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Read a coordinate column as optional numbers.
///
/// Absent columns read as all missing; unparseable cells are missing.
fn read_coordinates(table: &Table, name: &str) -> Vec<Option<f64>> {
    match table.column(name) {
        Some(cells) => cells.iter().map(|c| parse_coordinate(c)).collect(),
        None => {
            warn!("Column '{}' not found, treating every value as missing", name);
            vec![None; table.num_rows()]
        }
    }
}

/// Blank out coordinates equal to the redaction placeholder.
///
/// Both values must match exactly; the result is missing, not zero.
pub fn repair_redacted(
    latitudes: &mut [Option<f64>],
    longitudes: &mut [Option<f64>],
    config: &LocationConfig,
) -> usize {
    let mut repaired = 0;
    for (lat, lon) in latitudes.iter_mut().zip(longitudes.iter_mut()) {
        if *lat == Some(config.redacted_latitude) && *lon == Some(config.redacted_longitude) {
            *lat = None;
            *lon = None;
            repaired += 1;
        }
    }
    repaired
}

/// Overwrite coordinates of known-bad addresses with verified values.
///
/// Addresses are compared after lowercasing, with no other normalisation.
pub fn apply_overrides(
    addresses: &[String],
    latitudes: &mut [Option<f64>],
    longitudes: &mut [Option<f64>],
    config: &LocationConfig,
) -> usize {
    let mut applied = 0;
    for (idx, address) in addresses.iter().enumerate() {
        if is_missing(address) {
            continue;
        }
        let lowered = address.to_lowercase();
        if let Some(fix) = config.overrides.iter().find(|o| o.address == lowered) {
            latitudes[idx] = Some(fix.latitude);
            longitudes[idx] = Some(fix.longitude);
            applied += 1;
        }
    }
    applied
}

/// Clean one table in memory.
///
/// Applies redaction repair, address overrides and the polar conversion,
/// appends the radius and angle columns, then drops every column under the
/// location prefix.
pub fn clean_table(table: &mut Table, config: &LocationConfig) -> Result<CleanStats> {
    let mut stats = CleanStats {
        rows: table.num_rows(),
        ..CleanStats::default()
    };

    let mut latitudes = read_coordinates(table, &config.latitude_column);
    let mut longitudes = read_coordinates(table, &config.longitude_column);

    stats.redacted = repair_redacted(&mut latitudes, &mut longitudes, config);

    match table.column(&config.address_column) {
        Some(addresses) => {
            stats.overridden = apply_overrides(addresses, &mut latitudes, &mut longitudes, config);
        }
        None => warn!(
            "Column '{}' not found, skipping address overrides",
            config.address_column
        ),
    }

    let points: Vec<Option<GeoPoint>> = latitudes
        .iter()
        .zip(longitudes.iter())
        .map(|(lat, lon)| match (lat, lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(*lat, *lon)),
            _ => None,
        })
        .collect();

    // Write repaired coordinates back before they are dropped so a custom
    // prefix that keeps them still shows the cleaned values.
    if table.contains(&config.latitude_column) {
        table.set_column(
            config.latitude_column.clone(),
            latitudes.iter().map(|v| format_optional(*v)).collect(),
        )?;
    }
    if table.contains(&config.longitude_column) {
        table.set_column(
            config.longitude_column.clone(),
            longitudes.iter().map(|v| format_optional(*v)).collect(),
        )?;
    }

    let reference = ReferencePoint::from_config(config);
    let polar = coordinates_to_polar(&reference, &points);
    stats.converted = polar.iter().filter(|p| p.is_some()).count();

    let (radii, thetas): (Vec<String>, Vec<String>) = polar
        .iter()
        .map(|p| match p {
            Some(p) => (format_float(p.r), format_float(p.theta)),
            None => (String::new(), String::new()),
        })
        .unzip();

    table.set_column(config.radius_column.clone(), radii)?;
    table.set_column(config.theta_column.clone(), thetas)?;

    let dropped = table.drop_prefix(&config.drop_prefix);
    debug!("Dropped location columns: {:?}", dropped);
    stats.dropped_columns = dropped.len();

    Ok(stats)
}

/// Clean a single CSV file and write the result.
pub fn clean_file(input: &Path, output: &Path, config: &LocationConfig) -> Result<CleanStats> {
    let mut table = load_table(input)
        .with_context(|| format!("Failed to load listings from {}", input.display()))?;

    let stats = clean_table(&mut table, config)?;

    write_table(output, &table)
        .with_context(|| format!("Failed to write cleaned listings to {}", output.display()))?;

    Ok(stats)
}

/// Run the location cleaner over the test and train tables.
///
/// Returns the stats of the test and train passes, in that order.
pub fn run_location_job(
    paths: &PathsConfig,
    config: &LocationConfig,
) -> Result<(CleanStats, CleanStats)> {
    info!("Processing test dataset...");
    let test = clean_file(
        &paths.table(&paths.clean_test_input),
        &paths.table(&paths.clean_test_output),
        config,
    )?;

    info!("Processing train dataset...");
    let train = clean_file(
        &paths.table(&paths.clean_train_input),
        &paths.table(&paths.clean_train_output),
        config,
    )?;

    info!("Modified datasets have been saved successfully.");
    Ok((test, train))
}
