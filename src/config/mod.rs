//! Configuration types for the listing feature jobs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input/output locations shared by both jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding every input and output table
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,

    /// Where the category dictionary is written. Relative paths resolve
    /// against `dataset_dir`.
    #[serde(default = "default_dictionary_path")]
    pub dictionary: PathBuf,

    #[serde(default = "default_clean_test_input")]
    pub clean_test_input: String,

    #[serde(default = "default_clean_train_input")]
    pub clean_train_input: String,

    #[serde(default = "default_clean_test_output")]
    pub clean_test_output: String,

    #[serde(default = "default_clean_train_output")]
    pub clean_train_output: String,

    #[serde(default = "default_encode_test_input")]
    pub encode_test_input: String,

    #[serde(default = "default_encode_train_input")]
    pub encode_train_input: String,

    #[serde(default = "default_encode_test_output")]
    pub encode_test_output: String,

    #[serde(default = "default_encode_train_output")]
    pub encode_train_output: String,
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("../dataset")
}

fn default_dictionary_path() -> PathBuf {
    PathBuf::from("../backend/data/saved_data.json")
}

fn default_clean_test_input() -> String {
    "test_modified.csv".to_string()
}

fn default_clean_train_input() -> String {
    "train_modified.csv".to_string()
}

fn default_clean_test_output() -> String {
    "test.csv".to_string()
}

fn default_clean_train_output() -> String {
    "train.csv".to_string()
}

fn default_encode_test_input() -> String {
    "test_imputed.csv".to_string()
}

fn default_encode_train_input() -> String {
    "train_imputed.csv".to_string()
}

fn default_encode_test_output() -> String {
    "df_test.csv".to_string()
}

fn default_encode_train_output() -> String {
    "df_train.csv".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            dictionary: default_dictionary_path(),
            clean_test_input: default_clean_test_input(),
            clean_train_input: default_clean_train_input(),
            clean_test_output: default_clean_test_output(),
            clean_train_output: default_clean_train_output(),
            encode_test_input: default_encode_test_input(),
            encode_train_input: default_encode_train_input(),
            encode_test_output: default_encode_test_output(),
            encode_train_output: default_encode_train_output(),
        }
    }
}

impl PathsConfig {
    /// Resolve a table file name inside the dataset directory.
    pub fn table(&self, name: &str) -> PathBuf {
        self.dataset_dir.join(name)
    }

    /// Resolve the category dictionary location.
    pub fn dictionary_path(&self) -> PathBuf {
        if self.dictionary.is_absolute() {
            self.dictionary.clone()
        } else {
            self.dataset_dir.join(&self.dictionary)
        }
    }
}

/// A manually verified coordinate for a known-bad address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressOverride {
    /// Lowercase address the record must match exactly
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Configuration for the location cleaner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Latitude of the polar origin in degrees
    #[serde(default = "default_reference_latitude")]
    pub reference_latitude: f64,

    /// Longitude of the polar origin in degrees
    #[serde(default = "default_reference_longitude")]
    pub reference_longitude: f64,

    /// Earth radius in meters
    #[serde(default = "default_earth_radius")]
    pub earth_radius_m: f64,

    /// Coordinate used by the listing feed for confidential locations
    #[serde(default = "default_redacted_latitude")]
    pub redacted_latitude: f64,

    #[serde(default = "default_redacted_longitude")]
    pub redacted_longitude: f64,

    #[serde(default = "default_address_overrides")]
    pub overrides: Vec<AddressOverride>,

    #[serde(default = "default_latitude_column")]
    pub latitude_column: String,

    #[serde(default = "default_longitude_column")]
    pub longitude_column: String,

    #[serde(default = "default_address_column")]
    pub address_column: String,

    /// Every column starting with this prefix is dropped after conversion
    #[serde(default = "default_drop_prefix")]
    pub drop_prefix: String,

    #[serde(default = "default_radius_column")]
    pub radius_column: String,

    #[serde(default = "default_theta_column")]
    pub theta_column: String,
}

fn default_reference_latitude() -> f64 {
    41.87698087663472
}

fn default_reference_longitude() -> f64 {
    -87.63402335655448
}

fn default_earth_radius() -> f64 {
    6_371_000.0
}

fn default_redacted_latitude() -> f64 {
    40.6331249
}

fn default_redacted_longitude() -> f64 {
    -89.3985283
}

fn default_address_overrides() -> Vec<AddressOverride> {
    vec![
        AddressOverride {
            address: "407 sw fifth street, shelbyville, il 62565".to_string(),
            latitude: 39.402713789610495,
            longitude: -88.79728330743421,
        },
        AddressOverride {
            address: "712 & 715 golfcrest road, normal, il 61761".to_string(),
            latitude: 40.529155234759784,
            longitude: -89.00127842461578,
        },
    ]
}

fn default_latitude_column() -> String {
    "Location.GIS.Latitude".to_string()
}

fn default_longitude_column() -> String {
    "Location.GIS.Longitude".to_string()
}

fn default_address_column() -> String {
    "Location.Address.UnparsedAddress".to_string()
}

fn default_drop_prefix() -> String {
    "Location".to_string()
}

fn default_radius_column() -> String {
    "Polar.R".to_string()
}

fn default_theta_column() -> String {
    "Polar.Theta".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            reference_latitude: default_reference_latitude(),
            reference_longitude: default_reference_longitude(),
            earth_radius_m: default_earth_radius(),
            redacted_latitude: default_redacted_latitude(),
            redacted_longitude: default_redacted_longitude(),
            overrides: default_address_overrides(),
            latitude_column: default_latitude_column(),
            longitude_column: default_longitude_column(),
            address_column: default_address_column(),
            drop_prefix: default_drop_prefix(),
            radius_column: default_radius_column(),
            theta_column: default_theta_column(),
        }
    }
}

/// What one-hot expansion does with a missing category cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingCategories {
    /// Missing cells count as an empty list: every indicator is 0.
    #[default]
    NoCategories,
    /// Missing cells leave every indicator of that row missing.
    Propagate,
}

/// Configuration for the categorical encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Scalar columns wrapped into single-element lists before encoding
    #[serde(default = "default_prepare")]
    pub prepare: Vec<String>,

    /// Columns expanded into indicator columns
    #[serde(default = "default_columns_to_one_hot")]
    pub columns_to_one_hot: Vec<String>,

    #[serde(default = "default_indicator_prefix")]
    pub indicator_prefix: String,

    #[serde(default)]
    pub missing_categories: MissingCategories,

    /// Date column whose month and day are cyclically encoded
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_prepare() -> Vec<String> {
    vec!["Tax.Zoning".to_string(), "Property.PropertyType".to_string()]
}

fn default_columns_to_one_hot() -> Vec<String> {
    [
        "Characteristics.LotFeatures",
        "Structure.Cooling",
        "Tax.Zoning",
        "Property.PropertyType",
        "ImageData.features_reso.results",
        "ImageData.room_type_reso.results",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_indicator_prefix() -> String {
    "one_hot_".to_string()
}

fn default_date_column() -> String {
    "Listing.Dates.CloseDate".to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            prepare: default_prepare(),
            columns_to_one_hot: default_columns_to_one_hot(),
            indicator_prefix: default_indicator_prefix(),
            missing_categories: MissingCategories::default(),
            date_column: default_date_column(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
