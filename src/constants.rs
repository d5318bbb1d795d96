//! Application constants and default values for hourspot.
//!
//! This module contains the query defaults, validation limits, and the
//! GeoNames dump locations used throughout the application.

// ═══ Query Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_TARGET_HOUR: u32 = 17; // 5 PM, the hour everyone asks about
pub const DEFAULT_MIN_POPULATION: u64 = 2_000; // Starting population floor
pub const DEFAULT_HARD_FLOOR: u64 = 500; // Relaxation never goes below this
pub const DEFAULT_FLOOR_DECAY: f64 = 0.9; // Multiplicative relaxation factor

// ═══ Validation Limits ═══
// These limits ensure user inputs are within reasonable and safe ranges

pub const MAXIMUM_TARGET_HOUR: u32 = 23; // Hours are 0-23

// Decay must shrink the floor without collapsing it in one step
pub const MINIMUM_FLOOR_DECAY: f64 = 0.1;
pub const MAXIMUM_FLOOR_DECAY: f64 = 0.99;

// ═══ GeoNames Dump Files ═══
// Canonical download locations and the on-disk names the importer expects.
// Downloading is left to the operator (curl/unzip); hourspot only reads the
// extracted files from the configured data directory.

pub const GEONAMES_CITIES_URL: &str = "https://download.geonames.org/export/dump/cities500.zip";
pub const GEONAMES_ADMIN1_URL: &str =
    "https://download.geonames.org/export/dump/admin1CodesASCII.txt";
pub const GEONAMES_COUNTRIES_URL: &str =
    "https://download.geonames.org/export/dump/countryInfo.txt";

pub const CITIES_FILE: &str = "cities500.txt";
pub const ADMIN1_FILE: &str = "admin1CodesASCII.txt";
pub const COUNTRY_FILE: &str = "countryInfo.txt";

// ═══ Exit Codes ═══
// Standard exit codes for process termination

pub const EXIT_FAILURE: i32 = 1; // General failure
