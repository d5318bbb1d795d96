//! GeoNames gazetteer import.
//!
//! Parses the extracted GeoNames dump files into catalog rows:
//! `cities500.txt` (one tab-separated city per line), joined against
//! `admin1CodesASCII.txt` (state/province names keyed by `CC.ADMIN1`) and
//! `countryInfo.txt` (country names keyed by ISO code). Malformed lines are
//! skipped and counted; a bad row never aborts an import.
//!
//! Fetching the dumps is the operator's job (see the URLs in
//! [`crate::constants`]); this module only reads what is on disk.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::catalog::CityRecord;
use crate::logger::Log;

// Column indices in the cities500.txt dump
const COL_NAME: usize = 1;
const COL_LATITUDE: usize = 4;
const COL_LONGITUDE: usize = 5;
const COL_COUNTRY_CODE: usize = 8;
const COL_ADMIN1_CODE: usize = 10;
const COL_POPULATION: usize = 14;
const COL_TIMEZONE: usize = 17;
const CITY_COLUMNS: usize = 19;

/// Load the three dump files from `data_dir` into catalog rows.
///
/// # Arguments
/// * `data_dir` - Directory holding `cities500.txt`, `admin1CodesASCII.txt`
///   and `countryInfo.txt`
pub fn load_from_dir(data_dir: &Path) -> Result<Vec<CityRecord>> {
    let admin1_names = parse_admin1(&data_dir.join(crate::constants::ADMIN1_FILE))?;
    let country_names = parse_countries(&data_dir.join(crate::constants::COUNTRY_FILE))?;
    parse_cities(
        &data_dir.join(crate::constants::CITIES_FILE),
        &admin1_names,
        &country_names,
    )
}

/// Parse `admin1CodesASCII.txt` into a `CC.ADMIN1` → state-name map.
pub fn parse_admin1(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read admin1 file at {}", path.display()))?;

    let mut names = HashMap::new();
    for line in content.lines() {
        let mut parts = line.split('\t');
        let (Some(code), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        names.insert(code.to_string(), name.to_string());
    }
    Ok(names)
}

/// Parse `countryInfo.txt` into an ISO-code → country-name map.
///
/// Comment lines starting with `#` are skipped.
pub fn parse_countries(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read country file at {}", path.display()))?;

    let mut names = HashMap::new();
    for line in content.lines() {
        if line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() > 4 {
            names.insert(parts[0].to_string(), parts[4].to_string());
        }
    }
    Ok(names)
}

/// Parse the main `cities500.txt` dump.
///
/// Lines missing columns or carrying unparseable numbers are dropped and
/// counted (data-quality skip); population defaults to 0 only when the
/// field is present but empty, matching the dump's convention for unknown
/// populations.
pub fn parse_cities(
    path: &Path,
    admin1_names: &HashMap<String, String>,
    country_names: &HashMap<String, String>,
) -> Result<Vec<CityRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cities file at {}", path.display()))?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        match parse_city_line(line, admin1_names, country_names) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        Log::log_warning(&format!(
            "Skipped {} malformed lines in {}",
            skipped,
            path.display()
        ));
    }
    Log::log_decorated(&format!(
        "Imported {} gazetteer rows from {}",
        records.len(),
        path.display()
    ));
    Ok(records)
}

fn parse_city_line(
    line: &str,
    admin1_names: &HashMap<String, String>,
    country_names: &HashMap<String, String>,
) -> Option<CityRecord> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < CITY_COLUMNS {
        return None;
    }

    let name = parts[COL_NAME].trim();
    let timezone_name = parts[COL_TIMEZONE].trim();
    if name.is_empty() || timezone_name.is_empty() {
        return None;
    }

    let latitude: f64 = parts[COL_LATITUDE].parse().ok()?;
    let longitude: f64 = parts[COL_LONGITUDE].parse().ok()?;
    let population: u64 = if parts[COL_POPULATION].is_empty() {
        0
    } else {
        parts[COL_POPULATION].parse().ok()?
    };

    let country_code = parts[COL_COUNTRY_CODE].to_string();
    let state_code = match parts[COL_ADMIN1_CODE] {
        "" => None,
        code => Some(code.to_string()),
    };
    let state = state_code
        .as_ref()
        .and_then(|code| admin1_names.get(&format!("{}.{}", country_code, code)))
        .cloned();
    let country = country_names.get(&country_code).cloned();

    Some(CityRecord {
        name: name.to_string(),
        state,
        state_code,
        country,
        country_code,
        population,
        latitude,
        longitude,
        timezone_name: timezone_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_line(name: &str, country: &str, admin1: &str, population: &str, tz: &str) -> String {
        // geonameid, name, asciiname, alternatenames, lat, lon, fclass,
        // fcode, country, cc2, admin1, admin2, admin3, admin4, population,
        // elevation, dem, timezone, moddate
        format!(
            "123\t{name}\t{name}\t\t40.71\t-74.00\tP\tPPL\t{country}\t\t{admin1}\t\t\t\t{population}\t\t10\t{tz}\t2026-01-01"
        )
    }

    fn lookups() -> (HashMap<String, String>, HashMap<String, String>) {
        let mut admin1 = HashMap::new();
        admin1.insert("US.NY".to_string(), "New York".to_string());
        let mut countries = HashMap::new();
        countries.insert("US".to_string(), "United States".to_string());
        (admin1, countries)
    }

    #[test]
    fn test_parse_city_line_joins_admin1_and_country() {
        let (admin1, countries) = lookups();
        let line = city_line("New York City", "US", "NY", "8804190", "America/New_York");
        let record = parse_city_line(&line, &admin1, &countries).unwrap();

        assert_eq!(record.name, "New York City");
        assert_eq!(record.state.as_deref(), Some("New York"));
        assert_eq!(record.state_code.as_deref(), Some("NY"));
        assert_eq!(record.country.as_deref(), Some("United States"));
        assert_eq!(record.country_code, "US");
        assert_eq!(record.population, 8_804_190);
        assert_eq!(record.timezone_name, "America/New_York");
    }

    #[test]
    fn test_parse_city_line_empty_population_defaults_to_zero() {
        let (admin1, countries) = lookups();
        let line = city_line("Nowhere", "US", "NY", "", "America/New_York");
        let record = parse_city_line(&line, &admin1, &countries).unwrap();
        assert_eq!(record.population, 0);
    }

    #[test]
    fn test_parse_city_line_rejects_short_and_bad_lines() {
        let (admin1, countries) = lookups();
        assert!(parse_city_line("too\tfew\tcolumns", &admin1, &countries).is_none());

        let bad_latitude = city_line("Bad", "US", "NY", "1000", "America/New_York")
            .replace("40.71", "not-a-number");
        assert!(parse_city_line(&bad_latitude, &admin1, &countries).is_none());
    }

    #[test]
    fn test_parse_city_line_unknown_codes_leave_names_empty() {
        let line = city_line("Lonely", "ZZ", "99", "1200", "Europe/Berlin");
        let record = parse_city_line(&line, &HashMap::new(), &HashMap::new()).unwrap();
        assert_eq!(record.state, None);
        assert_eq!(record.state_code.as_deref(), Some("99"));
        assert_eq!(record.country, None);
    }

    #[test]
    fn test_parse_countries_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countryInfo.txt");
        fs::write(
            &path,
            "# ISO\tISO3\tISO-Numeric\tfips\tCountry\n\
             US\tUSA\t840\tUS\tUnited States\tWashington\n\
             FR\tFRA\t250\tFR\tFrance\tParis\n",
        )
        .unwrap();

        let names = parse_countries(&path).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names["FR"], "France");
    }

    #[test]
    fn test_load_from_dir_end_to_end() {
        Log::set_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(crate::constants::ADMIN1_FILE),
            "US.NY\tNew York\tNew York\t5128638\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(crate::constants::COUNTRY_FILE),
            "US\tUSA\t840\tUS\tUnited States\tWashington\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(crate::constants::CITIES_FILE),
            format!(
                "{}\n{}\nnot a real line\n",
                city_line("New York City", "US", "NY", "8804190", "America/New_York"),
                city_line("Buffalo", "US", "NY", "278349", "America/New_York"),
            ),
        )
        .unwrap();

        let records = load_from_dir(dir.path()).unwrap();
        Log::set_enabled(true);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state.as_deref(), Some("New York"));
    }
}
