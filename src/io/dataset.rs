//! CSV ingest for historical resale listings.
//!
//! This module is responsible for turning a resale-history CSV into a clean set of
//! `Listing`s plus the option lists the input form offers.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (options keep first-appearance order)

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::Listing;
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 7] = [
    "month",
    "town",
    "flat_type",
    "storey_range",
    "floor_area_sqm",
    "lease_commence_date",
    "resale_price",
];

/// A row that was skipped during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Summary stats about the listings actually kept.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub rows_read: usize,
    pub rows_used: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub month_min: NaiveDate,
    pub month_max: NaiveDate,
}

/// Distinct categorical values offered by the form, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormOptions {
    pub towns: Vec<String>,
    pub flat_types: Vec<String>,
    pub storey_ranges: Vec<String>,
}

/// Ingest output: listings + stats + options + row errors.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub listings: Vec<Listing>,
    pub stats: DatasetStats,
    pub options: FormOptions,
    pub row_errors: Vec<RowError>,
}

impl Dataset {
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.listings.iter().map(|l| l.resale_price)
    }
}

/// Load listings from a CSV file.
pub fn load_dataset(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open dataset '{}': {e}", path.display())))?;
    let dataset = read_dataset(file)?;

    info!(
        path = %path.display(),
        rows_read = dataset.stats.rows_read,
        rows_used = dataset.stats.rows_used,
        skipped = dataset.row_errors.len(),
        "dataset loaded"
    );
    if let Some(first) = dataset.row_errors.first() {
        warn!(
            skipped = dataset.row_errors.len(),
            first_line = first.line,
            first_error = %first.message,
            "some dataset rows were skipped"
        );
    }
    Ok(dataset)
}

/// Load listings from any CSV reader.
pub fn read_dataset<R: Read>(source: R) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::input(format!("Missing required column: `{name}`")));
        }
    }

    let mut listings = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &header_map));

        match parsed {
            Ok(listing) => listings.push(listing),
            Err(message) => {
                debug!(line, %message, "skipping dataset row");
                row_errors.push(RowError { line, message });
            }
        }
    }

    let stats = compute_stats(&listings, rows_read)
        .ok_or_else(|| AppError::no_data("No valid listings in dataset."))?;
    let options = collect_options(&listings);

    Ok(Dataset {
        listings,
        stats,
        options,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Listing, String> {
    let month = parse_month(get_required(record, header_map, "month")?)?;
    let town = get_required(record, header_map, "town")?.to_string();
    let flat_type = get_required(record, header_map, "flat_type")?.to_string();
    let storey_range = get_required(record, header_map, "storey_range")?.to_string();
    let flat_model = get_optional(record, header_map, "flat_model").map(str::to_string);

    let floor_area_sqm = parse_f64(get_required(record, header_map, "floor_area_sqm")?, "floor_area_sqm")?;
    if floor_area_sqm <= 0.0 {
        return Err("Invalid `floor_area_sqm` (must be > 0).".to_string());
    }

    let lease_commence_date = parse_year(get_required(record, header_map, "lease_commence_date")?)?;

    let resale_price = parse_f64(get_required(record, header_map, "resale_price")?, "resale_price")?;
    if resale_price <= 0.0 {
        return Err("Invalid `resale_price` (must be > 0).".to_string());
    }

    Ok(Listing {
        month,
        town,
        flat_type,
        storey_range,
        flat_model,
        floor_area_sqm,
        lease_commence_date,
        resale_price,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse `YYYY-MM` (or a full `YYYY-MM-DD`) into the first day of that month.
fn parse_month(s: &str) -> Result<NaiveDate, String> {
    let full = if s.matches('-').count() == 1 {
        format!("{s}-01")
    } else {
        s.to_string()
    };
    NaiveDate::parse_from_str(&full, "%Y-%m-%d")
        .map(|d| d.with_day0(0).unwrap_or(d))
        .map_err(|_| format!("Invalid month '{s}'. Expected YYYY-MM or YYYY-MM-DD."))
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid `{name}` value '{s}'."))
}

/// Lease years sometimes arrive as floats (`1986.0`) from spreadsheet exports.
fn parse_year(s: &str) -> Result<i32, String> {
    if let Ok(y) = s.parse::<i32>() {
        return Ok(y);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < f64::from(i32::MAX) => Ok(v as i32),
        _ => Err(format!("Invalid `lease_commence_date` value '{s}'.")),
    }
}

fn compute_stats(listings: &[Listing], rows_read: usize) -> Option<DatasetStats> {
    let first = listings.first()?;
    let mut stats = DatasetStats {
        rows_read,
        rows_used: listings.len(),
        price_min: first.resale_price,
        price_max: first.resale_price,
        month_min: first.month,
        month_max: first.month,
    };

    for l in &listings[1..] {
        stats.price_min = stats.price_min.min(l.resale_price);
        stats.price_max = stats.price_max.max(l.resale_price);
        stats.month_min = stats.month_min.min(l.month);
        stats.month_max = stats.month_max.max(l.month);
    }
    Some(stats)
}

fn collect_options(listings: &[Listing]) -> FormOptions {
    fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        values
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    FormOptions {
        towns: distinct(listings.iter().map(|l| l.town.as_str())),
        flat_types: distinct(listings.iter().map(|l| l.flat_type.as_str())),
        storey_ranges: distinct(listings.iter().map(|l| l.storey_range.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
\u{feff}month,town,flat_type,block,street_name,storey_range,floor_area_sqm,flat_model,lease_commence_date,resale_price
2017-01,ANG MO KIO,2 ROOM,406,ANG MO KIO AVE 10,10 TO 12,44,Improved,1979,232000
2017-02,BEDOK,4 ROOM,108,BEDOK NTH RD,04 TO 06,92,New Generation,1978,350000
2017-01,ANG MO KIO,3 ROOM,108,ANG MO KIO AVE 4,01 TO 03,67,New Generation,1978,250000
2017-03,BEDOK,4 ROOM,1,BEDOK STH,07 TO 09,abc,Model A,1980,400000
2017-13,BEDOK,4 ROOM,1,BEDOK STH,07 TO 09,90,Model A,1980,400000
2017-04,BEDOK,5 ROOM,1,BEDOK STH,07 TO 09,120,,1986.0,510000
";

    #[test]
    fn reads_valid_rows_and_reports_bad_ones() {
        let ds = read_dataset(CSV.as_bytes()).unwrap();
        assert_eq!(ds.stats.rows_read, 6);
        assert_eq!(ds.stats.rows_used, 4);
        assert_eq!(ds.row_errors.len(), 2);
        assert_eq!(ds.row_errors[0].line, 5);
        assert!(ds.row_errors[0].message.contains("floor_area_sqm"));
        assert_eq!(ds.row_errors[1].line, 6);
        assert!(ds.row_errors[1].message.contains("month"));

        let last = ds.listings.last().unwrap();
        assert_eq!(last.flat_model, None);
        assert_eq!(last.lease_commence_date, 1986);
        assert_eq!(last.month, NaiveDate::from_ymd_opt(2017, 4, 1).unwrap());
    }

    #[test]
    fn stats_and_options() {
        let ds = read_dataset(CSV.as_bytes()).unwrap();
        assert_eq!(ds.stats.price_min, 232_000.0);
        assert_eq!(ds.stats.price_max, 510_000.0);
        assert_eq!(ds.options.towns, vec!["ANG MO KIO", "BEDOK"]);
        assert_eq!(ds.options.flat_types, vec!["2 ROOM", "4 ROOM", "3 ROOM", "5 ROOM"]);
        assert_eq!(ds.options.storey_ranges, vec!["10 TO 12", "04 TO 06", "01 TO 03", "07 TO 09"]);
    }

    #[test]
    fn missing_column_is_input_error() {
        let err = read_dataset("month,town\n2017-01,BEDOK\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("flat_type"));
    }

    #[test]
    fn no_valid_rows_is_no_data_error() {
        let csv = "month,town,flat_type,storey_range,floor_area_sqm,lease_commence_date,resale_price\n\
                   2017-01,BEDOK,4 ROOM,04 TO 06,90,1990,-5\n";
        let err = read_dataset(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn month_accepts_full_dates() {
        assert_eq!(parse_month("2019-07-15").unwrap(), NaiveDate::from_ymd_opt(2019, 7, 1).unwrap());
        assert!(parse_month("July 2019").is_err());
    }

    #[test]
    fn load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resale.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(load_dataset(&path).unwrap().listings.len(), 4);

        let missing = dir.path().join("nope.csv");
        assert_eq!(load_dataset(&missing).unwrap_err().exit_code(), 2);
    }
}
