use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::series::TimeSeries;
use crate::error::{ForecastError, Result};

/// Date format of the `Date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One CSV row; any columns besides `Date` and `Close` are ignored
#[derive(Debug, Deserialize)]
struct CloseRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Close")]
    close: f64,
}

/// Read a CSV file with `Date` and `Close` columns into a series.
///
/// Rows are sorted ascending by date. A missing or empty file, an
/// unparsable date or price, a non-positive price or a repeated date is a
/// `DataLoad` error.
pub fn load_close_series<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let path = path.as_ref();
    let source = path.display().to_string();

    let file = File::open(path)
        .map_err(|e| ForecastError::data_load(&source, format!("cannot open file: {}", e)))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
    for (line_num, record) in reader.deserialize::<CloseRecord>().enumerate() {
        // Header is line 1
        let line = line_num + 2;
        let record = record
            .map_err(|e| ForecastError::data_load(&source, format!("line {}: {}", line, e)))?;

        let date = NaiveDate::parse_from_str(record.date.trim(), DATE_FORMAT).map_err(|_| {
            ForecastError::data_load(&source, format!("invalid date '{}' on line {}", record.date, line))
        })?;

        if !record.close.is_finite() || record.close <= 0.0 {
            return Err(ForecastError::data_load(
                &source,
                format!("non-positive or non-finite close on line {}", line),
            ));
        }

        rows.push((date, record.close));
    }

    if rows.is_empty() {
        return Err(ForecastError::data_load(&source, "no valid data found in file"));
    }

    rows.sort_by_key(|&(date, _)| date);
    if let Some(dup) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(ForecastError::data_load(&source, format!("duplicate date {}", dup[0].0)));
    }

    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = rows.into_iter().unzip();
    debug!(first = %dates[0], last = %dates[dates.len() - 1], "parsed close prices");
    info!(n = values.len(), file = %source, "loaded closing prices");

    TimeSeries::new(dates, values)
}
