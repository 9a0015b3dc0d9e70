// src/csv_handler.rs
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use tokio::task;

use crate::data_types::{Dataset, Record};
use crate::error::DataError;

const REQUIRED_COLUMNS: [&str; 5] = ["country", "date", "confirmed", "deaths", "recovered"];

/// Header spellings seen in the wild, keyed by their lowercase alphanumeric form.
const HEADER_ALIASES: [(&str, &str); 16] = [
    ("countryregion", "country"),
    ("country", "country"),
    ("provincestate", "province"),
    ("province", "province"),
    ("state", "province"),
    ("date", "date"),
    ("confirmed", "confirmed"),
    ("deaths", "deaths"),
    ("recovered", "recovered"),
    ("lat", "lat"),
    ("latitude", "lat"),
    ("long", "long"),
    ("lon", "long"),
    ("longitude", "long"),
    ("lng", "long"),
    ("observationdate", "date"),
];

#[derive(Debug, Deserialize)]
struct RawRecord {
    country: String,
    #[serde(default)]
    province: Option<String>,
    date: String,
    #[serde(default)]
    confirmed: Option<String>,
    #[serde(default)]
    deaths: Option<String>,
    #[serde(default)]
    recovered: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    long: Option<f64>,
}

impl RawRecord {
    fn is_blank(&self) -> bool {
        self.country.is_empty()
            && self.date.is_empty()
            && self.confirmed.is_none()
            && self.deaths.is_none()
            && self.recovered.is_none()
    }
}

pub struct CSVHandler {
    date_format: String,
}

impl CSVHandler {
    pub fn new(date_format: impl Into<String>) -> Self {
        CSVHandler {
            date_format: date_format.into(),
        }
    }

    /// Parses every row of the file at `path`, keeping source order.
    pub fn read_dataset<P: AsRef<Path>>(&self, path: P) -> Result<Dataset, DataError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let delimiter = Self::detect_delimiter(path)?;
        let file = File::open(path).map_err(|e| DataError::unavailable(&display, e))?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| Self::classify(&display, 1, e))?
            .clone();
        reader.set_headers(Self::canonical_headers(&headers)?);

        let mut records = Vec::new();
        for (idx, result) in reader.deserialize::<RawRecord>().enumerate() {
            // header occupies line 1
            let line = idx + 2;
            let raw = result.map_err(|e| Self::classify(&display, line, e))?;
            if raw.is_blank() {
                continue;
            }
            records.push(self.to_record(line, raw)?);
        }

        if records.is_empty() {
            return Err(DataError::unavailable(display, "file has no data rows"));
        }

        Ok(Dataset::new(records))
    }

    fn detect_delimiter(path: &Path) -> Result<u8, DataError> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| DataError::unavailable(&display, e))?;

        let mut reader = BufReader::new(file);
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| DataError::unavailable(&display, e))?;

        if first_line.trim().is_empty() {
            return Err(DataError::unavailable(display, "file is empty"));
        }

        if first_line.contains(';') {
            Ok(b';')
        } else if first_line.contains('\t') {
            Ok(b'\t')
        } else {
            Ok(b',')
        }
    }

    fn canonical_headers(headers: &StringRecord) -> Result<StringRecord, DataError> {
        let canonical: Vec<String> = headers.iter().map(Self::canonical_header).collect();

        for required in REQUIRED_COLUMNS {
            match canonical.iter().filter(|h| h.as_str() == required).count() {
                0 => {
                    return Err(DataError::SchemaMismatch(format!(
                        "missing required column '{required}'"
                    )))
                }
                1 => {}
                _ => {
                    return Err(DataError::SchemaMismatch(format!(
                        "column '{required}' appears more than once"
                    )))
                }
            }
        }

        Ok(StringRecord::from(canonical))
    }

    fn canonical_header(header: &str) -> String {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        HEADER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| header.to_string())
    }

    fn to_record(&self, line: usize, raw: RawRecord) -> Result<Record, DataError> {
        if raw.country.is_empty() {
            return Err(DataError::SchemaMismatch(format!(
                "line {line}: country is empty"
            )));
        }

        let date = NaiveDate::parse_from_str(&raw.date, &self.date_format).map_err(|e| {
            DataError::SchemaMismatch(format!(
                "line {line}: date '{}' does not match format '{}': {e}",
                raw.date, self.date_format
            ))
        })?;

        Ok(Record {
            confirmed: parse_count(line, "confirmed", raw.confirmed.as_deref())?,
            deaths: parse_count(line, "deaths", raw.deaths.as_deref())?,
            recovered: parse_count(line, "recovered", raw.recovered.as_deref())?,
            country: raw.country,
            province: raw.province.filter(|p| !p.is_empty()),
            date,
            coordinates: raw.lat.zip(raw.long),
        })
    }

    fn classify(path: &str, line: usize, err: csv::Error) -> DataError {
        if err.is_io_error() {
            DataError::unavailable(path, err)
        } else {
            DataError::SchemaMismatch(format!("line {line}: {err}"))
        }
    }
}

/// Missing counts read as zero; fractional counts are truncated.
fn parse_count(line: usize, column: &str, value: Option<&str>) -> Result<u64, DataError> {
    let value = match value {
        None | Some("") => return Ok(0),
        Some(value) => value,
    };

    if let Ok(count) = value.parse::<u64>() {
        return Ok(count);
    }

    let invalid = || {
        DataError::SchemaMismatch(format!(
            "line {line}: {column} must be a non-negative count, got '{value}'"
        ))
    };

    let v: f64 = value.parse().map_err(|_| invalid())?;
    // u64::MAX rounds up to 2^64 as f64, so anything at or above it is out of range
    if !v.is_finite() || v < 0.0 || v >= u64::MAX as f64 {
        return Err(invalid());
    }
    if v.fract() != 0.0 {
        warn!("line {line}: fractional {column} value {value} truncated");
    }
    Ok(v.trunc() as u64)
}

/// Reads the dataset once and hands out the same shared copy afterwards.
///
/// Each session owns its own loader; there is no process-wide cache.
pub struct DatasetLoader {
    path: PathBuf,
    handler: CSVHandler,
    cache: OnceCell<Arc<Dataset>>,
}

impl DatasetLoader {
    pub fn new(path: impl Into<PathBuf>, date_format: impl Into<String>) -> Self {
        DatasetLoader {
            path: path.into(),
            handler: CSVHandler::new(date_format),
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Arc<Dataset>, DataError> {
        self.cache
            .get_or_try_init(|| -> Result<Arc<Dataset>, DataError> {
                info!("Loading dataset from {}", self.path.display());
                let dataset = self.handler.read_dataset(&self.path)?;
                info!(
                    "Loaded {} records for {} countries, latest date {}",
                    dataset.len(),
                    dataset.countries().len(),
                    dataset
                        .latest_date()
                        .map_or_else(|| "-".to_string(), |d| d.to_string())
                );
                Ok(Arc::new(dataset))
            })
            .map(Arc::clone)
    }

    /// Runs [`DatasetLoader::load`] on the blocking pool.
    pub async fn load_async(self: Arc<Self>) -> Result<Arc<Dataset>, DataError> {
        let path = self.path.display().to_string();
        task::spawn_blocking(move || self.load())
            .await
            .map_err(|e| DataError::unavailable(path, e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use test_log::test;

    const SAMPLE: &str = "\
Province/State,Country/Region,Lat,Long,Date,Confirmed,Deaths,Recovered,Active,WHO Region
,US,40.0,-100.0,2021-01-01,100,10,50,40,Americas
,US,40.0,-100.0,2021-01-02,150,12,80,58,Americas
,India,20.6,79.0,2021-01-02,200,5,100,95,South-East Asia
";

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn handler() -> CSVHandler {
        CSVHandler::new("%Y-%m-%d")
    }

    #[test]
    fn reads_province_country_layout() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "covid.csv", SAMPLE);

        let dataset = handler().read_dataset(&path).unwrap();
        assert_eq!(dataset.len(), 3);

        let first = &dataset.records()[0];
        assert_eq!(first.country, "US");
        assert_eq!(first.province, None);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!((first.confirmed, first.deaths, first.recovered), (100, 10, 50));
        assert_eq!(first.coordinates, Some((40.0, -100.0)));

        let countries: Vec<&str> = dataset.records().iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["US", "US", "India"]);
    }

    #[test]
    fn reads_semicolon_delimited_plain_headers() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "country;date;confirmed;deaths;recovered\nChile;2021-03-01;7;1;2\n",
        );

        let dataset = handler().read_dataset(&path).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].country, "Chile");
        assert_eq!(dataset.records()[0].coordinates, None);
    }

    #[test]
    fn reads_tab_delimited() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.tsv",
            "Country/Region\tDate\tConfirmed\tDeaths\tRecovered\nKorea, South\t2021-03-01\t9\t1\t4\n",
        );

        let dataset = handler().read_dataset(&path).unwrap();
        assert_eq!(dataset.len(), 1);
        let r = &dataset.records()[0];
        assert_eq!(r.country, "Korea, South");
        assert_eq!((r.confirmed, r.deaths, r.recovered), (9, 1, 4));
    }

    #[test]
    fn semicolon_wins_over_tab_and_comma() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country;Date;Confirmed;Deaths;Recovered;Note\nPeru;2021-03-01;3;0;1;a,b\tc\n",
        );

        let dataset = handler().read_dataset(&path).unwrap();
        assert_eq!(dataset.records()[0].country, "Peru");
    }

    #[test]
    fn quoted_country_with_comma_survives() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country/Region,Date,Confirmed,Deaths,Recovered\n\"Korea, South\",2021-01-01,5,0,1\n",
        );

        let dataset = handler().read_dataset(&path).unwrap();
        assert_eq!(dataset.records()[0].country, "Korea, South");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = handler()
            .read_dataset(dir.path().join("nope.csv"))
            .unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn empty_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "");
        let err = handler().read_dataset(&path).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn header_only_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "header.csv", "Country,Date,Confirmed,Deaths,Recovered\n");
        let err = handler().read_dataset(&path).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn missing_column_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country,Date,Confirmed,Deaths\nUS,2021-01-01,1,0\n",
        );
        let err = handler().read_dataset(&path).unwrap_err();
        assert_eq!(
            err,
            DataError::SchemaMismatch("missing required column 'recovered'".into())
        );
    }

    #[test]
    fn duplicated_column_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country,Country/Region,Date,Confirmed,Deaths,Recovered\nUS,US,2021-01-01,1,0,0\n",
        );
        let err = handler().read_dataset(&path).unwrap_err();
        assert!(matches!(err, DataError::SchemaMismatch(_)));
    }

    #[test]
    fn unparseable_date_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country,Date,Confirmed,Deaths,Recovered\nUS,01/02/2021,1,0,0\n",
        );
        let err = handler().read_dataset(&path).unwrap_err();
        match err {
            DataError::SchemaMismatch(msg) => assert!(msg.starts_with("line 2:")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn custom_date_format_is_honoured() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country,Date,Confirmed,Deaths,Recovered\nUS,01/02/21,1,0,0\n",
        );
        let dataset = CSVHandler::new("%m/%d/%y").read_dataset(&path).unwrap();
        assert_eq!(
            dataset.records()[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap()
        );
    }

    #[test]
    fn missing_and_fractional_counts() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country,Date,Confirmed,Deaths,Recovered\nUS,2021-01-01,12.0,,3.7\n,,,,\n",
        );
        let dataset = handler().read_dataset(&path).unwrap();
        assert_eq!(dataset.len(), 1);
        let r = &dataset.records()[0];
        assert_eq!((r.confirmed, r.deaths, r.recovered), (12, 0, 3));
    }

    #[test]
    fn negative_or_text_counts_are_rejected() {
        let dir = TempDir::new().unwrap();
        let negative = write_csv(
            &dir,
            "negative.csv",
            "Country,Date,Confirmed,Deaths,Recovered\nUS,2021-01-01,-1,0,0\n",
        );
        let text = write_csv(
            &dir,
            "text.csv",
            "Country,Date,Confirmed,Deaths,Recovered\nUS,2021-01-01,many,0,0\n",
        );
        assert!(matches!(
            handler().read_dataset(&negative),
            Err(DataError::SchemaMismatch(_))
        ));
        assert!(matches!(
            handler().read_dataset(&text),
            Err(DataError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn large_integer_counts_keep_full_precision() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "covid.csv",
            "Country,Date,Confirmed,Deaths,Recovered\nUS,2021-01-01,9007199254740993,18446744073709551615,1e3\n",
        );
        let dataset = handler().read_dataset(&path).unwrap();
        let r = &dataset.records()[0];
        assert_eq!(r.confirmed, 9_007_199_254_740_993);
        assert_eq!(r.deaths, u64::MAX);
        assert_eq!(r.recovered, 1000);
    }

    #[test]
    fn out_of_range_counts_are_rejected() {
        let dir = TempDir::new().unwrap();
        for (name, value) in [
            ("huge.csv", "1e30"),
            ("edge.csv", "18446744073709551616"),
            ("inf.csv", "inf"),
            ("nan.csv", "NaN"),
        ] {
            let path = write_csv(
                &dir,
                name,
                &format!("Country,Date,Confirmed,Deaths,Recovered\nUS,2021-01-01,{value},0,0\n"),
            );
            assert!(
                matches!(handler().read_dataset(&path), Err(DataError::SchemaMismatch(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn loader_reads_file_once() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "covid.csv", SAMPLE);
        let loader = DatasetLoader::new(&path, "%Y-%m-%d");

        let first = loader.load().unwrap();
        fs::remove_file(&path).unwrap();
        let second = loader.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn separate_loaders_converge_on_equal_datasets() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "covid.csv", SAMPLE);

        let a = DatasetLoader::new(&path, "%Y-%m-%d").load().unwrap();
        let b = DatasetLoader::new(&path, "%Y-%m-%d").load().unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), b.len());
        assert_eq!(*a, *b);
    }

    #[test]
    fn loader_does_not_cache_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.csv");
        let loader = DatasetLoader::new(&path, "%Y-%m-%d");

        assert!(loader.load().is_err());
        fs::write(&path, SAMPLE).unwrap();
        assert_eq!(loader.load().unwrap().len(), 3);
    }

    #[test]
    fn concurrent_first_load_shares_one_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "covid.csv", SAMPLE);
        let loader = Arc::new(DatasetLoader::new(&path, "%Y-%m-%d"));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let loader = Arc::clone(&loader);
                std::thread::spawn(move || loader.load().unwrap())
            })
            .collect();
        let results: Vec<Arc<Dataset>> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        assert!(results.iter().all(|d| Arc::ptr_eq(d, &results[0])));

        fs::remove_file(&path).unwrap();
        assert!(Arc::ptr_eq(&loader.load().unwrap(), &results[0]));
    }

    #[test(tokio::test)]
    async fn async_load_matches_sync_load() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "covid.csv", SAMPLE);
        let loader = Arc::new(DatasetLoader::new(&path, "%Y-%m-%d"));

        let dataset = loader.clone().load_async().await.unwrap();
        assert!(Arc::ptr_eq(&dataset, &loader.load().unwrap()));
    }
}
