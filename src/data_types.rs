// src/data_types.rs
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

/// One row of the case-count dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub province: Option<String>,
    pub date: NaiveDate,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
    /// (latitude, longitude)
    pub coordinates: Option<(f64, f64)>,
}

impl Record {
    pub fn metric(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Deaths => self.deaths,
            Metric::Recovered => self.recovered,
        }
    }
}

/// Rows in source order. Never mutated once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct country names, sorted ascending.
    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    /// A new dataset holding the rows matching `predicate`, source order kept.
    pub fn filtered<F>(&self, predicate: F) -> Dataset
    where
        F: Fn(&Record) -> bool,
    {
        Dataset {
            records: self
                .records
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }
}

/// All records sharing the latest date.
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub date: NaiveDate,
    pub records: Vec<&'a Record>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalSummary {
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryAggregate {
    pub country: String,
    pub confirmed: u64,
}

/// One country's records, one point per date, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    pub country: String,
    pub points: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryResolution {
    Resolved(String),
    NeedsSelection(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub confirmed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Confirmed, Metric::Deaths, Metric::Recovered];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Confirmed => "Confirmed",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
        };
        f.write_str(label)
    }
}

/// Sidebar navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    TopCountries,
    CountryInsights,
    About,
}

impl View {
    pub const ALL: [View; 4] = [
        View::Home,
        View::TopCountries,
        View::CountryInsights,
        View::About,
    ];
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            View::Home => "Home",
            View::TopCountries => "Top 10 Affected Countries",
            View::CountryInsights => "Country Insights",
            View::About => "About",
        };
        f.write_str(label)
    }
}
