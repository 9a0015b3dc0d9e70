// src/query.rs
//! Pure projections over a loaded [`Dataset`], one per dashboard view.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::debug;

use crate::data_types::{
    CountryAggregate, CountryResolution, CountrySeries, Dataset, GlobalSummary, MapPoint, Record,
    Snapshot,
};
use crate::error::DataError;

/// Every record dated on the dataset's latest date.
pub fn latest_snapshot(dataset: &Dataset) -> Result<Snapshot<'_>, DataError> {
    let date = dataset.latest_date().ok_or(DataError::EmptyAggregate)?;
    let records = dataset
        .records()
        .iter()
        .filter(|r| r.date == date)
        .collect();

    Ok(Snapshot { date, records })
}

/// Straight column sums over the latest snapshot. Zero when there is nothing to sum,
/// and pinned at `u64::MAX` rather than wrapping.
pub fn global_summary(dataset: &Dataset) -> GlobalSummary {
    let snapshot = match latest_snapshot(dataset) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            debug!("global summary over empty dataset: {err}");
            return GlobalSummary::default();
        }
    };
    debug!(
        "global summary over {} records dated {}",
        snapshot.records.len(),
        snapshot.date
    );

    snapshot
        .records
        .iter()
        .fold(GlobalSummary::default(), |acc, r| GlobalSummary {
            confirmed: acc.confirmed.saturating_add(r.confirmed),
            deaths: acc.deaths.saturating_add(r.deaths),
            recovered: acc.recovered.saturating_add(r.recovered),
        })
}

/// Latest-date confirmed cases per country, largest first, ties by name.
pub fn country_totals(dataset: &Dataset) -> Vec<CountryAggregate> {
    let snapshot = match latest_snapshot(dataset) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            debug!("country totals over empty dataset: {err}");
            return Vec::new();
        }
    };

    let mut totals: HashMap<&str, u64> = HashMap::new();
    for r in &snapshot.records {
        let total = totals.entry(r.country.as_str()).or_default();
        *total = total.saturating_add(r.confirmed);
    }

    let mut ranked: Vec<CountryAggregate> = totals
        .into_iter()
        .map(|(country, confirmed)| CountryAggregate {
            country: country.to_string(),
            confirmed,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.confirmed
            .cmp(&a.confirmed)
            .then_with(|| a.country.cmp(&b.country))
    });
    ranked
}

pub fn top_countries(dataset: &Dataset, n: usize) -> Vec<CountryAggregate> {
    let mut ranked = country_totals(dataset);
    ranked.truncate(n);
    ranked
}

/// Trims and title-cases a free-text country search.
///
/// A letter is uppercased when the character before it is not a letter,
/// and lowercased otherwise, so `"bosnia and herzegovina "` becomes
/// `"Bosnia And Herzegovina"`.
pub fn normalize_search(term: &str) -> String {
    let mut previous_is_letter = false;
    let mut normalized = String::with_capacity(term.len());

    for c in term.trim().chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                normalized.extend(c.to_lowercase());
            } else {
                normalized.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            normalized.push(c);
            previous_is_letter = false;
        }
    }

    normalized
}

/// Exact match of the normalized term against the known countries, or the
/// full sorted list for the caller to pick from. No partial matching.
pub fn resolve_country(dataset: &Dataset, term: Option<&str>) -> CountryResolution {
    let countries = dataset.countries();

    if let Some(term) = term {
        let normalized = normalize_search(term);
        if !normalized.is_empty() && countries.binary_search(&normalized).is_ok() {
            return CountryResolution::Resolved(normalized);
        }
    }

    CountryResolution::NeedsSelection(countries)
}

/// The country's rows, oldest first. Rows sharing a date (sub-national
/// entries) are summed into one point.
pub fn country_series(dataset: &Dataset, country: &str) -> Result<CountrySeries, DataError> {
    let rows = dataset.filtered(|r| r.country == country);
    if rows.is_empty() {
        return Err(DataError::UnknownCountry(country.to_string()));
    }

    let mut by_date: BTreeMap<NaiveDate, Record> = BTreeMap::new();
    for r in rows.records() {
        by_date
            .entry(r.date)
            .and_modify(|point| {
                point.confirmed = point.confirmed.saturating_add(r.confirmed);
                point.deaths = point.deaths.saturating_add(r.deaths);
                point.recovered = point.recovered.saturating_add(r.recovered);
                point.province = None;
            })
            .or_insert_with(|| r.clone());
    }

    Ok(CountrySeries {
        country: country.to_string(),
        points: by_date.into_values().collect(),
    })
}

pub fn latest_country_record(series: &CountrySeries) -> Option<&Record> {
    series.points.last()
}

/// Per-country bubbles for the latest snapshot, in ranking order, positioned
/// at the mean of the country's coordinates. Countries without coordinates
/// are skipped.
pub fn map_points(dataset: &Dataset) -> Vec<MapPoint> {
    let Ok(snapshot) = latest_snapshot(dataset) else {
        return Vec::new();
    };

    // country -> (lat sum, long sum, located rows)
    let mut located: HashMap<&str, (f64, f64, u32)> = HashMap::new();
    for r in &snapshot.records {
        if let Some((lat, long)) = r.coordinates {
            let entry = located.entry(r.country.as_str()).or_insert((0.0, 0.0, 0));
            entry.0 += lat;
            entry.1 += long;
            entry.2 += 1;
        }
    }

    country_totals(dataset)
        .into_iter()
        .filter_map(|total| {
            let (lat, long, rows) = *located.get(total.country.as_str())?;
            Some(MapPoint {
                latitude: lat / f64::from(rows),
                longitude: long / f64::from(rows),
                confirmed: total.confirmed,
                country: total.country,
            })
        })
        .collect()
}
