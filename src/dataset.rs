// 🚗 Reference Dataset
// Loads the historical listings CSV once at startup; drives the dashboard
// aggregates and the selection options on the prediction form

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

// ============================================================================
// LISTING
// ============================================================================

/// One historical listing from the source CSV. Column headers carry the
/// training-time names, units and all. Columns this system never reads are
/// ignored at deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarListing {
    pub brand: String,
    pub model: String,
    pub registration_year: i64,
    pub fuel_type: String,
    pub transmission_type: String,
    pub ownership: String,
    pub rto_state: String,
    pub kms_driven: i64,
    #[serde(rename = "mileage(kmpl)")]
    pub mileage_kmpl: f64,
    #[serde(rename = "vehicle_price(lakhs)")]
    pub vehicle_price_lakhs: f64,
}

/// Load the reference dataset. Called once at process start; the returned
/// listings are read-only for the process lifetime.
pub fn load_listings(csv_path: &Path) -> Result<Vec<CarListing>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open dataset CSV: {:?}", csv_path))?;

    let mut listings = Vec::new();
    for result in rdr.deserialize() {
        let listing: CarListing = result.context("Failed to deserialize listing row")?;
        listings.push(listing);
    }

    Ok(listings)
}

// ============================================================================
// REFERENCE OPTIONS
// ============================================================================

/// Sorted distinct values used to populate the selection widgets on the
/// prediction form and the dashboard filters. Free-text entry for brand and
/// model is layered on top of these upstream ("Other (Not Listed)").
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceOptions {
    pub brands: Vec<String>,
    pub models: Vec<String>,
    pub fuel_types: Vec<String>,
    pub transmission_types: Vec<String>,
    pub ownerships: Vec<String>,
    pub rto_states: Vec<String>,
    pub year_min: i64,
    pub year_max: i64,
}

impl ReferenceOptions {
    pub fn from_listings(listings: &[CarListing]) -> Self {
        fn distinct_sorted<'a, I>(values: I) -> Vec<String>
        where
            I: Iterator<Item = &'a str>,
        {
            let set: BTreeSet<&str> = values.collect();
            set.into_iter().map(|s| s.to_string()).collect()
        }

        let year_min = listings.iter().map(|l| l.registration_year).min().unwrap_or(2000);
        let year_max = listings.iter().map(|l| l.registration_year).max().unwrap_or(2024);

        ReferenceOptions {
            brands: distinct_sorted(listings.iter().map(|l| l.brand.as_str())),
            models: distinct_sorted(listings.iter().map(|l| l.model.as_str())),
            fuel_types: distinct_sorted(listings.iter().map(|l| l.fuel_type.as_str())),
            transmission_types: distinct_sorted(
                listings.iter().map(|l| l.transmission_type.as_str()),
            ),
            ownerships: distinct_sorted(listings.iter().map(|l| l.ownership.as_str())),
            rto_states: distinct_sorted(listings.iter().map(|l| l.rto_state.as_str())),
            year_min,
            year_max,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
