// 📊 Analytics Dashboard Aggregates
// Pure filter/aggregate functions over the reference dataset; the server
// serializes these straight into the dashboard page

use crate::dataset::CarListing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// FILTER
// ============================================================================

/// Sidebar filter selection. `None` for a field means "all values"; the
/// year range is inclusive on both ends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardFilter {
    pub brands: Option<Vec<String>>,
    pub ownerships: Option<Vec<String>>,
    pub fuel_types: Option<Vec<String>>,
    pub rto_states: Option<Vec<String>>,
    pub transmission_types: Option<Vec<String>>,
    pub year_range: Option<(i64, i64)>,
}

impl DashboardFilter {
    pub fn matches(&self, listing: &CarListing) -> bool {
        fn included(selection: &Option<Vec<String>>, value: &str) -> bool {
            match selection {
                Some(values) => values.iter().any(|v| v == value),
                None => true,
            }
        }

        included(&self.brands, &listing.brand)
            && included(&self.ownerships, &listing.ownership)
            && included(&self.fuel_types, &listing.fuel_type)
            && included(&self.rto_states, &listing.rto_state)
            && included(&self.transmission_types, &listing.transmission_type)
            && match self.year_range {
                Some((min, max)) => {
                    listing.registration_year >= min && listing.registration_year <= max
                }
                None => true,
            }
    }

    pub fn apply<'a>(&self, listings: &'a [CarListing]) -> Vec<&'a CarListing> {
        listings.iter().filter(|l| self.matches(l)).collect()
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Headline metrics shown above the charts.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub total_cars: usize,
    pub avg_price_lakhs: f64,
    pub avg_mileage_kmpl: f64,
}

pub fn kpis(listings: &[&CarListing]) -> Kpis {
    Kpis {
        total_cars: listings.len(),
        avg_price_lakhs: mean(listings.iter().map(|l| l.vehicle_price_lakhs)),
        avg_mileage_kmpl: mean(listings.iter().map(|l| l.mileage_kmpl)),
    }
}

/// One bar of a per-brand chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BrandStat {
    pub brand: String,
    pub value: f64,
    pub count: usize,
}

/// Mean resale price per brand, descending, capped at `top` bars.
pub fn avg_price_by_brand(listings: &[&CarListing], top: usize) -> Vec<BrandStat> {
    let mut stats = group_mean(listings, |l| &l.brand, |l| l.vehicle_price_lakhs);
    stats.sort_by(|a, b| b.value.total_cmp(&a.value));
    stats.truncate(top);
    stats
}

/// Mean mileage per brand, descending.
pub fn avg_mileage_by_brand(listings: &[&CarListing]) -> Vec<BrandStat> {
    let mut stats = group_mean(listings, |l| &l.brand, |l| l.mileage_kmpl);
    stats.sort_by(|a, b| b.value.total_cmp(&a.value));
    stats
}

/// One point of the ownership-vs-price line.
#[derive(Debug, Clone, Serialize)]
pub struct OwnershipStat {
    pub ownership: String,
    pub avg_price_lakhs: f64,
    pub count: usize,
}

/// Mean resale price per ownership category, sorted by label so the line
/// renders in a stable order.
pub fn avg_price_by_ownership(listings: &[&CarListing]) -> Vec<OwnershipStat> {
    let mut stats: Vec<OwnershipStat> =
        group_mean(listings, |l| &l.ownership, |l| l.vehicle_price_lakhs)
            .into_iter()
            .map(|s| OwnershipStat {
                ownership: s.brand,
                avg_price_lakhs: s.value,
                count: s.count,
            })
            .collect();
    stats.sort_by(|a, b| a.ownership.cmp(&b.ownership));
    stats
}

/// One bin of the price-distribution histogram; `[low, high)` except the
/// last bin, which is closed on both ends.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramBin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

pub fn price_histogram(listings: &[&CarListing], nbins: usize) -> Vec<HistogramBin> {
    if listings.is_empty() || nbins == 0 {
        return Vec::new();
    }

    let prices: Vec<f64> = listings.iter().map(|l| l.vehicle_price_lakhs).collect();
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / nbins as f64 } else { 1.0 };

    let mut bins: Vec<HistogramBin> = (0..nbins)
        .map(|i| HistogramBin {
            low: min + i as f64 * width,
            high: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for price in prices {
        let mut idx = ((price - min) / width) as usize;
        if idx >= nbins {
            idx = nbins - 1;
        }
        bins[idx].count += 1;
    }

    bins
}

/// One point of a scatter series.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Kilometers driven vs resale price.
pub fn kms_vs_price(listings: &[&CarListing]) -> Vec<ScatterPoint> {
    listings
        .iter()
        .map(|l| ScatterPoint {
            x: l.kms_driven as f64,
            y: l.vehicle_price_lakhs,
        })
        .collect()
}

/// Registration year vs resale price.
pub fn price_by_year(listings: &[&CarListing]) -> Vec<ScatterPoint> {
    listings
        .iter()
        .map(|l| ScatterPoint {
            x: l.registration_year as f64,
            y: l.vehicle_price_lakhs,
        })
        .collect()
}

// ============================================================================
// HELPERS
// ============================================================================

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn group_mean<'a, K, V>(listings: &[&'a CarListing], key: K, value: V) -> Vec<BrandStat>
where
    K: Fn(&'a CarListing) -> &'a String,
    V: Fn(&'a CarListing) -> f64,
{
    let mut groups: HashMap<&str, (f64, usize)> = HashMap::new();
    for listing in listings {
        let entry = groups.entry(key(listing)).or_insert((0.0, 0));
        entry.0 += value(listing);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(label, (sum, count))| BrandStat {
            brand: label.to_string(),
            value: sum / count as f64,
            count,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
