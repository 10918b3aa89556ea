// Used Car Valuation Portal - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod dataset;
pub mod dashboard;
pub mod encoding;
pub mod features;
pub mod model;
pub mod estimator;
pub mod db;
pub mod pipeline;

// Re-export commonly used types
pub use dataset::{load_listings, CarListing, ReferenceOptions};
pub use dashboard::{
    avg_mileage_by_brand, avg_price_by_brand, avg_price_by_ownership, kpis, kms_vs_price,
    price_by_year, price_histogram, BrandStat, DashboardFilter, HistogramBin, Kpis,
    OwnershipStat, ScatterPoint,
};
pub use encoding::EncodingTable;
pub use features::{assemble, flag_as_int, FeatureRecord, FeatureValue, VehicleInput, FEATURE_NAMES};
pub use model::{ForestArtifact, ForestModel, PriceModel};
pub use estimator::{estimate, PriceRange, RANGE_FRACTION};
pub use db::{
    count_resale_records, insert_resale_record, round2, setup_database, RecordOutcome, Recorder,
    ResaleRecord,
};
pub use pipeline::{Valuation, ValuationContext, ValuationPaths};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
