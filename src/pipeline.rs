// 🔁 Submission Pipeline
// One stateless request-response cycle per submission:
// raw input → assemble (encoders) → estimate → display range → record.
// Only the read-only startup state is shared across submissions.

use crate::dataset::{load_listings, CarListing, ReferenceOptions};
use crate::db::{RecordOutcome, Recorder};
use crate::encoding::EncodingTable;
use crate::estimator::{estimate, PriceRange, RANGE_FRACTION};
use crate::features::{assemble, VehicleInput};
use crate::model::{ForestModel, PriceModel};
use anyhow::Result;
use std::env;
use std::path::PathBuf;

// ============================================================================
// PATHS
// ============================================================================

/// Locations of the external collaborators: the reference dataset, the
/// offline-produced encoding artifacts, the frozen model, and the sink.
#[derive(Debug, Clone)]
pub struct ValuationPaths {
    pub dataset: PathBuf,
    pub model_te: PathBuf,
    pub rto_te: PathBuf,
    pub global_mean: PathBuf,
    pub price_model: PathBuf,
    pub sink_db: PathBuf,
}

impl Default for ValuationPaths {
    fn default() -> Self {
        ValuationPaths {
            dataset: PathBuf::from("data/cars_updated.csv"),
            model_te: PathBuf::from("artifacts/model_te.json"),
            rto_te: PathBuf::from("artifacts/rto_te.json"),
            global_mean: PathBuf::from("artifacts/global_mean.json"),
            price_model: PathBuf::from("artifacts/price_model.json"),
            sink_db: PathBuf::from("cars_resale.db"),
        }
    }
}

impl ValuationPaths {
    /// Defaults with per-path environment overrides (CARS_DATASET,
    /// CARS_MODEL_TE, CARS_RTO_TE, CARS_GLOBAL_MEAN, CARS_PRICE_MODEL,
    /// CARS_SINK_DB).
    pub fn from_env() -> Self {
        fn path_or(var: &str, default: PathBuf) -> PathBuf {
            env::var(var).map(PathBuf::from).unwrap_or(default)
        }

        let defaults = ValuationPaths::default();
        ValuationPaths {
            dataset: path_or("CARS_DATASET", defaults.dataset),
            model_te: path_or("CARS_MODEL_TE", defaults.model_te),
            rto_te: path_or("CARS_RTO_TE", defaults.rto_te),
            global_mean: path_or("CARS_GLOBAL_MEAN", defaults.global_mean),
            price_model: path_or("CARS_PRICE_MODEL", defaults.price_model),
            sink_db: path_or("CARS_SINK_DB", defaults.sink_db),
        }
    }
}

// ============================================================================
// VALUATION RESULT
// ============================================================================

/// Result of one submission. The range is what the user sees; the outcome
/// reports the best-effort persistence write alongside it.
#[derive(Debug, Clone)]
pub struct Valuation {
    pub range: PriceRange,
    pub display: String,
    pub outcome: RecordOutcome,
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Everything loaded once at process start and shared read-only for the
/// process lifetime. Explicitly constructed and passed into components;
/// there is no ambient global state.
pub struct ValuationContext {
    listings: Vec<CarListing>,
    options: ReferenceOptions,
    model_te: EncodingTable,
    rto_te: EncodingTable,
    model: Box<dyn PriceModel>,
    range_fraction: f64,
    recorder: Recorder,
}

impl ValuationContext {
    /// Load all external collaborators from disk. Any missing or malformed
    /// artifact is a startup failure; nothing here is lazily loaded.
    pub fn load(paths: &ValuationPaths) -> Result<Self> {
        let listings = load_listings(&paths.dataset)?;
        let options = ReferenceOptions::from_listings(&listings);
        let model_te = EncodingTable::from_files(&paths.model_te, &paths.global_mean)?;
        let rto_te = EncodingTable::from_files(&paths.rto_te, &paths.global_mean)?;
        let model = ForestModel::from_file(&paths.price_model)?;

        Ok(ValuationContext {
            listings,
            options,
            model_te,
            rto_te,
            model: Box::new(model),
            range_fraction: RANGE_FRACTION,
            recorder: Recorder::new(&paths.sink_db),
        })
    }

    /// Assemble a context from parts. Tests use this to inject stub models
    /// and throwaway sinks.
    pub fn new(
        listings: Vec<CarListing>,
        model_te: EncodingTable,
        rto_te: EncodingTable,
        model: Box<dyn PriceModel>,
        range_fraction: f64,
        recorder: Recorder,
    ) -> Self {
        let options = ReferenceOptions::from_listings(&listings);
        ValuationContext {
            listings,
            options,
            model_te,
            rto_te,
            model,
            range_fraction,
            recorder,
        }
    }

    pub fn listings(&self) -> &[CarListing] {
        &self.listings
    }

    pub fn options(&self) -> &ReferenceOptions {
        &self.options
    }

    pub fn range_fraction(&self) -> f64 {
        self.range_fraction
    }

    /// Run one submission to completion. Estimator failure is the only
    /// `Err` (fatal for this request); a failed persistence write comes
    /// back as `RecordOutcome::Failed` with the range intact.
    pub fn submit(&self, input: &VehicleInput) -> Result<Valuation> {
        let record = assemble(input, &self.model_te, &self.rto_te);
        let range = estimate(&record, self.model.as_ref(), self.range_fraction)?;

        // The range is final from here on; recording is a side channel
        let outcome = self.recorder.record(input, range.point);

        Ok(Valuation {
            range,
            display: range.display(),
            outcome,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
