// 💵 Price Estimator
// Invokes the frozen model on one assembled record and derives the
// low/high display range from the point estimate

use crate::features::FeatureRecord;
use crate::model::PriceModel;
use anyhow::Result;
use serde::Serialize;

/// Half-width of the displayed range as a fraction of the point estimate.
/// This is the value configured in production; user-facing copy describes a
/// wider band (see DESIGN.md).
pub const RANGE_FRACTION: f64 = 0.01;

// ============================================================================
// PRICE RANGE
// ============================================================================

/// Point estimate in lakhs plus the derived display bounds.
/// `low <= point <= high` holds by construction for any non-negative point
/// and fraction in (0, 1). Neither bound is clamped or rounded; rounding
/// happens only at the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub low: f64,
    pub point: f64,
    pub high: f64,
}

impl PriceRange {
    pub fn from_point(point: f64, fraction: f64) -> Self {
        PriceRange {
            low: point * (1.0 - fraction),
            point,
            high: point * (1.0 + fraction),
        }
    }

    /// The user-facing rendering of the range. The point estimate itself is
    /// never displayed, only persisted.
    pub fn display(&self) -> String {
        format!("₹ {:.2} - ₹ {:.2} Lakhs", self.low, self.high)
    }
}

/// Run inference on one record and derive the range. A model failure
/// (schema disagreement, malformed artifact) propagates as `Err` and is
/// fatal for the request; there is no fallback estimate.
pub fn estimate(
    record: &FeatureRecord,
    model: &dyn PriceModel,
    range_fraction: f64,
) -> Result<PriceRange> {
    let point = model.predict(record)?;
    Ok(PriceRange::from_point(point, range_fraction))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingTable;
    use crate::features::{assemble, VehicleInput};
    use anyhow::anyhow;

    struct StubModel {
        value: f64,
    }

    impl PriceModel for StubModel {
        fn predict(&self, _record: &FeatureRecord) -> Result<f64> {
            Ok(self.value)
        }
    }

    struct FailingModel;

    impl PriceModel for FailingModel {
        fn predict(&self, _record: &FeatureRecord) -> Result<f64> {
            Err(anyhow!("feature shape mismatch"))
        }
    }

    fn sample_record() -> FeatureRecord {
        let input = VehicleInput {
            brand: "Maruti".to_string(),
            model: "Swift".to_string(),
            registration_year: 2018,
            fuel_type: "Petrol".to_string(),
            seats: 5,
            transmission_type: "Manual".to_string(),
            ownership: "First Owner".to_string(),
            rto_state: "Karnataka".to_string(),
            engine_cc: 1197,
            kms_driven: 45000,
            engine_power_bhp: 81.8,
            mileage_kmpl: 21.2,
            has_parking_sensors: false,
            has_automatic_climate_control: false,
            has_rear_ac_vents: false,
            has_central_locking: false,
            has_air_purifier: false,
            new_vehicle_price_lakhs: 7.5,
        };
        let te = EncodingTable::new(Default::default(), 5.10);
        assemble(&input, &te, &te)
    }

    #[test]
    fn test_range_ordering_invariant() {
        for point in [0.0, 0.5, 4.2, 8.0, 150.0] {
            for fraction in [0.005, 0.01, 0.05, 0.5] {
                let range = PriceRange::from_point(point, fraction);
                assert!(range.low <= range.point, "low > point for {}", point);
                assert!(range.point <= range.high, "point > high for {}", point);
            }
        }
    }

    #[test]
    fn test_range_bounds_exact() {
        let range = PriceRange::from_point(8.0, 0.01);
        assert_eq!(range.low, 8.0 * 0.99);
        assert_eq!(range.high, 8.0 * 1.01);
    }

    #[test]
    fn test_display_format() {
        let range = PriceRange::from_point(8.0, 0.01);
        assert_eq!(range.display(), "₹ 7.92 - ₹ 8.08 Lakhs");
    }

    #[test]
    fn test_estimate_uses_model_point() {
        let model = StubModel { value: 6.4 };
        let range = estimate(&sample_record(), &model, RANGE_FRACTION).unwrap();
        assert_eq!(range.point, 6.4);
        assert_eq!(range.display(), "₹ 6.34 - ₹ 6.46 Lakhs");
    }

    #[test]
    fn test_model_failure_propagates() {
        let result = estimate(&sample_record(), &FailingModel, RANGE_FRACTION);
        assert!(result.is_err());
    }

    #[test]
    fn test_range_is_not_rounded() {
        let model = StubModel { value: 4.567 };
        let range = estimate(&sample_record(), &model, 0.01).unwrap();
        // 4.567 * 0.99 keeps full precision; only the persisted point is
        // rounded to 2dp
        assert_eq!(range.low, 4.567 * 0.99);
        assert_eq!(range.point, 4.567);
    }
}
