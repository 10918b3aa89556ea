// 🧩 Feature Assembler
// Combines raw user attributes and encoder outputs into the fixed-order
// record the frozen regression model was trained on

use crate::encoding::EncodingTable;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// Field names in the exact order the frozen model expects. This is a
/// structural contract with the external model artifact; the names carry
/// the training-time column labels verbatim, units and all.
pub const FEATURE_NAMES: [&str; 18] = [
    "brand",
    "registration_year",
    "fuel_type",
    "seats",
    "transmission_type",
    "ownership",
    "engine(cc)",
    "kms_driven",
    "engine_power(bhp)",
    "mileage(kmpl)",
    "has_parking_sensors",
    "has_automatic_climate_control",
    "has_rear_ac_vents",
    "has_central_locking",
    "has_air_purifier",
    "new_vehicle_price(lakhs)",
    "model_te",
    "rto_te",
];

// ============================================================================
// RAW SUBMISSION
// ============================================================================

/// One user submission, exactly as collected by the form. Numeric bounds
/// are enforced by the input widgets, not re-validated here. The five
/// feature flags accept either JSON booleans or the form's "Yes"/"No"
/// strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleInput {
    pub brand: String,
    pub model: String,
    pub registration_year: i64,
    pub fuel_type: String,
    pub seats: i64,
    pub transmission_type: String,
    pub ownership: String,
    pub rto_state: String,
    pub engine_cc: i64,
    pub kms_driven: i64,
    pub engine_power_bhp: f64,
    pub mileage_kmpl: f64,
    #[serde(with = "yes_no")]
    pub has_parking_sensors: bool,
    #[serde(with = "yes_no")]
    pub has_automatic_climate_control: bool,
    #[serde(with = "yes_no")]
    pub has_rear_ac_vents: bool,
    #[serde(with = "yes_no")]
    pub has_central_locking: bool,
    #[serde(with = "yes_no")]
    pub has_air_purifier: bool,
    pub new_vehicle_price_lakhs: f64,
}

/// Serde adapter for the form's Yes/No selects. Deserializes either a JSON
/// bool or "Yes"/"No" (case-insensitive); serializes back to "Yes"/"No".
/// No third state is representable.
pub mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.to_lowercase().as_str() {
                "yes" => Ok(true),
                "no" => Ok(false),
                other => Err(serde::de::Error::custom(format!(
                    "expected \"Yes\" or \"No\", got \"{}\"",
                    other
                ))),
            },
        }
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }
}

/// Coerce a feature flag to the 0/1 integer the model and the sink schema use.
pub fn flag_as_int(flag: bool) -> i64 {
    if flag {
        1
    } else {
        0
    }
}

// ============================================================================
// FEATURE RECORD
// ============================================================================

/// A single feature value as seen by the model boundary: raw categorical
/// strings pass through for the model artifact to resolve, everything else
/// is numeric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Numeric(f64),
    Categorical(&'a str),
}

/// The assembled, fixed-order input to the frozen model: raw numerics
/// verbatim, flags coerced to {0,1}, and the two target-encoded scalars
/// replacing the raw model/state strings. Immutable once assembled and
/// consumed exactly once per submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub brand: String,
    pub registration_year: f64,
    pub fuel_type: String,
    pub seats: f64,
    pub transmission_type: String,
    pub ownership: String,
    pub engine_cc: f64,
    pub kms_driven: f64,
    pub engine_power_bhp: f64,
    pub mileage_kmpl: f64,
    pub has_parking_sensors: f64,
    pub has_automatic_climate_control: f64,
    pub has_rear_ac_vents: f64,
    pub has_central_locking: f64,
    pub has_air_purifier: f64,
    pub new_vehicle_price_lakhs: f64,
    pub model_te: f64,
    pub rto_te: f64,
}

impl FeatureRecord {
    /// Fields in model order, paired with their training-time names.
    /// The order here must stay in lockstep with [`FEATURE_NAMES`].
    pub fn values(&self) -> Vec<(&'static str, FeatureValue<'_>)> {
        vec![
            ("brand", FeatureValue::Categorical(&self.brand)),
            ("registration_year", FeatureValue::Numeric(self.registration_year)),
            ("fuel_type", FeatureValue::Categorical(&self.fuel_type)),
            ("seats", FeatureValue::Numeric(self.seats)),
            ("transmission_type", FeatureValue::Categorical(&self.transmission_type)),
            ("ownership", FeatureValue::Categorical(&self.ownership)),
            ("engine(cc)", FeatureValue::Numeric(self.engine_cc)),
            ("kms_driven", FeatureValue::Numeric(self.kms_driven)),
            ("engine_power(bhp)", FeatureValue::Numeric(self.engine_power_bhp)),
            ("mileage(kmpl)", FeatureValue::Numeric(self.mileage_kmpl)),
            ("has_parking_sensors", FeatureValue::Numeric(self.has_parking_sensors)),
            (
                "has_automatic_climate_control",
                FeatureValue::Numeric(self.has_automatic_climate_control),
            ),
            ("has_rear_ac_vents", FeatureValue::Numeric(self.has_rear_ac_vents)),
            ("has_central_locking", FeatureValue::Numeric(self.has_central_locking)),
            ("has_air_purifier", FeatureValue::Numeric(self.has_air_purifier)),
            (
                "new_vehicle_price(lakhs)",
                FeatureValue::Numeric(self.new_vehicle_price_lakhs),
            ),
            ("model_te", FeatureValue::Numeric(self.model_te)),
            ("rto_te", FeatureValue::Numeric(self.rto_te)),
        ]
    }
}

/// Build the model input from a raw submission. The raw model name and RTO
/// state are consumed by the encoders and do not appear in the record;
/// everything else passes through verbatim. Pure transformation, no side
/// effects.
pub fn assemble(
    input: &VehicleInput,
    model_te: &EncodingTable,
    rto_te: &EncodingTable,
) -> FeatureRecord {
    FeatureRecord {
        brand: input.brand.clone(),
        registration_year: input.registration_year as f64,
        fuel_type: input.fuel_type.clone(),
        seats: input.seats as f64,
        transmission_type: input.transmission_type.clone(),
        ownership: input.ownership.clone(),
        engine_cc: input.engine_cc as f64,
        kms_driven: input.kms_driven as f64,
        engine_power_bhp: input.engine_power_bhp,
        mileage_kmpl: input.mileage_kmpl,
        has_parking_sensors: flag_as_int(input.has_parking_sensors) as f64,
        has_automatic_climate_control: flag_as_int(input.has_automatic_climate_control) as f64,
        has_rear_ac_vents: flag_as_int(input.has_rear_ac_vents) as f64,
        has_central_locking: flag_as_int(input.has_central_locking) as f64,
        has_air_purifier: flag_as_int(input.has_air_purifier) as f64,
        new_vehicle_price_lakhs: input.new_vehicle_price_lakhs,
        model_te: model_te.encode(&input.model),
        rto_te: rto_te.encode(&input.rto_state),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    pub fn sample_input() -> VehicleInput {
        VehicleInput {
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
            has_parking_sensors: true,
            has_automatic_climate_control: false,
            has_rear_ac_vents: false,
            has_central_locking: true,
            has_air_purifier: false,
            new_vehicle_price_lakhs: 7.5,
        }
    }

    fn tables() -> (EncodingTable, EncodingTable) {
        let mut model_stats = HashMap::new();
        model_stats.insert("Swift".to_string(), 3.21);
        let mut rto_stats = HashMap::new();
        rto_stats.insert("Karnataka".to_string(), 5.95);
        (
            EncodingTable::new(model_stats, 5.10),
            EncodingTable::new(rto_stats, 5.10),
        )
    }

    #[test]
    fn test_assemble_encodes_known_model() {
        let (model_te, rto_te) = tables();
        let record = assemble(&sample_input(), &model_te, &rto_te);
        assert_eq!(record.model_te, 3.21);
        assert_eq!(record.rto_te, 5.95);
    }

    #[test]
    fn test_assemble_falls_back_for_unseen_model() {
        let (model_te, rto_te) = tables();
        let mut input = sample_input();
        input.model = "XYZ-Unlisted".to_string();
        let record = assemble(&input, &model_te, &rto_te);
        assert_eq!(record.model_te, 5.10);
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let (model_te, rto_te) = tables();
        let input = sample_input();
        let first = assemble(&input, &model_te, &rto_te);
        let second = assemble(&input, &model_te, &rto_te);
        assert_eq!(first, second);
    }

    #[test]
    fn test_assemble_coerces_flags_to_zero_one() {
        let (model_te, rto_te) = tables();
        let record = assemble(&sample_input(), &model_te, &rto_te);
        assert_eq!(record.has_parking_sensors, 1.0);
        assert_eq!(record.has_automatic_climate_control, 0.0);
        assert_eq!(record.has_central_locking, 1.0);
        assert_eq!(record.has_air_purifier, 0.0);
    }

    #[test]
    fn test_record_values_match_feature_names_in_order() {
        let (model_te, rto_te) = tables();
        let record = assemble(&sample_input(), &model_te, &rto_te);
        let values = record.values();
        assert_eq!(values.len(), FEATURE_NAMES.len());
        for (i, (name, _)) in values.iter().enumerate() {
            assert_eq!(*name, FEATURE_NAMES[i]);
        }
    }

    #[test]
    fn test_yes_no_deserializes_strings_and_bools() {
        let json = r#"{
            "brand": "Maruti", "model": "Swift", "registration_year": 2018,
            "fuel_type": "Petrol", "seats": 5, "transmission_type": "Manual",
            "ownership": "First Owner", "rto_state": "Karnataka",
            "engine_cc": 1197, "kms_driven": 45000, "engine_power_bhp": 81.8,
            "mileage_kmpl": 21.2,
            "has_parking_sensors": "Yes",
            "has_automatic_climate_control": "No",
            "has_rear_ac_vents": false,
            "has_central_locking": true,
            "has_air_purifier": "no",
            "new_vehicle_price_lakhs": 7.5
        }"#;
        let input: VehicleInput = serde_json::from_str(json).unwrap();
        assert!(input.has_parking_sensors);
        assert!(!input.has_automatic_climate_control);
        assert!(!input.has_rear_ac_vents);
        assert!(input.has_central_locking);
        assert!(!input.has_air_purifier);
    }

    #[test]
    fn test_yes_no_rejects_third_state() {
        let json = r#"{
            "brand": "Maruti", "model": "Swift", "registration_year": 2018,
            "fuel_type": "Petrol", "seats": 5, "transmission_type": "Manual",
            "ownership": "First Owner", "rto_state": "Karnataka",
            "engine_cc": 1197, "kms_driven": 45000, "engine_power_bhp": 81.8,
            "mileage_kmpl": 21.2,
            "has_parking_sensors": "Maybe",
            "has_automatic_climate_control": "No",
            "has_rear_ac_vents": "No",
            "has_central_locking": "No",
            "has_air_purifier": "No",
            "new_vehicle_price_lakhs": 7.5
        }"#;
        assert!(serde_json::from_str::<VehicleInput>(json).is_err());
    }

    #[test]
    fn test_yes_no_roundtrip() {
        let input = sample_input();
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"has_parking_sensors\":\"Yes\""));
        let back: VehicleInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.has_parking_sensors, input.has_parking_sensors);
    }
}
