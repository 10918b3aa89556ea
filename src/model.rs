// 📦 Frozen Price Model
// The trained regression model is an injected capability: one predict
// operation over one feature record. This module loads the offline-exported
// forest artifact and evaluates it; it never trains anything.

use crate::features::{FeatureRecord, FeatureValue, FEATURE_NAMES};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// MODEL CAPABILITY
// ============================================================================

/// The one operation the system needs from the trained model. Production
/// uses [`ForestModel`]; tests inject stubs returning fixed values.
pub trait PriceModel: Send + Sync {
    /// Point estimate in lakhs for one assembled record. A record whose
    /// shape disagrees with the artifact's schema is a configuration error
    /// surfaced as `Err`, never silently defaulted.
    fn predict(&self, record: &FeatureRecord) -> Result<f64>;
}

// ============================================================================
// FOREST ARTIFACT
// ============================================================================

/// On-disk form of the gradient-boosted forest, dumped to JSON by the
/// offline training job. Categorical features carry their training-time
/// level lists; splits compare the level's code, and unseen levels take a
/// split's default (missing-value) direction.
#[derive(Debug, Clone, Deserialize)]
pub struct ForestArtifact {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        default_left: bool,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

// ============================================================================
// FOREST MODEL
// ============================================================================

pub struct ForestModel {
    artifact: ForestArtifact,
    /// Level -> code, per categorical feature, precomputed at load.
    category_codes: HashMap<String, HashMap<String, f64>>,
}

impl ForestModel {
    /// Load and validate the artifact. The feature-name list must match the
    /// assembler's schema exactly (names and order); a disagreement means
    /// the artifact and this binary were built against different training
    /// runs and is fatal here rather than at predict time.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read model artifact: {:?}", path.as_ref()))?;
        let artifact: ForestArtifact =
            serde_json::from_str(&json).context("Failed to parse model artifact JSON")?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self> {
        if artifact.feature_names.len() != FEATURE_NAMES.len() {
            bail!(
                "Model artifact expects {} features, assembler produces {}",
                artifact.feature_names.len(),
                FEATURE_NAMES.len()
            );
        }
        for (i, name) in artifact.feature_names.iter().enumerate() {
            if name != FEATURE_NAMES[i] {
                bail!(
                    "Model artifact feature {} is {:?}, assembler produces {:?}",
                    i,
                    name,
                    FEATURE_NAMES[i]
                );
            }
        }

        let mut category_codes = HashMap::new();
        for (feature, levels) in &artifact.categories {
            let codes: HashMap<String, f64> = levels
                .iter()
                .enumerate()
                .map(|(code, level)| (level.clone(), code as f64))
                .collect();
            category_codes.insert(feature.clone(), codes);
        }

        Ok(ForestModel {
            artifact,
            category_codes,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.artifact.trees.len()
    }

    /// Flatten the record into the artifact's feature space. Categorical
    /// values become their training-time codes; unseen levels become NaN so
    /// tree traversal takes each split's default branch.
    fn encode_features(&self, record: &FeatureRecord) -> Result<Vec<f64>> {
        let values = record.values();
        let mut xs = Vec::with_capacity(values.len());

        for (name, value) in values {
            match value {
                FeatureValue::Numeric(v) => xs.push(v),
                FeatureValue::Categorical(raw) => {
                    let codes = self.category_codes.get(name).ok_or_else(|| {
                        anyhow!("Model artifact has no category levels for feature {:?}", name)
                    })?;
                    xs.push(codes.get(raw).copied().unwrap_or(f64::NAN));
                }
            }
        }

        Ok(xs)
    }

    fn eval_tree(&self, tree: &Tree, xs: &[f64]) -> Result<f64> {
        let mut idx = 0usize;
        loop {
            let node = tree
                .nodes
                .get(idx)
                .ok_or_else(|| anyhow!("Tree node index {} out of range", idx))?;

            match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    let x = *xs.get(*feature).ok_or_else(|| {
                        anyhow!("Split references feature {} outside the record", feature)
                    })?;

                    idx = if x.is_nan() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if x < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl PriceModel for ForestModel {
    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        let xs = self.encode_features(record)?;

        let mut sum = self.artifact.base_score;
        for tree in &self.artifact.trees {
            sum += self.eval_tree(tree, &xs)?;
        }

        Ok(sum)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingTable;
    use crate::features::{assemble, VehicleInput};

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
            has_parking_sensors: true,
            has_automatic_climate_control: false,
            has_rear_ac_vents: false,
            has_central_locking: true,
            has_air_purifier: false,
            new_vehicle_price_lakhs: 7.5,
        };
        let model_te = EncodingTable::new(Default::default(), 5.10);
        let rto_te = EncodingTable::new(Default::default(), 5.10);
        assemble(&input, &model_te, &rto_te)
    }

    fn categories() -> HashMap<String, Vec<String>> {
        let mut categories = HashMap::new();
        categories.insert(
            "brand".to_string(),
            vec!["Maruti".to_string(), "Honda".to_string()],
        );
        categories.insert(
            "fuel_type".to_string(),
            vec!["Diesel".to_string(), "Petrol".to_string()],
        );
        categories.insert(
            "transmission_type".to_string(),
            vec!["Automatic".to_string(), "Manual".to_string()],
        );
        categories.insert(
            "ownership".to_string(),
            vec!["First Owner".to_string(), "Second Owner".to_string()],
        );
        categories
    }

    fn artifact_with_trees(trees: Vec<Tree>) -> ForestArtifact {
        ForestArtifact {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            categories: categories(),
            base_score: 4.0,
            trees,
        }
    }

    #[test]
    fn test_base_score_only_forest() {
        let model = ForestModel::from_artifact(artifact_with_trees(vec![])).unwrap();
        let point = model.predict(&sample_record()).unwrap();
        assert_eq!(point, 4.0);
    }

    #[test]
    fn test_single_split_tree() {
        // registration_year is feature index 1; 2018 >= 2015 goes right
        let tree = Tree {
            nodes: vec![
                Node::Split {
                    feature: 1,
                    threshold: 2015.0,
                    default_left: true,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: -1.0 },
                Node::Leaf { value: 1.5 },
            ],
        };
        let model = ForestModel::from_artifact(artifact_with_trees(vec![tree])).unwrap();
        let point = model.predict(&sample_record()).unwrap();
        assert_eq!(point, 5.5);
    }

    #[test]
    fn test_unseen_category_takes_default_branch() {
        // brand is feature index 0; an unseen brand becomes NaN and must
        // follow default_left rather than fail
        let tree = Tree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.5,
                    default_left: false,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: -2.0 },
                Node::Leaf { value: 2.0 },
            ],
        };
        let model = ForestModel::from_artifact(artifact_with_trees(vec![tree])).unwrap();

        let mut record = sample_record();
        record.brand = "Lamborghini".to_string();
        let point = model.predict(&record).unwrap();
        assert_eq!(point, 6.0);
    }

    #[test]
    fn test_schema_mismatch_rejected_at_load() {
        let mut artifact = artifact_with_trees(vec![]);
        artifact.feature_names[0] = "make".to_string();
        assert!(ForestModel::from_artifact(artifact).is_err());

        let mut artifact = artifact_with_trees(vec![]);
        artifact.feature_names.pop();
        assert!(ForestModel::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_missing_category_levels_is_fatal() {
        let mut artifact = artifact_with_trees(vec![]);
        artifact.categories.remove("brand");
        let model = ForestModel::from_artifact(artifact).unwrap();
        assert!(model.predict(&sample_record()).is_err());
    }

    #[test]
    fn test_artifact_json_roundtrip() {
        let json = r#"{
            "feature_names": ["a"],
            "base_score": 1.0,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 2.0, "default_left": true, "left": 1, "right": 2},
                {"value": -0.5},
                {"value": 0.5}
            ]}]
        }"#;
        let artifact: ForestArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.trees[0].nodes.len(), 3);
        assert!(matches!(artifact.trees[0].nodes[1], Node::Leaf { .. }));
    }
}
