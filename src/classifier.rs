//! Cloudburst classifier adapter.
//!
//! The model itself is trained offline and shipped as a JSON artifact. This
//! module only loads it, checks that its feature schema matches
//! [`CLOUDBURST_FEATURES`], and evaluates it. Callers depend on the
//! [`CloudburstClassifier`] trait so tests can substitute a stub.
//!
//! # Artifact format
//!
//! ```json
//! {
//!   "features": ["temperature", "apparent_temperature", "humidity", "wind_speed",
//!                "wind_bearing", "visibility", "pressure"],
//!   "model": { "kind": "logistic", "weights": [...7 numbers...], "intercept": -3.2 }
//! }
//! ```
//!
//! or a decision tree in pre-order, root first, where a split sends a sample
//! left when `x[feature] <= threshold`:
//!
//! ```json
//! { "kind": "decision_tree", "nodes": [
//!     { "split": { "feature": 2, "threshold": 85.0, "left": 1, "right": 2 } },
//!     { "leaf": { "label": 0 } },
//!     { "leaf": { "label": 1 } }
//! ] }
//! ```

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelError;
use crate::model::{CLOUDBURST_FEATURES, CloudburstQuery};

/// Number of input features.
pub const FEATURE_COUNT: usize = CLOUDBURST_FEATURES.len();

/// Binary classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    NoCloudburst,
    Cloudburst,
}

impl Prediction {
    /// The raw class label: 1 for a cloudburst, 0 otherwise.
    pub fn label(&self) -> u8 {
        match self {
            Prediction::NoCloudburst => 0,
            Prediction::Cloudburst => 1,
        }
    }
}

/// Anything that can classify a feature vector.
///
/// Implementations must be deterministic: the same features always give the
/// same prediction.
pub trait CloudburstClassifier: Send + Sync {
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Prediction;
}

/// Serialized model as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature names in the order the model was trained on.
    pub features: Vec<String>,

    pub model: ModelKind,
}

/// The supported model families.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Logistic {
        weights: [f64; FEATURE_COUNT],
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

fn default_threshold() -> f64 {
    0.5
}

/// A decision tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: u8,
    },
}

impl ModelArtifact {
    /// Check the artifact and turn it into an evaluable model.
    ///
    /// # Errors
    ///
    /// - [`ModelError::FeatureMismatch`] if `features` is not exactly
    ///   [`CLOUDBURST_FEATURES`] in order
    /// - [`ModelError::Invalid`] for a malformed model body
    pub fn validate(self) -> Result<LoadedModel, ModelError> {
        if self.features.iter().map(String::as_str).ne(CLOUDBURST_FEATURES) {
            return Err(ModelError::FeatureMismatch {
                expected: CLOUDBURST_FEATURES.iter().map(|f| f.to_string()).collect(),
                found: self.features,
            });
        }

        match &self.model {
            ModelKind::Logistic {
                weights,
                intercept,
                threshold,
            } => {
                if !weights.iter().chain([intercept]).all(|w| w.is_finite()) {
                    return Err(ModelError::Invalid(
                        "logistic coefficients must be finite".to_string(),
                    ));
                }
                if !(*threshold > 0.0 && *threshold < 1.0) {
                    return Err(ModelError::Invalid(format!(
                        "logistic threshold {} outside (0, 1)",
                        threshold
                    )));
                }
            }
            ModelKind::DecisionTree { nodes } => validate_tree(nodes)?,
        }

        Ok(LoadedModel { model: self.model })
    }
}

/// Children must come after their parent, which rules out cycles and
/// guarantees every walk from the root ends at a leaf.
fn validate_tree(nodes: &[TreeNode]) -> Result<(), ModelError> {
    if nodes.is_empty() {
        return Err(ModelError::Invalid("decision tree has no nodes".to_string()));
    }

    for (index, node) in nodes.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelError::Invalid(format!(
                        "node {} splits on unknown feature {}",
                        index, feature
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ModelError::Invalid(format!(
                        "node {} has a non-finite threshold",
                        index
                    )));
                }
                for child in [*left, *right] {
                    if child <= index || child >= nodes.len() {
                        return Err(ModelError::Invalid(format!(
                            "node {} has invalid child {}",
                            index, child
                        )));
                    }
                }
            }
            TreeNode::Leaf { label } => {
                if *label > 1 {
                    return Err(ModelError::Invalid(format!(
                        "leaf {} has non-binary label {}",
                        index, label
                    )));
                }
            }
        }
    }

    Ok(())
}

/// A validated model ready for inference.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    model: ModelKind,
}

impl LoadedModel {
    /// Parse and validate an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()
    }

    /// Read, parse and validate an artifact file.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl CloudburstClassifier for LoadedModel {
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Prediction {
        let positive = match &self.model {
            ModelKind::Logistic {
                weights,
                intercept,
                threshold,
            } => {
                let z = intercept
                    + weights
                        .iter()
                        .zip(features)
                        .map(|(w, x)| w * x)
                        .sum::<f64>();
                let probability = 1.0 / (1.0 + (-z).exp());
                probability >= *threshold
            }
            ModelKind::DecisionTree { nodes } => {
                let mut index = 0;
                loop {
                    match &nodes[index] {
                        TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            index = if features[*feature] <= *threshold {
                                *left
                            } else {
                                *right
                            };
                        }
                        TreeNode::Leaf { label } => break *label == 1,
                    }
                }
            }
        };

        if positive {
            Prediction::Cloudburst
        } else {
            Prediction::NoCloudburst
        }
    }
}

static SHARED_MODEL: OnceLock<Arc<LoadedModel>> = OnceLock::new();

/// The process-wide model, loaded from `path` on first call.
///
/// Later calls return the same instance and ignore `path`; the model is never
/// reloaded.
pub fn shared_model(path: &Path) -> Result<Arc<LoadedModel>, ModelError> {
    if let Some(model) = SHARED_MODEL.get() {
        return Ok(Arc::clone(model));
    }

    let loaded = Arc::new(LoadedModel::from_path(path)?);
    let model = SHARED_MODEL.get_or_init(|| loaded);
    info!(path = %path.display(), "Cloudburst model loaded");
    Ok(Arc::clone(model))
}

/// A phone number to call in an emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    pub service: &'static str,
    pub number: &'static str,
}

const PRECAUTIONS: &[&str] = &[
    "Avoid low-lying areas prone to flooding.",
    "Stay away from streams, rivers, and other bodies of water.",
    "Seek shelter in a sturdy building on higher ground.",
    "Keep emergency supplies ready, including flashlights, food, and water.",
    "Keep family and emergency contacts informed of your location.",
];

const EMERGENCY_CONTACTS: &[EmergencyContact] = &[
    EmergencyContact {
        service: "Disaster Management Helpline",
        number: "108",
    },
    EmergencyContact {
        service: "Police",
        number: "100",
    },
    EmergencyContact {
        service: "Fire Brigade",
        number: "101",
    },
];

/// What the prediction page shows for one query.
#[derive(Debug, Clone, Serialize)]
pub struct CloudburstAssessment {
    pub prediction: Prediction,

    /// Raw class label (0 or 1).
    pub label: u8,

    pub headline: &'static str,

    /// Present when no cloudburst is predicted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<&'static str>,

    /// Empty when no cloudburst is predicted.
    pub precautions: &'static [&'static str],

    /// Empty when no cloudburst is predicted.
    pub emergency_contacts: &'static [EmergencyContact],
}

/// Run the classifier and attach the matching advisory.
pub fn assess(
    classifier: &dyn CloudburstClassifier,
    query: &CloudburstQuery,
) -> CloudburstAssessment {
    let prediction = classifier.predict(&query.features());

    match prediction {
        Prediction::Cloudburst => CloudburstAssessment {
            prediction,
            label: prediction.label(),
            headline: "⚠️ Alert: Cloudburst Predicted!",
            observation: None,
            precautions: PRECAUTIONS,
            emergency_contacts: EMERGENCY_CONTACTS,
        },
        Prediction::NoCloudburst => CloudburstAssessment {
            prediction,
            label: prediction.label(),
            headline: "✅ No Cloudburst Predicted!",
            observation: Some("Conditions seem normal; no immediate weather threat detected."),
            precautions: &[],
            emergency_contacts: &[],
        },
    }
}
