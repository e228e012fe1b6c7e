use ndarray::{Array1, ArrayView1};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::frame::FeatureFrame;
use crate::core::PredictResult;

/// Anything that can turn a feature frame into one prediction per row.
pub trait RegressionModel: Send + Sync + fmt::Debug {
    /// Short name of the model family, e.g. `linear`.
    fn kind(&self) -> &str;

    /// Column names the model was trained on, in training order.
    fn feature_names(&self) -> &[String];

    /// Predict one value per frame row.
    fn predict(&self, frame: &FeatureFrame) -> PredictResult<Vec<f64>>;
}

/// Serialized model, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    pub fn into_model(self) -> Arc<dyn RegressionModel> {
        match self {
            ModelArtifact::Linear(model) => Arc::new(model),
            ModelArtifact::TreeEnsemble(model) => Arc::new(model),
        }
    }
}

/// Ordinary least squares style model: `intercept + Σ wᵢ·xᵢ`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawLinear")]
pub struct LinearModel {
    feature_names: Vec<String>,
    intercept: f64,
    weights: Array1<f64>,
}

#[derive(Deserialize)]
struct RawLinear {
    feature_names: Vec<String>,
    intercept: f64,
    coefficients: HashMap<String, f64>,
}

impl TryFrom<RawLinear> for LinearModel {
    type Error = String;

    fn try_from(raw: RawLinear) -> Result<Self, String> {
        LinearModel::new(raw.feature_names, raw.intercept, raw.coefficients)
    }
}

impl LinearModel {
    /// Build a linear model; every feature needs exactly one coefficient.
    pub fn new(
        feature_names: Vec<String>,
        intercept: f64,
        coefficients: HashMap<String, f64>,
    ) -> Result<Self, String> {
        check_feature_names(&feature_names)?;

        if let Some(unknown) = coefficients.keys().find(|k| !feature_names.contains(k)) {
            return Err(format!("coefficient given for unknown feature '{}'", unknown));
        }

        let weights = feature_names
            .iter()
            .map(|name| {
                coefficients
                    .get(name)
                    .copied()
                    .ok_or_else(|| format!("no coefficient for feature '{}'", name))
            })
            .collect::<Result<Array1<f64>, String>>()?;

        Ok(Self {
            feature_names,
            intercept,
            weights,
        })
    }
}

impl RegressionModel for LinearModel {
    fn kind(&self) -> &str {
        "linear"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, frame: &FeatureFrame) -> PredictResult<Vec<f64>> {
        frame.ensure_schema(&self.feature_names)?;
        let predictions = frame.values().dot(&self.weights) + self.intercept;
        Ok(predictions.to_vec())
    }
}

/// Sum of regression trees on top of a base score.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawTreeEnsemble")]
pub struct TreeEnsemble {
    feature_names: Vec<String>,
    base_score: f64,
    trees: Vec<RegressionTree>,
}

#[derive(Deserialize)]
struct RawTreeEnsemble {
    feature_names: Vec<String>,
    #[serde(default)]
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl TryFrom<RawTreeEnsemble> for TreeEnsemble {
    type Error = String;

    fn try_from(raw: RawTreeEnsemble) -> Result<Self, String> {
        TreeEnsemble::new(raw.feature_names, raw.base_score, raw.trees)
    }
}

/// Flat node list; node 0 is the root.
#[derive(Debug, Clone, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Rows with `value <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    // Children always point forward, so walking from the root terminates.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but only {} features exist",
                        index, feature, n_features
                    ));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", index, child));
                    }
                }
            }
        }

        Ok(())
    }

    fn evaluate(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

impl TreeEnsemble {
    pub fn new(
        feature_names: Vec<String>,
        base_score: f64,
        trees: Vec<RegressionTree>,
    ) -> Result<Self, String> {
        check_feature_names(&feature_names)?;
        for (index, tree) in trees.iter().enumerate() {
            tree.validate(feature_names.len())
                .map_err(|e| format!("tree {}: {}", index, e))?;
        }

        Ok(Self {
            feature_names,
            base_score,
            trees,
        })
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl RegressionModel for TreeEnsemble {
    fn kind(&self) -> &str {
        "tree_ensemble"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, frame: &FeatureFrame) -> PredictResult<Vec<f64>> {
        frame.ensure_schema(&self.feature_names)?;
        Ok(frame
            .rows()
            .map(|row| {
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|tree| tree.evaluate(row))
                        .sum::<f64>()
            })
            .collect())
    }
}

fn check_feature_names(feature_names: &[String]) -> Result<(), String> {
    if feature_names.is_empty() {
        return Err("model declares no features".to_string());
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = feature_names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(format!("feature '{}' declared twice", duplicate));
    }

    Ok(())
}
