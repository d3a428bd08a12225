//! Gradient boosted tree ensemble producing a logistic margin
//!
//! Nodes are stored flat per tree; node 0 is the root. Traversal goes left
//! when `feature <= threshold`.

use super::logistic;
use crate::errors::{Result, RiskError};
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes carry a feature index and child indices. Leaf nodes
/// carry `leaf` and use `-1` for the index fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Position in the exporter's numbering; traversal uses vector indices
    pub id: i32,

    /// Child taken when `feature <= threshold` (-1 for leaves)
    pub left: i32,

    /// Child taken when `feature > threshold` (-1 for leaves)
    pub right: i32,

    /// Model column to split on (-1 for leaves)
    #[serde(rename = "feature_idx", alias = "feature")]
    pub feature_idx: i32,

    /// Split point on the category code
    #[serde(default)]
    pub threshold: f64,

    /// Margin contribution, present on leaves only
    #[serde(default)]
    pub leaf: Option<f64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A single regression tree of the ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,

    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Leaf value reached by `features`
    ///
    /// Assumes the tree passed [`Tree::validate`].
    pub fn evaluate(&self, features: &[f64; FEATURE_COUNT]) -> Option<f64> {
        let mut idx = 0usize;
        // A validated tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(idx)?;
            if node.is_leaf() {
                return node.leaf;
            }

            let value = *features.get(node.feature_idx as usize)?;
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            idx = usize::try_from(next).ok()?;
        }
        None
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        if !self.weight.is_finite() {
            return Err(format!("Tree weight is not finite: {}", self.weight));
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    Some(value) => return Err(format!("Leaf node {i} has non-finite value {value}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            // Children must point forward so traversal always terminates
            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i as i32 || child >= len {
                    return Err(format!("Node {i} has invalid {side} child: {child}"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= FEATURE_COUNT {
                return Err(format!(
                    "Internal node {i} has invalid feature index: {}",
                    node.feature_idx
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("Internal node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

/// Boosted ensemble whose summed margin is squashed into a probability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtClassifier {
    pub trees: Vec<Tree>,

    #[serde(default)]
    pub bias: f64,
}

impl GbdtClassifier {
    pub fn new(trees: Vec<Tree>, bias: f64) -> Self {
        Self { trees, bias }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("Ensemble has no trees".to_string());
        }
        if !self.bias.is_finite() {
            return Err("Ensemble bias is not finite".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| format!("Tree {i} validation failed: {e}"))?;
        }
        Ok(())
    }

    /// Raw log-odds before the logistic link
    pub fn margin(&self, features: &FeatureVector) -> Result<f64> {
        let x = features.to_f64();
        let mut sum = self.bias;
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = tree
                .evaluate(&x)
                .ok_or_else(|| RiskError::Inference(format!("tree {i} did not reach a leaf")))?;
            sum += leaf * tree.weight;
        }
        Ok(sum)
    }

    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        Ok(logistic(self.margin(features)?))
    }
}
