//! Partial joint updates and per-frame mapping reports

use serde::{Deserialize, Serialize};

/// Declared output range of one mapped joint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl JointSpec {
    pub fn new(name: impl Into<String>, a: f64, b: f64) -> Self {
        Self {
            name: name.into(),
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, angle: f64) -> bool {
        const TOLERANCE: f64 = 1e-9;
        angle >= self.min - TOLERANCE && angle <= self.max + TOLERANCE
    }
}

/// Joints written by one limb in one tick, in emission order
#[derive(Debug, Clone, PartialEq)]
pub struct JointUpdate {
    pub limb: &'static str,
    values: Vec<(String, f64)>,
}

impl JointUpdate {
    pub fn new(limb: &'static str) -> Self {
        Self {
            limb,
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, angle: f64) {
        self.values.push((name.into(), angle));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, a)| *a)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of mapping one detector frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    /// Whether body landmarks were present
    pub tracked: bool,

    /// Limbs that emitted an update, in application order
    pub updated_limbs: Vec<String>,

    /// Total joint writes (including overwrites)
    pub joints_written: usize,
}

impl MappingReport {
    pub fn has_updates(&self) -> bool {
        self.joints_written > 0
    }
}
