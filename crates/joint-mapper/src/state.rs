//! Joint state table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::update::JointUpdate;

/// Joint name to target angle (radians).
///
/// Owned by one writer per tick and passed by `&mut` through the frame update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointStateTable {
    joints: BTreeMap<String, f64>,
}

impl JointStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every named joint at 0 rad
    pub fn zeroed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            joints: names.into_iter().map(|n| (n.into(), 0.0)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.joints.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, angle: f64) {
        self.joints.insert(name.into(), angle);
    }

    /// Merge a partial update; later writes to the same name win
    pub fn apply(&mut self, update: &JointUpdate) {
        for (name, angle) in update.iter() {
            self.joints.insert(name.to_string(), angle);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.joints.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.joints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn clear(&mut self) {
        self.joints.clear();
    }
}

impl FromIterator<(String, f64)> for JointStateTable {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_table() {
        let table = JointStateTable::zeroed(["A", "B"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A"), Some(0.0));
        assert_eq!(table.get("C"), None);
    }

    #[test]
    fn test_apply_overwrites_and_extends() {
        let mut table = JointStateTable::zeroed(["HEAD_JOINT0"]);
        let mut update = JointUpdate::new("head");
        update.push("HEAD_JOINT0", 0.5);
        update.push("HEAD_JOINT1", -0.2);

        table.apply(&update);
        assert_eq!(table.get("HEAD_JOINT0"), Some(0.5));
        assert_eq!(table.get("HEAD_JOINT1"), Some(-0.2));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut table = JointStateTable::new();
        table.set("J", 1.0);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"J":1.0}"#);
    }
}
