//! Audit data model: reports, groups, base rates, and the rejection table.
//!
//! A report row and a group definition share one shape, a map from feature
//! name to [`FeatureValue`]. A report carries a value for every feature; a
//! group names only the features it constrains and treats the rest as
//! wildcards.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a group in the group list; also its index into base rates and
/// every per-group state array.
pub type GroupId = usize;

/// A single feature value. Equality is exact, with no coercion between
/// variants (`Text("1")` never equals `Integer(1)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Flag(b) => write!(f, "{b}"),
            FeatureValue::Integer(i) => write!(f, "{i}"),
            FeatureValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Text(s)
    }
}

impl From<i64> for FeatureValue {
    fn from(i: i64) -> Self {
        FeatureValue::Integer(i)
    }
}

impl From<bool> for FeatureValue {
    fn from(b: bool) -> Self {
        FeatureValue::Flag(b)
    }
}

/// One incident report: named feature values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<String, FeatureValue>);

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, feature: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.0.insert(feature.into(), value.into());
        self
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureValue> {
        self.0.get(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FeatureValue)> for Report {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Report(iter.into_iter().collect())
    }
}

/// A conjunction of feature requirements. Features not named are wildcards,
/// so the empty group matches every report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(BTreeMap<String, FeatureValue>);

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style requirement.
    pub fn with(mut self, feature: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.0.insert(feature.into(), value.into());
        self
    }

    /// Requirements in feature-name order.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        let mut first = true;
        for (feature, value) in &self.0 {
            if !first {
                write!(f, " & ")?;
            }
            write!(f, "{feature}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<(String, FeatureValue)> for Group {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Group(iter.into_iter().collect())
    }
}

/// Null membership probability per group, indexed by [`GroupId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseRates(Vec<f64>);

impl BaseRates {
    pub fn new(rates: Vec<f64>) -> Self {
        BaseRates(rates)
    }

    pub fn get(&self, group: GroupId) -> Option<f64> {
        self.0.get(group).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks one rate per group and every rate strictly inside (0, 1).
    pub fn validate(&self, group_count: usize) -> Result<()> {
        if self.0.len() != group_count {
            return Err(Error::LengthMismatch {
                groups: group_count,
                base_rates: self.0.len(),
            });
        }
        for (group, &value) in self.0.iter().enumerate() {
            if !(value > 0.0 && value < 1.0) {
                return Err(Error::InvalidBaseRate { group, value });
            }
        }
        Ok(())
    }
}

impl From<Vec<f64>> for BaseRates {
    fn from(rates: Vec<f64>) -> Self {
        BaseRates(rates)
    }
}

/// One corrected rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub group_id: GroupId,
    /// Step (1-based) at which the statistic first crossed the corrected threshold.
    pub rejection_time: u64,
    /// Step at which it first crossed the per-group uncorrected threshold.
    /// Never later than `rejection_time`.
    pub uncorrected_crossing_time: u64,
}

/// Corrected rejections in discovery order. Each group appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RejectionTable(Vec<RejectionRecord>);

impl RejectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record unless the group is already present. Returns whether
    /// the record was added.
    pub fn record(&mut self, record: RejectionRecord) -> bool {
        if self.contains(record.group_id) {
            return false;
        }
        self.0.push(record);
        true
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.0.iter().any(|r| r.group_id == group)
    }

    pub fn get(&self, group: GroupId) -> Option<&RejectionRecord> {
        self.0.iter().find(|r| r.group_id == group)
    }

    pub fn records(&self) -> &[RejectionRecord] {
        &self.0
    }

    /// Flagged group ids in discovery order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.0.iter().map(|r| r.group_id).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a RejectionTable {
    type Item = &'a RejectionRecord;
    type IntoIter = std::slice::Iter<'a, RejectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_value_untagged_json() {
        let report: Report =
            serde_json::from_str(r#"{"race": "black", "age": 3, "veteran": true}"#).unwrap();
        assert_eq!(report.get("race"), Some(&FeatureValue::from("black")));
        assert_eq!(report.get("age"), Some(&FeatureValue::Integer(3)));
        assert_eq!(report.get("veteran"), Some(&FeatureValue::Flag(true)));
        assert_eq!(report.get("sex"), None);
    }

    #[test]
    fn feature_value_no_coercion() {
        assert_ne!(FeatureValue::from("1"), FeatureValue::Integer(1));
        assert_ne!(FeatureValue::Integer(1), FeatureValue::Flag(true));
    }

    #[test]
    fn float_feature_rejected() {
        assert!(serde_json::from_str::<Report>(r#"{"score": 0.5}"#).is_err());
    }

    #[test]
    fn group_display_is_ordered() {
        let g = Group::new().with("sex", "f").with("age", 2i64);
        assert_eq!(g.to_string(), "age=2 & sex=f");
        assert_eq!(Group::new().to_string(), "*");
    }

    #[test]
    fn base_rates_validate_length() {
        let rates = BaseRates::new(vec![0.1, 0.2]);
        match rates.validate(3) {
            Err(Error::LengthMismatch { groups, base_rates }) => {
                assert_eq!(groups, 3);
                assert_eq!(base_rates, 2);
            }
            other => panic!("expected length mismatch, got {other:?}"),
        }
        assert!(rates.validate(2).is_ok());
    }

    #[test]
    fn base_rates_validate_range() {
        for bad in [0.0, 1.0, -0.2, 1.3, f64::NAN] {
            let rates = BaseRates::new(vec![0.1, bad]);
            match rates.validate(2) {
                Err(Error::InvalidBaseRate { group, .. }) => assert_eq!(group, 1),
                other => panic!("expected invalid rate for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejection_table_dedups_groups() {
        let mut table = RejectionTable::new();
        assert!(table.record(RejectionRecord {
            group_id: 2,
            rejection_time: 10,
            uncorrected_crossing_time: 7,
        }));
        assert!(!table.record(RejectionRecord {
            group_id: 2,
            rejection_time: 12,
            uncorrected_crossing_time: 12,
        }));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(2).map(|r| r.rejection_time), Some(10));
        assert_eq!(table.group_ids(), vec![2]);
    }

    #[test]
    fn rejection_table_serializes_as_rows() {
        let mut table = RejectionTable::new();
        table.record(RejectionRecord {
            group_id: 0,
            rejection_time: 5,
            uncorrected_crossing_time: 3,
        });
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"[{"group_id":0,"rejection_time":5,"uncorrected_crossing_time":3}]"#
        );
    }
}
