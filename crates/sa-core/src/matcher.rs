//! Group membership of reports.
//!
//! A group is a conjunction of feature requirements; a report belongs to it
//! when every named feature carries the required value. Features a group does
//! not name are wildcards.

use sa_common::{Error, Group, GroupId, Report, Result};

/// Evaluates reports against a fixed, ordered group list.
#[derive(Debug, Clone)]
pub struct GroupMatcher {
    groups: Vec<Group>,
}

impl GroupMatcher {
    pub fn new(groups: Vec<Group>) -> Self {
        GroupMatcher { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether `report` (at stream position `report_index`) belongs to group `id`.
    ///
    /// Every requirement is looked up, so a feature missing from the report
    /// is an error even when an earlier requirement already failed.
    pub fn matches(&self, report_index: usize, report: &Report, id: GroupId) -> Result<bool> {
        let group = self.groups.get(id).ok_or_else(|| {
            Error::InvalidInput(format!(
                "group {} out of range for {} groups",
                id,
                self.groups.len()
            ))
        })?;
        group_matches(report_index, report, id, group)
    }

    /// Fill `flags` with the 0/1 membership of `report` in every group.
    ///
    /// `flags` must have one slot per group.
    pub fn membership(&self, report_index: usize, report: &Report, flags: &mut [f64]) -> Result<()> {
        if flags.len() != self.groups.len() {
            return Err(Error::InvalidInput(format!(
                "membership buffer has {} slots for {} groups",
                flags.len(),
                self.groups.len()
            )));
        }
        for (id, (group, slot)) in self.groups.iter().zip(flags.iter_mut()).enumerate() {
            *slot = if group_matches(report_index, report, id, group)? {
                1.0
            } else {
                0.0
            };
        }
        Ok(())
    }

    /// Check that `report` carries every feature any group requires.
    pub fn validate_against(&self, report_index: usize, report: &Report) -> Result<()> {
        for (id, group) in self.groups.iter().enumerate() {
            group_matches(report_index, report, id, group)?;
        }
        Ok(())
    }
}

fn group_matches(report_index: usize, report: &Report, id: GroupId, group: &Group) -> Result<bool> {
    let mut all = true;
    for (feature, required) in group.requirements() {
        let value = report.get(feature).ok_or_else(|| Error::MissingFeature {
            feature: feature.to_string(),
            group: id,
            report: report_index,
        })?;
        all &= value == required;
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report::new()
            .with("race", "black")
            .with("sex", "female")
            .with("age", 3i64)
    }

    fn matcher() -> GroupMatcher {
        GroupMatcher::new(vec![
            Group::new().with("race", "black"),
            Group::new().with("race", "white").with("sex", "female"),
            Group::new().with("sex", "female").with("age", 3i64),
            Group::new(),
        ])
    }

    #[test]
    fn conjunction_semantics() {
        let m = matcher();
        let r = report();
        assert!(m.matches(0, &r, 0).unwrap());
        assert!(!m.matches(0, &r, 1).unwrap());
        assert!(m.matches(0, &r, 2).unwrap());
    }

    #[test]
    fn empty_group_matches_everything() {
        let m = matcher();
        assert!(m.matches(0, &report(), 3).unwrap());
        assert!(m.matches(1, &Report::new(), 3).unwrap());
    }

    #[test]
    fn membership_vector() {
        let m = matcher();
        let mut flags = vec![0.0; m.len()];
        m.membership(0, &report(), &mut flags).unwrap();
        assert_eq!(flags, vec![1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn no_coercion_between_variants() {
        let m = GroupMatcher::new(vec![Group::new().with("age", "3")]);
        assert!(!m.matches(0, &report(), 0).unwrap());
    }

    #[test]
    fn missing_feature_is_error() {
        let m = GroupMatcher::new(vec![Group::new().with("income", "low")]);
        let err = m.matches(7, &report(), 0).unwrap_err();
        match err {
            Error::MissingFeature {
                feature,
                group,
                report,
            } => {
                assert_eq!(feature, "income");
                assert_eq!(group, 0);
                assert_eq!(report, 7);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_feature_detected_after_failed_requirement() {
        // "age" mismatches first; "zip" must still be looked up
        let m = GroupMatcher::new(vec![Group::new().with("age", 9i64).with("zip", "02139")]);
        assert!(matches!(
            m.matches(0, &report(), 0),
            Err(Error::MissingFeature { .. })
        ));
    }

    #[test]
    fn out_of_range_group() {
        let m = matcher();
        assert!(matches!(
            m.matches(0, &report(), 99),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn wrong_buffer_length() {
        let m = matcher();
        let mut flags = vec![0.0; 2];
        assert!(m.membership(0, &report(), &mut flags).is_err());
    }

    #[test]
    fn validate_against_reports_first_bad_group() {
        let m = GroupMatcher::new(vec![
            Group::new().with("race", "black"),
            Group::new().with("income", "low"),
        ]);
        let err = m.validate_against(0, &report()).unwrap_err();
        assert!(matches!(err, Error::MissingFeature { group: 1, .. }));
    }
}
