//! Fuzz target for report and group JSON parsing.
//!
//! Splits the input at the first NUL byte into a reports document and a
//! groups document, then matches every parsed report against every group.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sa_common::{Group, Report};
use sa_core::GroupMatcher;

fuzz_target!(|data: &[u8]| {
    let mut parts = data.splitn(2, |b| *b == 0);
    let reports_doc = parts.next().unwrap_or_default();
    let groups_doc = parts.next().unwrap_or_default();

    let Ok(reports) = serde_json::from_slice::<Vec<Report>>(reports_doc) else {
        return;
    };
    let Ok(groups) = serde_json::from_slice::<Vec<Group>>(groups_doc) else {
        return;
    };

    let matcher = GroupMatcher::new(groups);
    let mut membership = vec![0.0; matcher.len()];
    for (i, report) in reports.iter().enumerate() {
        if matcher.membership(i, report, &mut membership).is_ok() {
            assert!(membership.iter().all(|x| *x == 0.0 || *x == 1.0));
        }
    }
});
