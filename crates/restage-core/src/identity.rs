//! Staging identifier derivation.
//!
//! Staging identifiers are pure functions of the logical database name
//! and the run date. Re-running on the same calendar day derives the
//! same identifiers, so an "already exists" answer from the control
//! plane means a previous partial run got there first and the workflow
//! can continue where it left off.

use chrono::NaiveDate;

/// The derived staging cluster and instance identifiers for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingIdentity {
    pub cluster_id: String,
    pub instance_id: String,
}

impl StagingIdentity {
    /// Derive the staging identifiers for a logical database on a run
    /// date. A trailing `-prod` is stripped from the logical name; the
    /// date is rendered as `YYYY-MM-DD`.
    pub fn derive(logical_name: &str, run_date: NaiveDate) -> Self {
        let base = logical_name.strip_suffix("-prod").unwrap_or(logical_name);
        let cluster_id = format!("{base}-staging-{}", run_date.format("%Y-%m-%d"));
        let instance_id = format!("{cluster_id}-instance-1");
        Self {
            cluster_id,
            instance_id,
        }
    }
}
