//! The placeholder and dry-run gates, and how their results are reported

use serde::Serialize;
use std::fmt;

/// Value a destination entry must hold before it may be overwritten
pub const PLACEHOLDER: &str = "DUMMY";

/// What to do with one destination entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Current value is live data
    Skip,
    /// Would write, but dry-run is on
    Report,
    Write,
}

/// Only an exact placeholder match may be written, and only outside dry-run
pub fn decide(current_value: &str, dry_run: bool) -> Decision {
    if current_value != PLACEHOLDER {
        Decision::Skip
    } else if dry_run {
        Decision::Report
    } else {
        Decision::Write
    }
}

/// What happened to one backed-up entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "action")]
pub enum RestoreAction {
    /// No destination entry matched
    NotFound,
    /// Destination holds something other than the placeholder
    NotPlaceholder,
    /// Dry-run: the write was reported, not performed
    WouldWrite,
    Written { attempts: u32 },
}

impl RestoreAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreAction::NotFound => "skipped: not found",
            RestoreAction::NotPlaceholder => "skipped: not placeholder",
            RestoreAction::WouldWrite => "would write",
            RestoreAction::Written { .. } => "written",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, RestoreAction::NotFound | RestoreAction::NotPlaceholder)
    }
}

impl fmt::Display for RestoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    /// Name in the backup document
    pub source: String,
    /// Destination entry, when one was found
    pub target: Option<String>,
    #[serde(flatten)]
    pub action: RestoreAction,
}

/// Everything a restore run decided, in the order it decided it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub dry_run: bool,
    pub outcomes: Vec<RestoreOutcome>,
}

impl RestoreReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, source: &str, target: Option<&str>, action: RestoreAction) {
        self.outcomes.push(RestoreOutcome {
            source: source.to_string(),
            target: target.map(String::from),
            action,
        });
    }

    pub fn written(&self) -> usize {
        self.count(|a| matches!(a, RestoreAction::Written { .. }))
    }

    pub fn would_write(&self) -> usize {
        self.count(|a| matches!(a, RestoreAction::WouldWrite))
    }

    pub fn skipped(&self) -> usize {
        self.count(RestoreAction::is_skip)
    }

    fn count(&self, predicate: impl Fn(&RestoreAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.action)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exact_placeholder_passes() {
        assert_eq!(decide("DUMMY", false), Decision::Write);
        assert_eq!(decide("DUMMY", true), Decision::Report);
        for live in ["other", "dummy", "DUMMY ", " DUMMY", "", "DUMMY\n"] {
            assert_eq!(decide(live, false), Decision::Skip, "{:?}", live);
            assert_eq!(decide(live, true), Decision::Skip, "{:?}", live);
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = RestoreReport::new(false);
        report.record("/a", None, RestoreAction::NotFound);
        report.record("/b", Some("/b"), RestoreAction::NotPlaceholder);
        report.record("/c", Some("/c"), RestoreAction::Written { attempts: 2 });
        report.record("/d", Some("/d"), RestoreAction::Written { attempts: 1 });

        assert_eq!(report.written(), 2);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.would_write(), 0);
    }

    #[test]
    fn test_outcome_json() {
        let outcome = RestoreOutcome {
            source: "db".into(),
            target: Some("db_prod".into()),
            action: RestoreAction::Written { attempts: 3 },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "written");
        assert_eq!(json["attempts"], 3);
        assert_eq!(json["target"], "db_prod");
    }
}
