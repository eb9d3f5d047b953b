//! Diagnostic parser — structured pass/fail records from free-form probe text.
//!
//! The external diagnostic tool prints human-readable output like:
//!
//! ```text
//!    Starting test: Advertising
//!       ......................... dc1 passed test Advertising
//! ```
//!
//! The format is not a stable contract, so parsing never fails; anything
//! the parser cannot classify degrades to an absent entry rather than an
//! error. A test name with no outcome means "no definitive status", which
//! downstream consumers must tolerate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::Node;

/// Outcome of one named health check on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Passed,
    Failed,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("Passed"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

/// Parsed diagnostic results for one node: exactly one outcome per test
/// name that reported definitively. Built once per probe run, never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub node: String,
    pub outcomes: BTreeMap<String, TestOutcome>,
}

/// Classification of a single output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    StartTest(&'a str),
    Outcome(TestOutcome),
    Other,
}

fn classify(line: &str) -> LineKind<'_> {
    let lower = line.to_ascii_lowercase();

    if let Some(pos) = lower.find("starting test:") {
        let name = line[pos + "starting test:".len()..].trim();
        if name.is_empty() {
            return LineKind::Other;
        }
        return LineKind::StartTest(name);
    }

    // A line can in principle mention both tokens; the first one wins.
    match (lower.find("passed"), lower.find("failed")) {
        (Some(p), Some(f)) if p < f => LineKind::Outcome(TestOutcome::Passed),
        (Some(_), Some(_)) => LineKind::Outcome(TestOutcome::Failed),
        (Some(_), None) => LineKind::Outcome(TestOutcome::Passed),
        (None, Some(_)) => LineKind::Outcome(TestOutcome::Failed),
        (None, None) => LineKind::Other,
    }
}

/// Parse one node's raw diagnostic text into a [`DiagnosticRecord`].
///
/// Two-slot state machine: a "starting test" line sets the pending name
/// and discards any pending outcome; a passed/failed line sets the pending
/// outcome. As soon as both slots are filled the pair is recorded (last
/// occurrence wins for a repeated name) and the slots are cleared. A name
/// with no outcome before the next name or EOF is dropped silently.
pub fn parse(node: &Node, raw: &str) -> DiagnosticRecord {
    let mut outcomes = BTreeMap::new();
    let mut pending_name: Option<&str> = None;
    let mut pending_outcome: Option<TestOutcome> = None;

    for line in raw.lines() {
        match classify(line) {
            LineKind::StartTest(name) => {
                pending_name = Some(name);
                pending_outcome = None;
            }
            LineKind::Outcome(outcome) => {
                pending_outcome = Some(outcome);
            }
            LineKind::Other => {}
        }

        if let (Some(name), Some(outcome)) = (pending_name, pending_outcome) {
            outcomes.insert(name.to_string(), outcome);
            pending_name = None;
            pending_outcome = None;
        }
    }

    DiagnosticRecord {
        node: node.name.clone(),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn dc1() -> Node {
        Node::new("dc1.contoso.com", "contoso.com")
    }

    #[test]
    fn parses_well_formed_verbose_output() {
        let raw = indoc! {"
            Directory Server Diagnosis

            Performing initial setup:
               Trying to find home server...
               Home Server = dc1

            Testing server: Default-First-Site-Name\\DC1
               Starting test: Advertising
                  The DC DC1 is advertising itself as a DC and having a DS.
                  ......................... dc1 passed test Advertising
               Starting test: Replications
                  [Replications Check,DC1] A recent replication attempt failed
                  ......................... dc1 failed test Replications
               Starting test: Services
                  ......................... dc1 passed test Services
        "};

        let record = parse(&dc1(), raw);
        assert_eq!(record.node, "dc1.contoso.com");
        assert_eq!(record.outcomes.len(), 3);
        assert_eq!(record.outcomes["Advertising"], TestOutcome::Passed);
        assert_eq!(record.outcomes["Replications"], TestOutcome::Failed);
        assert_eq!(record.outcomes["Services"], TestOutcome::Passed);
    }

    #[test]
    fn single_pair_scenario() {
        let raw = "Starting test: Advertising\n......... dc1 passed test Advertising\n";
        let record = parse(&dc1(), raw);
        assert_eq!(record.outcomes.len(), 1);
        assert_eq!(record.outcomes["Advertising"], TestOutcome::Passed);
    }

    #[test]
    fn last_occurrence_wins_for_repeated_name() {
        let raw = indoc! {"
            Starting test: Connectivity
               ......................... dc1 failed test Connectivity
            Starting test: Connectivity
               ......................... dc1 passed test Connectivity
        "};
        let record = parse(&dc1(), raw);
        assert_eq!(record.outcomes.len(), 1);
        assert_eq!(record.outcomes["Connectivity"], TestOutcome::Passed);
    }

    #[test]
    fn incomplete_test_contributes_nothing() {
        // NetLogons never reports; the next test starts before any outcome.
        let raw = indoc! {"
            Starting test: NetLogons
               some explanatory text with no verdict
            Starting test: Services
               ......................... dc1 passed test Services
        "};
        let record = parse(&dc1(), raw);
        assert_eq!(record.outcomes.len(), 1);
        assert!(!record.outcomes.contains_key("NetLogons"));
        assert_eq!(record.outcomes["Services"], TestOutcome::Passed);
    }

    #[test]
    fn incomplete_test_at_eof_is_dropped() {
        let raw = "Starting test: SysVolCheck\n   still running...\n";
        let record = parse(&dc1(), raw);
        assert!(record.outcomes.is_empty());
    }

    #[test]
    fn outcome_without_test_name_is_ignored() {
        let raw = "......... dc1 passed test Advertising\n";
        let record = parse(&dc1(), raw);
        assert!(record.outcomes.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let raw = "STARTING TEST: KccEvent\n   dc1 PASSED test KccEvent\n";
        let record = parse(&dc1(), raw);
        assert_eq!(record.outcomes["KccEvent"], TestOutcome::Passed);
    }

    #[test]
    fn unrelated_lines_and_empty_input_are_tolerated() {
        assert!(parse(&dc1(), "").outcomes.is_empty());
        assert!(parse(&dc1(), "garbage\nmore garbage\n").outcomes.is_empty());
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = indoc! {"
            Starting test: Advertising
               ......................... dc1 passed test Advertising
            Starting test: Replications
               ......................... dc1 failed test Replications
        "};
        assert_eq!(parse(&dc1(), raw), parse(&dc1(), raw));
    }
}
