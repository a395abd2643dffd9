use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use super::{CheckResult, State};
use crate::error::ParseError;

/// Per-test assertion counters as reported by a script or report run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub info: u64,
    pub success: u64,
    pub warning: u64,
    pub failure: u64,
}

impl TestResult {
    pub fn new(info: u64, success: u64, warning: u64, failure: u64) -> Self {
        TestResult {
            info,
            success,
            warning,
            failure,
        }
    }

    /// Parse the four counter fields in `info,success,warning,failure` order.
    pub fn from_fields(fields: &[String]) -> Result<Self, ParseError> {
        if fields.len() < 4 {
            return Err(ParseError::TooFewFields {
                expected: 4,
                found: fields.len(),
            });
        }
        Ok(TestResult {
            info: counter("info", &fields[0])?,
            success: counter("success", &fields[1])?,
            warning: counter("warning", &fields[2])?,
            failure: counter("failure", &fields[3])?,
        })
    }

    /// `(metric suffix, value)` pairs in the order they are reported.
    pub fn fields(&self) -> [(&'static str, u64); 4] {
        [
            ("info", self.info),
            ("success", self.success),
            ("warning", self.warning),
            ("failure", self.failure),
        ]
    }

    pub fn has_alerts(&self) -> bool {
        self.warning > 0 || self.failure > 0
    }
}

fn counter(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.trim().parse().map_err(|source| ParseError::Counter {
        field,
        value: value.to_string(),
        source,
    })
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "info: {}, success: {}, warning: {}, failure: {}",
            self.info, self.success, self.warning, self.failure
        )
    }
}

impl AddAssign for TestResult {
    fn add_assign(&mut self, rhs: TestResult) {
        self.info += rhs.info;
        self.success += rhs.success;
        self.warning += rhs.warning;
        self.failure += rhs.failure;
    }
}

impl Add for TestResult {
    type Output = TestResult;

    fn add(mut self, rhs: TestResult) -> TestResult {
        self += rhs;
        self
    }
}

impl<'a> Sum<&'a TestResult> for TestResult {
    fn sum<I: Iterator<Item = &'a TestResult>>(iter: I) -> TestResult {
        iter.fold(TestResult::default(), |acc, t| acc + *t)
    }
}

/// Element-wise sum of all tests.
pub fn aggregate(tests: &BTreeMap<String, TestResult>) -> TestResult {
    tests.values().sum()
}

/// WARN results for every test with non-zero warning or failure counts.
///
/// With `prefix_name` the test name leads the summary (`"test_x Warning: 3"`),
/// otherwise it is implied by a preceding result naming the test.
pub fn alerts(test_name: &str, result: &TestResult, prefix_name: bool) -> Vec<CheckResult> {
    if !result.has_alerts() {
        return Vec::new();
    }
    let lead = if prefix_name {
        format!("{} ", test_name)
    } else {
        String::new()
    };

    let mut out = Vec::new();
    if result.warning > 0 {
        out.push(CheckResult::new(
            State::Warn,
            format!("{}Warning: {}", lead, result.warning),
        ));
    }
    if result.failure > 0 {
        out.push(CheckResult::new(
            State::Warn,
            format!("{}Failure: {}", lead, result.failure),
        ));
    }
    out
}
