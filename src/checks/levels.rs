use chrono::NaiveDateTime;
use serde::Deserialize;

use super::render::timespan;
use super::{CheckResult, State};
use crate::error::ConfigError;

/// Upper age bounds in seconds. `warning_seconds <= critical_seconds` is the
/// convention but is not enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning_seconds: f64,
    pub critical_seconds: f64,
}

impl Thresholds {
    pub fn new(warning_seconds: f64, critical_seconds: f64) -> Self {
        Thresholds {
            warning_seconds,
            critical_seconds,
        }
    }

    /// CRIT above the critical bound, WARN above the warning bound.
    pub fn classify(&self, value: f64) -> State {
        if value > self.critical_seconds {
            State::Crit
        } else if value > self.warning_seconds {
            State::Warn
        } else {
            State::Ok
        }
    }
}

/// The `maxage` rule value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawLevels")]
pub enum Levels {
    NoLevels,
    Fixed(Thresholds),
}

impl Levels {
    pub fn fixed(warning_seconds: f64, critical_seconds: f64) -> Self {
        Levels::Fixed(Thresholds::new(warning_seconds, critical_seconds))
    }

    pub fn thresholds(&self) -> Option<&Thresholds> {
        match self {
            Levels::NoLevels => None,
            Levels::Fixed(t) => Some(t),
        }
    }
}

/// Encodings found in rule storage: `["fixed", [w, c]]`,
/// `["no_levels", null]` and the older bare `[w, c]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevels {
    Tagged(String, Option<(f64, f64)>),
    Legacy(f64, f64),
}

impl TryFrom<RawLevels> for Levels {
    type Error = ConfigError;

    fn try_from(raw: RawLevels) -> Result<Self, Self::Error> {
        match raw {
            RawLevels::Legacy(w, c) => Ok(Levels::fixed(w, c)),
            RawLevels::Tagged(kind, pair) => match (kind.as_str(), pair) {
                ("no_levels", _) => Ok(Levels::NoLevels),
                ("fixed", Some((w, c))) => Ok(Levels::fixed(w, c)),
                ("fixed", None) => Err(ConfigError::MissingLevels),
                _ => Err(ConfigError::UnknownLevels(kind)),
            },
        }
    }
}

/// What the age refers to; picks the summary label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeLabel {
    LastSync,
    LastRun,
}

impl AgeLabel {
    fn text(self, future: bool) -> &'static str {
        match (self, future) {
            (AgeLabel::LastSync, false) => "Last Sync",
            (AgeLabel::LastSync, true) => "Last Sync in",
            (AgeLabel::LastRun, false) => "Last Run",
            (AgeLabel::LastRun, true) => "Last Run in",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeEvaluation {
    pub state: State,
    /// `now - last`; negative when the timestamp lies in the future.
    pub elapsed_seconds: f64,
    pub label: &'static str,
    pub summary: String,
}

impl AgeEvaluation {
    pub fn into_result(self) -> CheckResult {
        CheckResult::new(self.state, self.summary)
    }
}

pub fn elapsed_seconds(last: NaiveDateTime, now: NaiveDateTime) -> f64 {
    let delta = now - last;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_seconds() as f64,
    }
}

/// Classify the age of `last` at `now` against optional upper levels.
///
/// Only the magnitude of the age is graded, so a timestamp far in the future
/// is just as critical as one far in the past.
pub fn evaluate_age(
    last: NaiveDateTime,
    now: NaiveDateTime,
    levels: Option<&Levels>,
    label: AgeLabel,
) -> AgeEvaluation {
    let elapsed = elapsed_seconds(last, now);
    let label = label.text(elapsed < 0.0);
    let magnitude = elapsed.abs();

    let thresholds = levels.and_then(Levels::thresholds);
    let state = thresholds.map_or(State::Ok, |t| t.classify(magnitude));

    let mut summary = format!("{}: {}", label, timespan(magnitude));
    if let (Some(t), true) = (thresholds, state != State::Ok) {
        summary.push_str(&format!(
            " (warn/crit at {}/{})",
            timespan(t.warning_seconds),
            timespan(t.critical_seconds)
        ));
    }

    AgeEvaluation {
        state,
        elapsed_seconds: elapsed,
        label,
        summary,
    }
}

/// Like [`evaluate_age`], but a missing timestamp is UNKNOWN with
/// `never_message` as summary.
pub fn evaluate_last_run(
    last: Option<NaiveDateTime>,
    now: NaiveDateTime,
    levels: Option<&Levels>,
    label: AgeLabel,
    never_message: impl FnOnce() -> String,
) -> CheckResult {
    match last {
        Some(last) => evaluate_age(last, now, levels, label).into_result(),
        None => CheckResult::new(State::Unknown, never_message()),
    }
}
