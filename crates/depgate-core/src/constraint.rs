//! Declared acceptable version ranges.
//!
//! A [`VersionConstraint`] is an optional lower and optional upper bound,
//! each inclusive or exclusive. It is parsed once, when a descriptor is
//! built, so a malformed or unsatisfiable range fails before any resolver
//! runs.
//!
//! Accepted forms:
//!
//! - comparator lists: `>=4.0.0,<5.0.0`, `> 1.2 <= 2`, `=1.2.3`, `1.2.3`
//! - any version: `*`
//! - caret and tilde: `^4.2` (`>=4.2,<5`), `~4.2` (`>=4.2,<4.3`)
//! - interval notation: `[1.0,2.0)`, `(,3.0]`, `[1.2.3]`

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionError;
use crate::version::DependencyVersion;

const OPERATORS: [&str; 8] = [">=", "<=", "==", ">", "<", "=", "^", "~"];

/// One end of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: DependencyVersion,
    pub inclusive: bool,
}

impl Bound {
    pub const fn inclusive(version: DependencyVersion) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    pub const fn exclusive(version: DependencyVersion) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// A predicate over [`DependencyVersion`], kept together with its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    text: String,
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl VersionConstraint {
    /// Constraint accepting every version.
    pub fn any() -> Self {
        Self {
            text: "*".to_string(),
            lower: None,
            upper: None,
        }
    }

    /// Constraint accepting exactly `version`.
    pub fn exact(version: &DependencyVersion) -> Self {
        Self {
            text: format!("={version}"),
            lower: Some(Bound::inclusive(version.clone())),
            upper: Some(Bound::inclusive(version.clone())),
        }
    }

    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(malformed(text, "constraint is empty"));
        }

        let (lower, upper) = if trimmed == "*" {
            (None, None)
        } else if trimmed.starts_with(|c: char| c == '[' || c == '(') {
            parse_interval(text, trimmed)?
        } else {
            parse_comparators(text, trimmed)?
        };

        if let (Some(lower), Some(upper)) = (&lower, &upper) {
            match lower.version.cmp(&upper.version) {
                Ordering::Greater => {
                    return Err(malformed(
                        text,
                        &format!(
                            "lower bound {} is above upper bound {}",
                            lower.version, upper.version
                        ),
                    ));
                }
                Ordering::Equal if !(lower.inclusive && upper.inclusive) => {
                    return Err(malformed(
                        text,
                        &format!("range around {} is empty", lower.version),
                    ));
                }
                _ => {}
            }
        }

        Ok(Self {
            text: trimmed.to_string(),
            lower,
            upper,
        })
    }

    /// Whether `version` lies inside the range.
    pub fn is_satisfied_by(&self, version: &DependencyVersion) -> bool {
        let above_lower = self
            .lower
            .as_ref()
            .is_none_or(|bound| match version.cmp(&bound.version) {
                Ordering::Greater => true,
                Ordering::Equal => bound.inclusive,
                Ordering::Less => false,
            });
        let below_upper = self
            .upper
            .as_ref()
            .is_none_or(|bound| match version.cmp(&bound.version) {
                Ordering::Less => true,
                Ordering::Equal => bound.inclusive,
                Ordering::Greater => false,
            });
        above_lower && below_upper
    }

    pub fn lower(&self) -> Option<&Bound> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&Bound> {
        self.upper.as_ref()
    }

    pub fn is_any(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// The constraint as it was written.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn malformed(input: &str, reason: &str) -> VersionError {
    VersionError::MalformedConstraint {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_version(input: &str, text: &str) -> Result<DependencyVersion, VersionError> {
    DependencyVersion::parse(text).map_err(|e| match e {
        VersionError::MalformedVersion { reason, .. } => {
            malformed(input, &format!("'{text}': {reason}"))
        }
        other => other,
    })
}

/// Keep the tighter of two lower bounds (exclusive wins on a tie).
fn tighten_lower(current: Option<Bound>, candidate: Bound) -> Option<Bound> {
    Some(match current {
        None => candidate,
        Some(existing) => match candidate.version.cmp(&existing.version) {
            Ordering::Greater => candidate,
            Ordering::Less => existing,
            Ordering::Equal => Bound {
                inclusive: existing.inclusive && candidate.inclusive,
                version: existing.version,
            },
        },
    })
}

/// Keep the tighter of two upper bounds (exclusive wins on a tie).
fn tighten_upper(current: Option<Bound>, candidate: Bound) -> Option<Bound> {
    Some(match current {
        None => candidate,
        Some(existing) => match candidate.version.cmp(&existing.version) {
            Ordering::Less => candidate,
            Ordering::Greater => existing,
            Ordering::Equal => Bound {
                inclusive: existing.inclusive && candidate.inclusive,
                version: existing.version,
            },
        },
    })
}

/// Split a comparator list into `op+version` tokens, joining an operator
/// written apart from its version (`>= 4.0`).
fn comparator_tokens(input: &str, text: &str) -> Result<Vec<String>, VersionError> {
    let mut tokens = Vec::new();
    let mut pending: Option<&str> = None;

    for raw in text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if let Some(op) = pending.take() {
            if OPERATORS.contains(&raw) {
                return Err(malformed(input, &format!("operator '{op}' has no version")));
            }
            tokens.push(format!("{op}{raw}"));
        } else if OPERATORS.contains(&raw) {
            pending = Some(raw);
        } else {
            tokens.push(raw.to_string());
        }
    }

    if let Some(op) = pending {
        return Err(malformed(input, &format!("operator '{op}' has no version")));
    }
    if tokens.is_empty() {
        return Err(malformed(input, "no comparators found"));
    }
    Ok(tokens)
}

fn parse_comparators(
    input: &str,
    text: &str,
) -> Result<(Option<Bound>, Option<Bound>), VersionError> {
    let mut lower = None;
    let mut upper = None;

    for token in comparator_tokens(input, text)? {
        if let Some(rest) = token.strip_prefix(">=") {
            lower = tighten_lower(lower, Bound::inclusive(parse_version(input, rest)?));
        } else if let Some(rest) = token.strip_prefix("<=") {
            upper = tighten_upper(upper, Bound::inclusive(parse_version(input, rest)?));
        } else if let Some(rest) = token.strip_prefix('>') {
            lower = tighten_lower(lower, Bound::exclusive(parse_version(input, rest)?));
        } else if let Some(rest) = token.strip_prefix('<') {
            upper = tighten_upper(upper, Bound::exclusive(parse_version(input, rest)?));
        } else if let Some(rest) = token.strip_prefix('^') {
            let base = parse_version(input, rest)?;
            let given = base.components().len();
            let index = base.components()[..given.min(3)]
                .iter()
                .position(|&c| c != 0)
                .unwrap_or(given - 1);
            upper = tighten_upper(upper, Bound::exclusive(base.bumped(index)));
            lower = tighten_lower(lower, Bound::inclusive(base));
        } else if let Some(rest) = token.strip_prefix('~') {
            let base = parse_version(input, rest)?;
            let index = usize::from(base.components().len() >= 2);
            upper = tighten_upper(upper, Bound::exclusive(base.bumped(index)));
            lower = tighten_lower(lower, Bound::inclusive(base));
        } else {
            let rest = token
                .strip_prefix("==")
                .or_else(|| token.strip_prefix('='))
                .unwrap_or(&token);
            let version = parse_version(input, rest)?;
            lower = tighten_lower(lower, Bound::inclusive(version.clone()));
            upper = tighten_upper(upper, Bound::inclusive(version));
        }
    }

    Ok((lower, upper))
}

fn parse_interval(
    input: &str,
    text: &str,
) -> Result<(Option<Bound>, Option<Bound>), VersionError> {
    let lower_inclusive = text.starts_with('[');
    let upper_inclusive = match text.chars().last() {
        Some(']') => true,
        Some(')') => false,
        _ => return Err(malformed(input, "interval is not closed with ']' or ')'")),
    };
    if text.len() < 2 {
        return Err(malformed(input, "interval is empty"));
    }
    let inner = &text[1..text.len() - 1];

    let Some((low, high)) = inner.split_once(',') else {
        if !(lower_inclusive && upper_inclusive) {
            return Err(malformed(
                input,
                "single-version interval must use '[' and ']'",
            ));
        }
        let version = parse_version(input, inner.trim())?;
        return Ok((
            Some(Bound::inclusive(version.clone())),
            Some(Bound::inclusive(version)),
        ));
    };

    if high.contains(',') {
        return Err(malformed(input, "interval has more than two bounds"));
    }
    let (low, high) = (low.trim(), high.trim());
    if low.is_empty() && high.is_empty() {
        return Err(malformed(input, "interval needs at least one bound"));
    }

    let lower = if low.is_empty() {
        None
    } else {
        Some(Bound {
            version: parse_version(input, low)?,
            inclusive: lower_inclusive,
        })
    };
    let upper = if high.is_empty() {
        None
    } else {
        Some(Bound {
            version: parse_version(input, high)?,
            inclusive: upper_inclusive,
        })
    };
    Ok((lower, upper))
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(constraint: VersionConstraint) -> Self {
        constraint.text
    }
}
