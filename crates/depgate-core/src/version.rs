//! Resolved dependency versions and their total order.
//!
//! A [`DependencyVersion`] is a tuple of numeric components with optional
//! pre-release and build metadata. Comparison only looks at the numeric
//! components and the pre-release tag; build metadata and the descriptive
//! label never influence ordering or equality.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// First version-looking token in free-form text (`PostgreSQL 15.4 on ...`).
static VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^0-9.])v?(\d+(?:\.\d+)+)(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?")
        .expect("version token pattern is valid")
});

/// A version reported by a running dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DependencyVersion {
    components: Vec<u64>,
    pre_release: Prerelease,
    build: BuildMetadata,
    label: Option<String>,
}

impl DependencyVersion {
    /// Create a `major.minor.patch` release version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            components: vec![major, minor, patch],
            pre_release: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
            label: None,
        }
    }

    /// Create a release version from an arbitrary number of components.
    pub fn from_components(components: Vec<u64>) -> Result<Self, VersionError> {
        if components.is_empty() {
            return Err(VersionError::MalformedVersion {
                input: String::new(),
                reason: "at least one numeric component is required".to_string(),
            });
        }
        Ok(Self {
            components,
            pre_release: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
            label: None,
        })
    }

    /// Parse `[v]N(.N)*[-pre][+build]`.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let malformed = |reason: String| VersionError::MalformedVersion {
            input: text.to_string(),
            reason,
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(malformed("version is empty".to_string()));
        }
        let body = trimmed.strip_prefix(|c: char| c == 'v' || c == 'V').unwrap_or(trimmed);

        let (rest, build) = match body.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (body, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let components = core
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed(format!(
                        "component '{segment}' is not a non-negative integer"
                    )));
                }
                segment
                    .parse::<u64>()
                    .map_err(|_| malformed(format!("component '{segment}' is too large")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pre_release = match pre {
            Some("") => return Err(malformed("pre-release tag is empty".to_string())),
            Some(pre) => Prerelease::new(pre)
                .map_err(|e| malformed(format!("invalid pre-release '{pre}': {e}")))?,
            None => Prerelease::EMPTY,
        };
        let build = match build {
            Some("") => return Err(malformed("build metadata is empty".to_string())),
            Some(build) => BuildMetadata::new(build)
                .map_err(|e| malformed(format!("invalid build metadata '{build}': {e}")))?,
            None => BuildMetadata::EMPTY,
        };

        Ok(Self {
            components,
            pre_release,
            build,
            label: None,
        })
    }

    /// Find and parse the first version-looking token in `text`.
    ///
    /// Meant for tool output such as `cargo 1.75.0 (1d8b05cdd 2023-11-20)`.
    /// A token needs at least two numeric components. If the trailing
    /// pre-release or build part is not valid, only the numeric part is kept.
    pub fn extract(text: &str) -> Option<Self> {
        let captures = VERSION_TOKEN.captures(text)?;
        let numeric = captures.get(1)?;
        let end = captures.get(0)?.end();
        Self::parse(&text[numeric.start()..end])
            .or_else(|_| Self::parse(numeric.as_str()))
            .ok()
    }

    /// Attach descriptive context, e.g. an operating-system name or node address.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// All numeric components as given.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn major(&self) -> u64 {
        self.component(0)
    }

    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    pub fn patch(&self) -> u64 {
        self.component(2)
    }

    /// Component at `index`; missing trailing components read as zero.
    pub fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }

    pub fn pre_release(&self) -> Option<&str> {
        (!self.pre_release.is_empty()).then(|| self.pre_release.as_str())
    }

    pub fn build_metadata(&self) -> Option<&str> {
        (!self.build.is_empty()).then(|| self.build.as_str())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre_release.is_empty()
    }

    /// Release version whose component at `index` is incremented and every
    /// later component dropped (`1.2.3` bumped at 1 is `1.3`).
    pub(crate) fn bumped(&self, index: usize) -> Self {
        let mut components: Vec<u64> = (0..index).map(|i| self.component(i)).collect();
        components.push(self.component(index).saturating_add(1));
        Self {
            components,
            pre_release: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
            label: None,
        }
    }

    /// Components with insignificant trailing zeros removed.
    fn significant_components(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |pos| pos + 1);
        &self.components[..len]
    }
}

/// Release sorts above any pre-release of the same numeric version.
fn compare_pre_release(a: &Prerelease, b: &Prerelease) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

impl Ord for DependencyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for index in 0..len {
            match self.component(index).cmp(&other.component(index)) {
                Ordering::Equal => {}
                ordering => return ordering,
            }
        }
        compare_pre_release(&self.pre_release, &other.pre_release)
    }
}

impl PartialOrd for DependencyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DependencyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DependencyVersion {}

impl Hash for DependencyVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_components().hash(state);
        self.pre_release.as_str().hash(state);
    }
}

impl fmt::Display for DependencyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, component) in self.components.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        if !self.pre_release.is_empty() {
            write!(f, "-{}", self.pre_release)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl FromStr for DependencyVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DependencyVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DependencyVersion> for String {
    fn from(version: DependencyVersion) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn v(text: &str) -> DependencyVersion {
        DependencyVersion::parse(text).unwrap()
    }

    #[test]
    fn test_parse_release() {
        let version = v("4.2.1");
        assert_eq!(version.components(), &[4, 2, 1]);
        assert_eq!(version.major(), 4);
        assert_eq!(version.minor(), 2);
        assert_eq!(version.patch(), 1);
        assert!(version.pre_release().is_none());
        assert_eq!(version.to_string(), "4.2.1");
    }

    #[test]
    fn test_parse_prefix_and_whitespace() {
        assert_eq!(v(" v20.10.0 \n"), DependencyVersion::new(20, 10, 0));
        assert_eq!(v("V1.0"), DependencyVersion::new(1, 0, 0));
    }

    #[test]
    fn test_parse_extra_segments() {
        let version = v("10.0.19045.3803");
        assert_eq!(version.components(), &[10, 0, 19045, 3803]);
        assert!(version > v("10.0.19045"));
        assert!(version < v("10.0.19046"));
    }

    #[test]
    fn test_parse_pre_release_and_build() {
        let version = v("15.0.0-rc.1+build.7");
        assert_eq!(version.pre_release(), Some("rc.1"));
        assert_eq!(version.build_metadata(), Some("build.7"));
        assert_eq!(version.to_string(), "15.0.0-rc.1+build.7");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "", "   ", "abc", "1..2", "1.2.", ".1", "-1.0", "1.0-", "1.0+", "1.x.3", "1.-2",
        ] {
            let err = DependencyVersion::parse(input).unwrap_err();
            assert!(
                matches!(err, VersionError::MalformedVersion { .. }),
                "expected malformed error for {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(DependencyVersion::parse("1.99999999999999999999999").is_err());
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("4.2"), v("4.2.0"));
        assert_eq!(v("4"), v("4.0.0.0"));
        assert_eq!(v("4.2").cmp(&v("4.2.0")), Ordering::Equal);

        let mut set = HashSet::new();
        set.insert(v("4.2"));
        assert!(set.contains(&v("4.2.0")));
    }

    #[test]
    fn test_pre_release_precedence() {
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_build_metadata_and_label_ignored() {
        assert_eq!(v("1.2.3+abc"), v("1.2.3+def"));
        assert_eq!(v("22.04").with_label("Ubuntu"), v("22.04"));
        assert_eq!(v("22.04").with_label("Ubuntu").label(), Some("Ubuntu"));
    }

    #[test]
    fn test_total_order_laws() {
        let samples: Vec<DependencyVersion> = [
            "0.9", "1", "1.0.1", "1.0.0-rc.1", "1.0.0-alpha", "1.10", "1.2", "2.0.0.1", "2",
            "1.2.0", "0.0.0",
        ]
        .iter()
        .map(|s| v(s))
        .collect();

        for a in &samples {
            for b in &samples {
                // Antisymmetry and trichotomy
                assert_eq!(a.cmp(b), b.cmp(a).reverse());
                assert_eq!(a == b, a.cmp(b) == Ordering::Equal);
                for c in &samples {
                    if a <= b && b <= c {
                        assert!(a <= c, "transitivity: {a} <= {b} <= {c}");
                    }
                }
            }
        }

        let mut sorted = samples.clone();
        sorted.sort();
        let rendered: Vec<String> = sorted.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "0.0.0",
                "0.9",
                "1.0.0-alpha",
                "1.0.0-rc.1",
                "1",
                "1.0.1",
                "1.2",
                "1.2.0",
                "1.10",
                "2",
                "2.0.0.1"
            ]
        );
    }

    #[test]
    fn test_extract_from_tool_output() {
        let cases = [
            ("PostgreSQL 15.4 on x86_64-pc-linux-gnu", "15.4"),
            ("cargo 1.75.0 (1d8b05cdd 2023-11-20)", "1.75.0"),
            ("v20.10.0", "20.10.0"),
            ("Redis server v=7.2.4 sha=00000000:0", "7.2.4"),
            ("mongod version 7.0.2-rc0", "7.0.2-rc0"),
            ("go version go1.21.5 linux/amd64", "1.21.5"),
            ("OpenSSL3.0.2 15 Mar 2022", "3.0.2"),
        ];
        for (text, expected) in cases {
            let version = DependencyVersion::extract(text).unwrap();
            assert_eq!(version.to_string(), expected, "extracting from {text:?}");
        }
        assert!(DependencyVersion::extract("no version here").is_none());
        assert!(DependencyVersion::extract("build 42").is_none());
    }

    #[test]
    fn test_bumped() {
        assert_eq!(v("1.2.3").bumped(0).to_string(), "2");
        assert_eq!(v("1.2.3").bumped(1).to_string(), "1.3");
        assert_eq!(v("1").bumped(2).to_string(), "1.0.1");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.2.3-beta.1")).unwrap();
        assert_eq!(json, "\"1.2.3-beta.1\"");
        let parsed: DependencyVersion = serde_json::from_str("\"v2.0\"").unwrap();
        assert_eq!(parsed, v("2.0.0"));
        assert!(serde_json::from_str::<DependencyVersion>("\"nope\"").is_err());
    }

    #[test]
    fn test_from_components() {
        let version = DependencyVersion::from_components(vec![3, 11, 4]).unwrap();
        assert_eq!(version, DependencyVersion::new(3, 11, 4));
        assert!(DependencyVersion::from_components(Vec::new()).is_err());
    }
}
