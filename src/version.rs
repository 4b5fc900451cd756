//! Two- and three-component versions and requirement bound updating.

use crate::error::{Error, Result};
use std::cmp::max;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version2 {
    pub major: u64,
    pub minor: u64,
}

impl Version2 {
    pub fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    pub fn bump_major(self) -> Self {
        Self::new(self.major + 1, 0)
    }

    pub fn bump_minor(self) -> Self {
        Self::new(self.major, self.minor + 1)
    }
}

impl fmt::Display for Version2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version2 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_components(s)?.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor)),
            _ => Err(Error::Version(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version3 {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version3 {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn bump_major(self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }

    pub fn bump_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    pub fn bump_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    pub fn version2(self) -> Version2 {
        Version2::new(self.major, self.minor)
    }
}

impl fmt::Display for Version3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version3 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_components(s)?.as_slice() {
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(Error::Version(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version2Or3 {
    Two(Version2),
    Three(Version3),
}

impl Version2Or3 {
    pub fn major(self) -> u64 {
        match self {
            Self::Two(v) => v.major,
            Self::Three(v) => v.major,
        }
    }

    pub fn minor(self) -> u64 {
        match self {
            Self::Two(v) => v.minor,
            Self::Three(v) => v.minor,
        }
    }

    /// Express `self` with the same number of components as `like`.
    /// Dropping a patch truncates; adding one uses zero.
    pub fn coerce_like(self, like: Self) -> Self {
        match (self, like) {
            (Self::Three(v), Self::Two(_)) => Self::Two(v.version2()),
            (Self::Two(v), Self::Three(_)) => Self::Three(Version3::new(v.major, v.minor, 0)),
            _ => self,
        }
    }

    /// The larger of `self` and `other`, in `self`'s arity
    pub fn max_with(self, other: Self) -> Self {
        match (self, other.coerce_like(self)) {
            (Self::Two(a), Self::Two(b)) => Self::Two(max(a, b)),
            (Self::Three(a), Self::Three(b)) => Self::Three(max(a, b)),
            _ => self,
        }
    }
}

impl fmt::Display for Version2Or3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Two(v) => v.fmt(f),
            Self::Three(v) => v.fmt(f),
        }
    }
}

impl FromStr for Version2Or3 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_components(s)?.as_slice() {
            [major, minor] => Ok(Self::Two(Version2::new(*major, *minor))),
            [major, minor, patch] => Ok(Self::Three(Version3::new(*major, *minor, *patch))),
            _ => Err(Error::Version(s.to_string())),
        }
    }
}

/// Exclusive upper bound of a requirement: `<2` or `<1.3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperBound {
    Major(u64),
    Minor(Version2),
}

impl UpperBound {
    /// Smallest bound of this granularity that admits `version`
    fn admitting(self, version: Version2Or3) -> Self {
        match self {
            Self::Major(_) => Self::Major(version.major() + 1),
            Self::Minor(_) => Self::Minor(Version2::new(version.major(), version.minor() + 1)),
        }
    }

    fn max_with(self, other: Self) -> Self {
        match (self, other) {
            (Self::Major(a), Self::Major(b)) => Self::Major(max(a, b)),
            (Self::Minor(a), Self::Minor(b)) => Self::Minor(max(a, b)),
            _ => self,
        }
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major(major) => write!(f, "{major}"),
            Self::Minor(v) => v.fmt(f),
        }
    }
}

impl FromStr for UpperBound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_components(s)?.as_slice() {
            [major] => Ok(Self::Major(*major)),
            [major, minor] => Ok(Self::Minor(Version2::new(*major, *minor))),
            _ => Err(Error::Version(s.to_string())),
        }
    }
}

fn parse_components(s: &str) -> Result<Vec<u64>> {
    s.trim()
        .split('.')
        .map(|part| part.parse::<u64>().map_err(|_| Error::Version(s.to_string())))
        .collect()
}

/// Raise the `>=` and `<` bounds of a requirement so that `latest` is
/// admitted. Bounds never decrease; an `==` pin disables updating.
pub fn update_bounds(
    lower: Option<Version2Or3>,
    upper: Option<UpperBound>,
    fixed: Option<Version2Or3>,
    latest: Option<Version2Or3>,
) -> (Option<Version2Or3>, Option<UpperBound>) {
    let latest = match (fixed, latest) {
        (None, Some(latest)) => latest,
        _ => return (lower, upper),
    };
    match (lower, upper) {
        (None, None) => (Some(latest), Some(UpperBound::Major(latest.major() + 1))),
        (Some(lower), None) => (Some(lower.max_with(latest)), None),
        (None, Some(upper)) => (None, Some(upper.max_with(upper.admitting(latest)))),
        (Some(lower), Some(upper)) => {
            let lower = lower.max_with(latest);
            (Some(lower), Some(upper.max_with(upper.admitting(lower))))
        }
    }
}

/// Latest known version of each package, keyed by normalized name
#[derive(Debug, Clone, Default)]
pub struct VersionSet(HashMap<String, Version2Or3>);

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `version` for `name`; versions that are not two or three
    /// numeric components are skipped.
    pub fn insert(&mut self, name: &str, version: &str) {
        match version.parse::<Version2Or3>() {
            Ok(v) => {
                self.0.insert(normalize_name(name), v);
            }
            Err(_) => tracing::debug!(name, version, "skipping unsupported version"),
        }
    }

    /// Take every entry of `other`, replacing existing ones
    pub fn extend(&mut self, other: VersionSet) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: &str) -> Option<Version2Or3> {
        self.0.get(&normalize_name(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase with runs of `-`, `_` and `.` collapsed to `-`
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_sep = true;
        } else {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        }
    }
    out
}
