//! Types for representing the hosts that a run contacts.

use std::fmt::{self, Display};
use std::io::{self, BufRead};

/// One host to contact, e.g. a firewall's management address or DNS name.
///
/// The value is opaque to the dispatcher. Duplicates are legal and produce duplicate outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(String);

impl Target {
    pub fn new(host: impl Into<String>) -> Self {
        Target(host.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(host: &str) -> Self {
        Target::new(host)
    }
}

impl From<String> for Target {
    fn from(host: String) -> Self {
        Target(host)
    }
}

/// The ordered list of hosts for one run.
///
/// Order is preserved from the source and defines submission order: the position of a [Target]
/// in this list is the position its outcome takes when output is sorted by submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new<I, T>(hosts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        hosts.into_iter().collect()
    }

    /// Reads one host per line, e.g. from a pipe.
    ///
    /// Surrounding white space is trimmed and blank lines are skipped, since some shells emit
    /// them between matches.
    pub fn from_lines<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut targets = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let host = line.trim();
            if !host.is_empty() {
                targets.push(Target::new(host));
            }
        }
        Ok(TargetSet { targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }
}

impl<T: Into<Target>> FromIterator<T> for TargetSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        TargetSet {
            targets: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for TargetSet {
    type Item = Target;
    type IntoIter = std::vec::IntoIter<Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
