use std::fmt;

use store::Verification;

/// Aggregate verification state drawn on a cluster icon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClusterStatus {
    Verified,
    Unverified,
    /// Verified and unverified children mixed.
    Partial,
    /// At least one child without a verification value.
    Unknown,
}

impl ClusterStatus {
    /// Empty clusters report `Partial`, the cluster icon's neutral class.
    pub fn aggregate(children: impl IntoIterator<Item = Verification>) -> Self {
        let mut verified = false;
        let mut unverified = false;
        for child in children {
            match child {
                Verification::Unknown => return ClusterStatus::Unknown,
                Verification::Verified => verified = true,
                Verification::Unverified => unverified = true,
            }
        }
        match (verified, unverified) {
            (true, false) => ClusterStatus::Verified,
            (false, true) => ClusterStatus::Unverified,
            _ => ClusterStatus::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Verified => "verified",
            ClusterStatus::Unverified => "unverified",
            ClusterStatus::Partial => "partial",
            ClusterStatus::Unknown => "unknown",
        }
    }

    pub fn css_class(&self) -> String {
        format!("marker-cluster marker-cluster-{}", self.as_str())
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
