//! URL status definitions for tracking crawl progress
//!
//! Every canonical URL known to the crawler carries exactly one status.

use std::fmt;

/// Represents the frontier status of a canonical URL
///
/// A URL belongs to exactly one status at any time; the frontier enforces
/// this structurally by keeping a single status tag per URL rather than
/// four parallel sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    /// Discovered and waiting to be fetched
    Pending,

    /// Successfully fetched, or part of a successful redirect chain
    Visited,

    /// Fetch failed after the retry budget, or returned HTTP 404
    Unreachable,

    /// Belongs to a third-party origin; stored in raw form
    External,
}

impl UrlStatus {
    /// Returns true if this is a terminal status for the current run
    ///
    /// Pending URLs still have work owed; everything else is settled until
    /// the next startup reconciliation sweep.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Converts the status to its snapshot-file string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Visited => "visited",
            Self::Unreachable => "unreachable",
            Self::External => "external",
        }
    }

    /// Parses a status from its string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "visited" => Some(Self::Visited),
            "unreachable" => Some(Self::Unreachable),
            "external" => Some(Self::External),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all() -> [Self; 4] {
        [
            Self::Pending,
            Self::Visited,
            Self::Unreachable,
            Self::External,
        ]
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
