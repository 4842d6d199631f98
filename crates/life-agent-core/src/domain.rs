//! The six fixed life domains a commitment belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Life category of a commitment, trigger or intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Business,
    Health,
    Finance,
    Parenting,
    Work,
    Personal,
}

impl Domain {
    /// All domains in canonical order.
    pub const ALL: [Domain; 6] = [
        Domain::Business,
        Domain::Health,
        Domain::Finance,
        Domain::Parenting,
        Domain::Work,
        Domain::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Business => "business",
            Domain::Health => "health",
            Domain::Finance => "finance",
            Domain::Parenting => "parenting",
            Domain::Work => "work",
            Domain::Personal => "personal",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "business" => Ok(Domain::Business),
            "health" => Ok(Domain::Health),
            "finance" => Ok(Domain::Finance),
            "parenting" => Ok(Domain::Parenting),
            "work" => Ok(Domain::Work),
            "personal" => Ok(Domain::Personal),
            other => Err(ValidationError::UnknownDomain(other.to_string())),
        }
    }
}

/// Column value used for triggers that are not tied to a domain.
pub(crate) const GENERAL_SCOPE: &str = "general";

pub(crate) fn scope_to_str(domain: Option<Domain>) -> &'static str {
    domain.map_or(GENERAL_SCOPE, |d| d.as_str())
}

pub(crate) fn scope_from_str(s: &str) -> Result<Option<Domain>, ValidationError> {
    if s == GENERAL_SCOPE {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Business".parse::<Domain>().unwrap(), Domain::Business);
        assert_eq!(" HEALTH ".parse::<Domain>().unwrap(), Domain::Health);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("hobbies".parse::<Domain>().is_err());
    }

    #[test]
    fn display_matches_stored_text() {
        for domain in Domain::ALL {
            assert_eq!(domain.to_string().parse::<Domain>().unwrap(), domain);
        }
    }

    #[test]
    fn general_scope_roundtrip() {
        assert_eq!(scope_to_str(None), "general");
        assert_eq!(scope_from_str("general").unwrap(), None);
        assert_eq!(scope_from_str("work").unwrap(), Some(Domain::Work));
    }
}
