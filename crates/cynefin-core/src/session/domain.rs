//! Cynefin domain classification.

use crate::error::CynefinError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The Cynefin domain an analysis session was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CynefinDomain {
    /// Cause and effect are obvious.
    Clear,
    /// Cause and effect require analysis or expertise.
    Complicated,
    /// Cause and effect are only coherent in retrospect.
    Complex,
    /// No perceivable relationship between cause and effect.
    Chaotic,
    /// It is not yet known which domain applies.
    #[default]
    Disorder,
}

impl CynefinDomain {
    /// All domains, in the order they are usually displayed.
    pub const ALL: [CynefinDomain; 5] = [
        CynefinDomain::Clear,
        CynefinDomain::Complicated,
        CynefinDomain::Complex,
        CynefinDomain::Chaotic,
        CynefinDomain::Disorder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CynefinDomain::Clear => "clear",
            CynefinDomain::Complicated => "complicated",
            CynefinDomain::Complex => "complex",
            CynefinDomain::Chaotic => "chaotic",
            CynefinDomain::Disorder => "disorder",
        }
    }
}

impl fmt::Display for CynefinDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CynefinDomain {
    type Err = CynefinError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowercase = value.trim().to_lowercase();
        CynefinDomain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == lowercase)
            .ok_or_else(|| CynefinError::config(format!("Unknown Cynefin domain '{}'", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Complex".parse::<CynefinDomain>().unwrap(), CynefinDomain::Complex);
        assert_eq!(" chaotic ".parse::<CynefinDomain>().unwrap(), CynefinDomain::Chaotic);
        assert!("simple".parse::<CynefinDomain>().is_err());
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&CynefinDomain::Complicated).unwrap();
        assert_eq!(json, "\"complicated\"");
    }
}
