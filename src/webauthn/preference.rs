//! Attestation conveyance preference
//!
//! Relying parties use this to state how much attestation they want back from
//! the authenticator during credential creation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when a token is not one of the recognized preference values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown attestation conveyance preference: {token:?}")]
pub struct UnknownPreference {
    pub token: String,
}

/// Relying party preference regarding attestation conveyance
///
/// Ordering follows declaration order and carries no meaning beyond a stable
/// sort. The wire token is a presentation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AttestationPreference {
    /// The relying party is not interested in authenticator attestation
    #[default]
    None,
    /// Verifiable attestation is preferred, but the client may anonymize it
    Indirect,
    /// The attestation statement as generated by the authenticator
    Direct,
}

impl AttestationPreference {
    pub const ALL: [Self; 3] = [Self::None, Self::Indirect, Self::Direct];

    /// Wire token for this preference
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Indirect => "indirect",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for AttestationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttestationPreference {
    type Err = UnknownPreference;

    // Exact match only: no case folding, no trimming, no fallback to the default.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preference| preference.as_str() == token)
            .ok_or_else(|| UnknownPreference {
                token: token.to_string(),
            })
    }
}

impl TryFrom<&str> for AttestationPreference {
    type Error = UnknownPreference;

    fn try_from(token: &str) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl TryFrom<String> for AttestationPreference {
    type Error = UnknownPreference;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}
