//! Typed ids for module-specific interactions.
//!
//! Loyalty cards and origin stars come from fixed content lists, so they get
//! enums. The UI may still hand us an id we do not know about (content edits
//! ship before code does); those are kept verbatim in an `Other` variant rather
//! than rejected, because progression tracking must never break the host UI.
//! Like every other interaction id, they are compared as exact strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of node ids synthesised for anonymous systems-node opens.
pub const ANONYMOUS_NODE_PREFIX: &str = "anon-";

/// A loyalty card that can be flipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardId {
    /// San Francisco Giants card.
    Giants,
    /// San Francisco 49ers card.
    Niners,
    /// Any card id not known to this build.
    Other(String),
}

impl CardId {
    /// Cards required for loyalty completion.
    pub const REQUIRED: [Self; 2] = [Self::Giants, Self::Niners];

    /// Stable string id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Giants => "giants",
            Self::Niners => "niners",
            Self::Other(id) => id,
        }
    }
}

/// Ids are matched exactly; anything else is kept verbatim as `Other`.
impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        match value {
            "giants" => Self::Giants,
            "niners" => Self::Niners,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<CardId> for String {
    fn from(value: CardId) -> Self {
        match value {
            CardId::Other(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A star in the origin constellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StarId {
    /// "husband"
    Husband,
    /// "dad"
    Dad,
    /// "builder"
    Builder,
    /// "systems-thinker"
    SystemsThinker,
    /// "musician"
    Musician,
    /// "entrepreneur"
    Entrepreneur,
    /// Any star id not known to this build.
    Other(String),
}

impl StarId {
    /// The constellation's known stars, in display order.
    pub const KNOWN: [Self; 6] = [
        Self::Husband,
        Self::Dad,
        Self::Builder,
        Self::SystemsThinker,
        Self::Musician,
        Self::Entrepreneur,
    ];

    /// Stable string id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Husband => "husband",
            Self::Dad => "dad",
            Self::Builder => "builder",
            Self::SystemsThinker => "systems-thinker",
            Self::Musician => "musician",
            Self::Entrepreneur => "entrepreneur",
            Self::Other(id) => id,
        }
    }
}

/// Ids are matched exactly; anything else is kept verbatim as `Other`.
impl From<&str> for StarId {
    fn from(value: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|star| star.as_str() == value)
            .unwrap_or_else(|| Self::Other(value.to_string()))
    }
}

impl From<String> for StarId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<StarId> for String {
    fn from(value: StarId) -> Self {
        match value {
            StarId::Other(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fresh, never-repeating systems-node id for opens that carry no id.
#[must_use]
pub fn anonymous_node_id() -> String {
    format!("{ANONYMOUS_NODE_PREFIX}{}", Uuid::new_v4())
}
