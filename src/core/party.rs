use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a party holding a payment account.
///
/// A party is a client, an exporter, or an agency (customs or freight)
/// that either pays or is paid against a series of obligations.
///
/// # Examples
///
/// ```
/// use payment_allocator::core::party::PartyId;
///
/// let client = PartyId::new("CLI-FRUTAS-NORTE");
/// let exporter = PartyId::new("EXP-ANDES");
/// assert_ne!(client, exporter);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    /// Create a new party identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this party ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The role a party plays in the business.
///
/// Clients pay us for sales; we pay exporters for orders and agencies for
/// customs and freight expenses. The allocation algorithm is the same for
/// all four, only the default policy differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Client,
    Exporter,
    CustomsAgency,
    FreightAgency,
}

impl PartyKind {
    pub const ALL: [PartyKind; 4] = [
        PartyKind::Client,
        PartyKind::Exporter,
        PartyKind::CustomsAgency,
        PartyKind::FreightAgency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Client => "client",
            PartyKind::Exporter => "exporter",
            PartyKind::CustomsAgency => "customs_agency",
            PartyKind::FreightAgency => "freight_agency",
        }
    }

    /// Parse the snake_case name used in JSON and on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for PartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub kind: PartyKind,
    pub name: String,
}

impl Party {
    pub fn new(id: PartyId, kind: PartyKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
        }
    }
}
