use crate::core::obligation::{Obligation, ObligationSet};
use crate::core::party::{Party, PartyId, PartyKind};
use crate::core::transfer::{Transfer, TransferSet};
use serde::{Deserialize, Serialize};

/// Everything the allocator needs to reevaluate one party: the party
/// itself, its obligations and its transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyAccount {
    pub party: Party,
    pub obligations: ObligationSet,
    pub transfers: TransferSet,
}

impl PartyAccount {
    pub fn new(party: Party) -> Self {
        Self {
            party,
            obligations: ObligationSet::new(),
            transfers: TransferSet::new(),
        }
    }

    pub fn id(&self) -> &PartyId {
        &self.party.id
    }

    pub fn kind(&self) -> PartyKind {
        self.party.kind
    }

    pub fn add_obligation(&mut self, obligation: Obligation) {
        self.obligations.add(obligation);
    }

    pub fn add_transfer(&mut self, transfer: Transfer) {
        self.transfers.add(transfer);
    }

    pub fn with_obligation(mut self, obligation: Obligation) -> Self {
        self.add_obligation(obligation);
        self
    }

    pub fn with_transfer(mut self, transfer: Transfer) -> Self {
        self.add_transfer(transfer);
        self
    }
}
