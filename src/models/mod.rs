//! Core data models for queries, search records and circulation data.

mod circulation;
mod params;
mod query;
mod record;

pub use circulation::{
    HoldDetails, HoldResult, NormalizedFine, NormalizedHold, NormalizedHolding, NormalizedItem,
    NormalizedTransaction, Patron, PatronProfile, PickupLocation, RenewDetails, RenewResult,
    RenewResults, Renewability,
};
pub use params::ParamBag;
pub use query::{Query, MATCH_ALL};
pub use record::{
    NormalizedRecord, RecordCollection, Spellcheck, SpellingSuggestion, TermCount, Terms,
};
