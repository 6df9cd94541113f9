//! Normalized circulation shapes returned by ILS drivers.
//!
//! Every field has a concrete value: missing upstream data becomes an empty
//! string or `false`, so callers never see absent keys.

use serde::{Deserialize, Serialize};

/// An authenticated patron
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patron {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub cat_username: String,
    pub cat_password: String,
    pub email: Option<String>,
    pub major: Option<String>,
    pub college: Option<String>,
}

impl Patron {
    /// A patron known only by id, enough for circulation lookups
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Contact details of a patron
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatronProfile {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub address1: String,
    pub address2: Option<String>,
    pub zip: String,
    pub phone: String,
    pub group: String,
}

/// A physical holding (location + call number) that owns items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedHolding {
    pub holdings_id: String,
    pub location: String,
    pub callnumber: String,
}

/// One physical copy with its availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedItem {
    pub id: String,
    pub item_id: String,
    pub availability: bool,
    pub status: String,
    pub location: String,
    pub reserve: String,
    pub callnumber: String,
    pub return_date: String,
    pub number: String,
    pub requests_placed: String,
    pub barcode: String,
    pub notes: String,
    pub summary: String,
    pub is_holdable: bool,
    pub holdtype: String,
    pub add_link: bool,
}

/// A checked-out item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTransaction {
    pub id: String,
    pub item_id: String,
    pub duedate: String,
    pub due_time: String,
    pub due_status: String,
    pub volume: String,
    pub publication_year: String,
    pub title: String,
    pub renewable: bool,
    pub message: String,
}

/// A request (hold/recall/page) placed by the patron
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedHold {
    pub id: String,
    pub item_id: String,
    pub request_type: String,
    pub location: String,
    pub expire: String,
    pub create: String,
    pub position: String,
    pub available: bool,
    pub reqnum: String,
    pub volume: String,
    pub publication_year: String,
    pub title: String,
}

/// An outstanding fine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedFine {
    pub id: String,
    pub amount: String,
    pub fine: String,
    pub balance: String,
    pub createdate: String,
    pub checkout: String,
    pub duedate: String,
}

/// Whether a loan may be renewed, with the reason shown to the patron
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renewability {
    pub renewable: bool,
    pub message: String,
}

/// Input for placing a hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldDetails {
    pub patron: Patron,
    /// Bibliographic record id
    pub id: String,
    /// Barcode of the copy to request
    pub barcode: String,
}

/// Outcome of a hold request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldResult {
    pub success: bool,
    pub sys_message: String,
}

/// Input for renewing loans.
///
/// Each detail string is produced by `get_renew_details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewDetails {
    pub patron: Patron,
    pub details: Vec<String>,
}

/// Outcome of renewing a single loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenewResult {
    pub success: bool,
    pub new_date: Option<String>,
    /// Barcode of the renewed copy
    pub item_id: String,
    pub sys_message: String,
}

/// Renewal outcomes in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenewResults {
    pub details: Vec<RenewResult>,
}

impl RenewResults {
    /// Outcome for a barcode
    pub fn get(&self, barcode: &str) -> Option<&RenewResult> {
        self.details.iter().find(|r| r.item_id == barcode)
    }
}

/// A location where holds can be collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub location_id: String,
    pub location_display: String,
}
