//! Integrated library system drivers.
//!
//! An [`IlsDriver`] answers patron and item questions for the discovery
//! layer. [`OleDriver`] talks to Kuali OLE: its circulation service (XML),
//! its Solr index (JSON) and its docstore (JSON).
//!
//! # Logical failures
//!
//! The circulation service answers HTTP 200 even when it refused a request;
//! the embedded `<code>` is the only trustworthy signal. Listings with a
//! non-success code are empty, and state-changing calls report
//! `success == false`. Neither is an error.

pub mod normalize;
mod ole;

pub use ole::{CircService, OleDriver};

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::CatalogError;
use crate::models::{
    HoldDetails, HoldResult, NormalizedFine, NormalizedHold, NormalizedItem, NormalizedTransaction, Patron,
    PatronProfile, PickupLocation, RenewDetails, RenewResults,
};
use crate::payload::Payload;

bitflags::bitflags! {
    /// Operations a driver supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriverCapabilities: u32 {
        const PATRON_LOGIN = 1 << 0;
        const PROFILE = 1 << 1;
        const TRANSACTIONS = 1 << 2;
        const HOLDS = 1 << 3;
        const FINES = 1 << 4;
        const STATUS = 1 << 5;
        const HOLDING = 1 << 6;
        const HOLDING_TREE = 1 << 7;
        const PLACE_HOLD = 1 << 8;
        const RENEW = 1 << 9;
        const PICKUP_LOCATIONS = 1 << 10;
        const PURCHASE_HISTORY = 1 << 11;
    }
}

/// Parameterized patron lookup prepared by a driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatronQuery {
    /// Statement with `:login` and `:barcode` placeholders
    pub sql: String,

    /// Lowercased value bound to `:login`
    pub login: String,

    /// Lowercased value bound to `:barcode`
    pub barcode: String,
}

/// One result row, column name to value
pub type PatronRow = BTreeMap<String, String>;

/// Executes patron lookups against the ILS database.
///
/// The connection is owned by the store and used one query at a time.
#[async_trait]
pub trait PatronStore: Send + Sync + std::fmt::Debug {
    /// First row matching the query, if any
    async fn fetch_patron(&self, query: &PatronQuery) -> Result<Option<PatronRow>, CatalogError>;
}

/// Interface of an ILS driver.
///
/// Operations a driver does not advertise in [`IlsDriver::capabilities`]
/// report [`CatalogError::NotImplemented`].
#[async_trait]
pub trait IlsDriver: Send + Sync + std::fmt::Debug {
    fn capabilities(&self) -> DriverCapabilities;

    /// Authenticate a patron; `None` when the credentials match nobody
    async fn patron_login(&self, _barcode: &str, _login: &str) -> Result<Option<Patron>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    async fn get_my_profile(&self, _patron: &Patron) -> Result<PatronProfile, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Checked out items
    async fn get_my_transactions(&self, _patron: &Patron) -> Result<Vec<NormalizedTransaction>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    async fn get_my_holds(&self, _patron: &Patron) -> Result<Vec<NormalizedHold>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    async fn get_my_fines(&self, _patron: &Patron) -> Result<Vec<NormalizedFine>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Status of every item of a record
    async fn get_status(&self, id: &str) -> Result<Vec<NormalizedItem>, CatalogError>;

    /// Statuses for several records, looked up one after another in order
    async fn get_statuses(&self, ids: &[String]) -> Result<Vec<Vec<NormalizedItem>>, CatalogError> {
        let mut statuses = Vec::with_capacity(ids.len());
        for id in ids {
            statuses.push(self.get_status(id).await?);
        }
        Ok(statuses)
    }

    /// Holdings of a record, flattened to items
    async fn get_holding(&self, id: &str) -> Result<Vec<NormalizedItem>, CatalogError>;

    /// Holdings of a record from a single tree lookup
    async fn get_holding_tree(&self, _id: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    async fn place_hold(&self, _details: &HoldDetails) -> Result<HoldResult, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    async fn renew_my_items(&self, _details: &RenewDetails) -> Result<RenewResults, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Form value identifying a transaction for renewal
    fn get_renew_details(&self, transaction: &NormalizedTransaction) -> String {
        format!("{},{}", transaction.item_id, transaction.id)
    }

    fn get_pickup_locations(&self) -> Vec<PickupLocation> {
        Vec::new()
    }

    fn get_default_pickup_location(&self) -> Option<String> {
        None
    }

    /// Recently received issues of a serial
    async fn get_purchase_history(&self, _id: &str) -> Result<Vec<Payload>, CatalogError> {
        Ok(Vec::new())
    }
}
