//! Configuration management.
//!
//! # Configuration File Format
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//!
//! [catalog]
//! circulation_service = "http://localhost:8080/olefs/circulation"
//! docstore_service = "http://localhost:8080/oledocstore/document"
//! solr_service = "http://localhost:8080/oledocstore/bib/select"
//! login_field = "LAST_NAME"
//!
//! [catalog.database]
//! host = "localhost"
//! port = 3306
//! name = "ole"
//!
//! [holds]
//! default_pickup_location = "1"
//!
//! [renewals]
//! check_up_front = true
//!
//! [identifiers]
//! bib_prefix = "wbm-"
//!
//! [search]
//! url = "http://localhost:8080/solr/biblio"
//! dictionaries = ["default", "basicSpell"]
//! ```
//!
//! Every value can be overridden from the environment with the
//! `CATALOG_BRIDGE_` prefix and `__` as the section separator, e.g.
//! `CATALOG_BRIDGE_SEARCH__URL`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::models::{ParamBag, PickupLocation};
use crate::utils::DEFAULT_TIMEOUT_SECS;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CATALOG_BRIDGE";

/// File name searched for in the working directory
pub const CONFIG_FILE_NAME: &str = "catalog-bridge.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub holds: HoldsConfig,

    #[serde(default)]
    pub renewals: RenewalsConfig,

    #[serde(default)]
    pub identifiers: IdentifierConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// ILS connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Patron name column compared against the login secret
    #[serde(default = "default_login_field")]
    pub login_field: String,

    /// Circulation service endpoint
    #[serde(default)]
    pub circulation_service: String,

    /// Document store endpoint (holdings trees)
    #[serde(default)]
    pub docstore_service: String,

    /// Solr select endpoint of the document store index
    #[serde(default)]
    pub solr_service: String,

    /// Operator used for ordinary circulation calls
    #[serde(default = "default_operator")]
    pub operator_id: String,

    /// Operator used for profile lookups and renewals
    #[serde(default = "default_privileged_operator")]
    pub privileged_operator_id: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            login_field: default_login_field(),
            circulation_service: String::new(),
            docstore_service: String::new(),
            solr_service: String::new(),
            operator_id: default_operator(),
            privileged_operator_id: default_privileged_operator(),
        }
    }
}

fn default_login_field() -> String {
    "LAST_NAME".to_string()
}

fn default_operator() -> String {
    "API".to_string()
}

fn default_privileged_operator() -> String {
    "dev2".to_string()
}

/// Patron database settings, consumed by the patron store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Schema holding the patron tables
    #[serde(default = "default_db_name")]
    pub name: String,

    #[serde(default = "default_db_vendor")]
    pub vendor: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: String::new(),
            password: String::new(),
            name: default_db_name(),
            vendor: default_db_vendor(),
        }
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_db_name() -> String {
    "ole".to_string()
}

fn default_db_vendor() -> String {
    "mysql".to_string()
}

/// Hold placement settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldsConfig {
    #[serde(default = "default_pickup_location")]
    pub default_pickup_location: String,

    /// Request type sent with every hold
    #[serde(default = "default_request_type")]
    pub request_type: String,

    #[serde(default = "default_pickup_locations")]
    pub pickup_locations: Vec<PickupLocation>,
}

impl Default for HoldsConfig {
    fn default() -> Self {
        Self {
            default_pickup_location: default_pickup_location(),
            request_type: default_request_type(),
            pickup_locations: default_pickup_locations(),
        }
    }
}

fn default_pickup_location() -> String {
    "1".to_string()
}

fn default_request_type() -> String {
    "Page/Hold Request".to_string()
}

fn default_pickup_locations() -> Vec<PickupLocation> {
    vec![PickupLocation {
        location_id: "1".to_string(),
        location_display: "Location 1".to_string(),
    }]
}

/// Renewal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalsConfig {
    /// Check renewability while listing loans rather than on request.
    ///
    /// The OLE driver has no renewability check and lists every loan as
    /// renewable whatever this is set to.
    #[serde(default = "default_true")]
    pub check_up_front: bool,
}

impl Default for RenewalsConfig {
    fn default() -> Self {
        Self {
            check_up_front: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Vendor prefixes embedded in upstream identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierConfig {
    #[serde(default = "default_bib_prefix")]
    pub bib_prefix: String,

    #[serde(default = "default_holdings_prefix")]
    pub holdings_prefix: String,

    #[serde(default = "default_item_prefix")]
    pub item_prefix: String,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            bib_prefix: default_bib_prefix(),
            holdings_prefix: default_holdings_prefix(),
            item_prefix: default_item_prefix(),
        }
    }
}

fn default_bib_prefix() -> String {
    "wbm-".to_string()
}

fn default_holdings_prefix() -> String {
    "who-".to_string()
}

fn default_item_prefix() -> String {
    "wio-".to_string()
}

/// Search engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Core URL, e.g. `http://localhost:8080/solr/biblio`
    #[serde(default)]
    pub url: String,

    /// Identifier stamped on every returned collection
    #[serde(default = "default_identifier")]
    pub identifier: String,

    /// Spellcheck dictionaries, primary first
    #[serde(default)]
    pub dictionaries: Vec<String>,

    #[serde(default = "default_unique_key")]
    pub unique_key: String,

    /// Parameters sent with every query
    #[serde(default)]
    pub invariants: BTreeMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            identifier: default_identifier(),
            dictionaries: Vec::new(),
            unique_key: default_unique_key(),
            invariants: BTreeMap::new(),
        }
    }
}

fn default_identifier() -> String {
    "Solr".to_string()
}

fn default_unique_key() -> String {
    "id".to_string()
}

impl SearchConfig {
    /// Query invariants as a parameter bag
    pub fn invariant_params(&self) -> ParamBag {
        ParamBag::from_pairs(self.invariants.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl Config {
    /// Check that every configured service URL is usable
    pub fn validate(&self) -> Result<(), CatalogError> {
        let services = [
            ("catalog.circulation_service", &self.catalog.circulation_service),
            ("catalog.docstore_service", &self.catalog.docstore_service),
            ("catalog.solr_service", &self.catalog.solr_service),
            ("search.url", &self.search.url),
        ];

        for (name, value) in services {
            if value.is_empty() {
                continue;
            }
            url::Url::parse(value)
                .map_err(|e| CatalogError::Config(format!("{} is not a valid URL: {}", name, e)))?;
        }

        if self.http.timeout_secs == 0 {
            return Err(CatalogError::Config(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Locate a configuration file in the working or user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("catalog-bridge").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
