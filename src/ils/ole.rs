//! Kuali OLE driver.

use async_trait::async_trait;
use chrono::Local;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::normalize::{self, CODE_HOLD_PLACED, CODE_RENEWED, CODE_SUCCESS};
use super::{DriverCapabilities, IlsDriver, PatronQuery, PatronRow, PatronStore};
use crate::config::{CatalogConfig, Config, HoldsConfig, IdentifierConfig};
use crate::error::{CatalogError, PayloadFormat};
use crate::models::{
    HoldDetails, HoldResult, NormalizedFine, NormalizedHold, NormalizedItem, NormalizedTransaction, Patron,
    PatronProfile, PickupLocation, RenewDetails, RenewResult, RenewResults, Renewability,
};
use crate::payload::{self, Payload};
use crate::utils::{HttpClient, HttpMethod, RequestDescriptor};

/// Rows requested from the OLE Solr index per lookup
const SOLR_ROWS: &str = "100000";

const DEFAULT_LOGIN_FIELD: &str = "LAST_NAME";

/// Operations of the OLE circulation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircService {
    LookupUser,
    CheckedOutItems,
    Fines,
    Holds,
    PlaceRequest,
    RenewItem,
}

impl CircService {
    /// Value of the `service` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            CircService::LookupUser => "lookupUser",
            CircService::CheckedOutItems => "getCheckedOutItems",
            CircService::Fines => "fine",
            CircService::Holds => "holds",
            CircService::PlaceRequest => "placeRequest",
            CircService::RenewItem => "renewItem",
        }
    }

    /// State-changing operations are POSTed
    pub fn method(&self) -> HttpMethod {
        match self {
            CircService::PlaceRequest | CircService::RenewItem => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    /// Whether the call needs the privileged operator
    fn privileged(&self) -> bool {
        matches!(self, CircService::LookupUser | CircService::RenewItem)
    }
}

impl fmt::Display for CircService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver for the Kuali OLE circulation, docstore and Solr services
#[derive(Debug, Clone)]
pub struct OleDriver {
    client: HttpClient,
    catalog: CatalogConfig,
    holds: HoldsConfig,
    identifiers: IdentifierConfig,
    patrons: Option<Arc<dyn PatronStore>>,
}

impl OleDriver {
    /// Create a driver from the loaded configuration
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        if config.catalog.circulation_service.is_empty() {
            return Err(CatalogError::Config("catalog.circulation_service is not set".to_string()));
        }
        Ok(Self {
            client: HttpClient::from_config(&config.http)?,
            catalog: config.catalog.clone(),
            holds: config.holds.clone(),
            identifiers: config.identifiers.clone(),
            patrons: None,
        })
    }

    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    /// Store used by [`IlsDriver::patron_login`]
    pub fn with_patron_store(mut self, store: Arc<dyn PatronStore>) -> Self {
        self.patrons = Some(store);
        self
    }

    /// Build the patron lookup for a barcode and login secret.
    ///
    /// The configured login column is reduced to word characters.
    pub fn patron_query(&self, barcode: &str, login: &str) -> PatronQuery {
        let login_field = Regex::new(r"[^\w]")
            .map(|re| re.replace_all(&self.catalog.login_field, "").into_owned())
            .unwrap_or_default();
        let login_field = if login_field.is_empty() {
            DEFAULT_LOGIN_FIELD.to_string()
        } else {
            login_field
        };
        let db = &self.catalog.database.name;

        let sql = format!(
            "SELECT * FROM {db}.ole_ptrn_t, {db}.krim_entity_nm_t \
             WHERE ole_ptrn_t.OLE_PTRN_ID = krim_entity_nm_t.ENTITY_ID \
             AND lower(krim_entity_nm_t.{field}) = :login \
             AND lower(ole_ptrn_t.BARCODE) = :barcode",
            db = db,
            field = login_field
        );

        PatronQuery {
            sql,
            login: login.to_lowercase(),
            barcode: barcode.to_lowercase(),
        }
    }

    fn circulation_request(&self, service: CircService, patron_id: &str) -> RequestDescriptor {
        let operator = if service.privileged() {
            &self.catalog.privileged_operator_id
        } else {
            &self.catalog.operator_id
        };
        let endpoint = self.catalog.circulation_service.as_str();
        let request = match service.method() {
            HttpMethod::Get => RequestDescriptor::get(endpoint),
            HttpMethod::Post => RequestDescriptor::post(endpoint),
        };
        request
            .param("service", service.as_str())
            .param("patronId", patron_id)
            .param("operatorId", operator.as_str())
            .accept_xml()
    }

    async fn circulation(&self, request: &RequestDescriptor) -> Result<Payload, CatalogError> {
        let raw = self.client.execute(request).await?;
        payload::decode(&raw.body, PayloadFormat::Xml)
    }

    /// Nodes named `element` of a listing reply, or nothing on a logical failure
    async fn listing(&self, service: CircService, patron: &Patron, element: &str) -> Result<Vec<Payload>, CatalogError> {
        let reply = self.circulation(&self.circulation_request(service, &patron.id)).await?;
        if !normalize::has_code(&reply, CODE_SUCCESS) {
            tracing::debug!(
                service = %service,
                code = ?normalize::response_code(&reply),
                message = %normalize::response_message(&reply),
                "Circulation service reported a logical failure"
            );
            return Ok(Vec::new());
        }
        Ok(reply
            .select(&format!("//{}", element))
            .into_iter()
            .cloned()
            .collect())
    }

    async fn solr_query(&self, q: String) -> Result<Payload, CatalogError> {
        let request = RequestDescriptor::get(self.catalog.solr_service.as_str())
            .param("q", q)
            .param("wt", "json")
            .param("rows", SOLR_ROWS)
            .accept_json();
        let raw = self.client.execute(&request).await?;
        payload::decode(&raw.body, PayloadFormat::Json)
    }
}

fn patron_from_row(row: &PatronRow, barcode: &str, login: &str) -> Option<Patron> {
    let id = row.get("OLE_PTRN_ID").filter(|id| !id.is_empty())?;
    let column = |name: &str| row.get(name).cloned().unwrap_or_default();

    Some(Patron {
        id: id.clone(),
        firstname: column("FIRST_NM"),
        lastname: column("LAST_NM"),
        cat_username: barcode.to_string(),
        cat_password: login.to_string(),
        email: None,
        major: None,
        college: None,
    })
}

#[async_trait]
impl IlsDriver for OleDriver {
    fn capabilities(&self) -> DriverCapabilities {
        let mut caps = DriverCapabilities::all();
        if self.patrons.is_none() {
            caps.remove(DriverCapabilities::PATRON_LOGIN);
        }
        if self.catalog.docstore_service.is_empty() {
            caps.remove(DriverCapabilities::HOLDING_TREE);
        }
        caps
    }

    async fn patron_login(&self, barcode: &str, login: &str) -> Result<Option<Patron>, CatalogError> {
        let store = self
            .patrons
            .as_ref()
            .ok_or_else(|| CatalogError::Config("No patron store configured".to_string()))?;

        let query = self.patron_query(barcode, login);
        let row = store.fetch_patron(&query).await?;
        Ok(row.and_then(|row| patron_from_row(&row, barcode, login)))
    }

    async fn get_my_profile(&self, patron: &Patron) -> Result<PatronProfile, CatalogError> {
        let reply = self
            .circulation(&self.circulation_request(CircService::LookupUser, &patron.id))
            .await?;
        Ok(normalize::profile(&reply, patron))
    }

    async fn get_my_transactions(&self, patron: &Patron) -> Result<Vec<NormalizedTransaction>, CatalogError> {
        let nodes = self.listing(CircService::CheckedOutItems, patron, "checkOutItem").await?;

        // OLE has no renewability check, so every loan is listed as renewable
        let renewability = Renewability {
            renewable: true,
            message: "renewable".to_string(),
        };
        Ok(nodes
            .iter()
            .map(|node| normalize::transaction(node, &renewability))
            .collect())
    }

    async fn get_my_holds(&self, patron: &Patron) -> Result<Vec<NormalizedHold>, CatalogError> {
        let today = Local::now().date_naive();
        let nodes = self.listing(CircService::Holds, patron, "hold").await?;
        Ok(nodes.iter().map(|node| normalize::hold(node, today)).collect())
    }

    async fn get_my_fines(&self, patron: &Patron) -> Result<Vec<NormalizedFine>, CatalogError> {
        let nodes = self.listing(CircService::Fines, patron, "fineItem").await?;
        Ok(nodes.iter().map(normalize::fine).collect())
    }

    async fn get_status(&self, id: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
        self.get_holding(id).await
    }

    async fn get_holding(&self, id: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
        let bib_id = normalize::strip_prefix(id, &self.identifiers.bib_prefix);
        let holdings = self
            .solr_query(format!(
                "bibIdentifier:{} AND DocType:holdings",
                normalize::apply_prefix(id, &self.identifiers.bib_prefix)
            ))
            .await?;

        let mut items = Vec::new();
        for doc in holdings.select("response/docs") {
            let holding = normalize::holding(doc);
            let children = self
                .solr_query(format!(
                    "holdingsIdentifier:{} AND DocType:item",
                    normalize::apply_prefix(&holding.holdings_id, &self.identifiers.holdings_prefix)
                ))
                .await?;

            items.extend(
                children
                    .select("response/docs")
                    .into_iter()
                    .map(|item| normalize::solr_item(item, bib_id, &holding, &self.identifiers.item_prefix)),
            );
        }

        Ok(items)
    }

    async fn get_holding_tree(&self, id: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
        if self.catalog.docstore_service.is_empty() {
            return Err(CatalogError::NotImplemented);
        }
        let request = RequestDescriptor::get(self.catalog.docstore_service.as_str())
            .param("bibId", normalize::apply_prefix(id, &self.identifiers.bib_prefix))
            .accept_json();
        let raw = self.client.execute(&request).await?;
        let tree = payload::decode(&raw.body, PayloadFormat::Json)?;

        let bib_id = normalize::strip_prefix(id, &self.identifiers.bib_prefix);
        Ok(normalize::holding_tree(&tree, bib_id, &self.identifiers.item_prefix))
    }

    async fn place_hold(&self, details: &HoldDetails) -> Result<HoldResult, CatalogError> {
        let request = self
            .circulation_request(CircService::PlaceRequest, &details.patron.id)
            .param("itemBarcode", details.barcode.as_str())
            .param("requestType", self.holds.request_type.as_str());
        let reply = self.circulation(&request).await?;

        Ok(HoldResult {
            success: normalize::has_code(&reply, CODE_HOLD_PLACED),
            sys_message: normalize::response_message(&reply),
        })
    }

    async fn renew_my_items(&self, details: &RenewDetails) -> Result<RenewResults, CatalogError> {
        let mut results = RenewResults::default();

        for entry in &details.details {
            let barcode = entry.split(',').next().unwrap_or_default();
            let request = self
                .circulation_request(CircService::RenewItem, &details.patron.id)
                .param("itemBarcode", barcode);
            let reply = self.circulation(&request).await?;

            results.details.push(RenewResult {
                success: normalize::has_code(&reply, CODE_RENEWED),
                new_date: None,
                item_id: barcode.to_string(),
                sys_message: normalize::response_message(&reply),
            });
        }

        Ok(results)
    }

    fn get_pickup_locations(&self) -> Vec<PickupLocation> {
        self.holds.pickup_locations.clone()
    }

    fn get_default_pickup_location(&self) -> Option<String> {
        Some(self.holds.default_pickup_location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeStore {
        row: Option<PatronRow>,
        seen: Mutex<Vec<PatronQuery>>,
    }

    #[async_trait]
    impl PatronStore for FakeStore {
        async fn fetch_patron(&self, query: &PatronQuery) -> Result<Option<PatronRow>, CatalogError> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(self.row.clone())
        }
    }

    fn config(url: &str) -> Config {
        let mut config = Config::default();
        config.catalog.circulation_service = format!("{url}/olefs/circulation");
        config.catalog.solr_service = format!("{url}/oledocstore/bib/select");
        config.catalog.docstore_service = format!("{url}/oledocstore/holdingsTrees");
        config
    }

    fn driver(url: &str) -> OleDriver {
        OleDriver::new(&config(url)).unwrap()
    }

    fn patron() -> Patron {
        Patron::with_id("10100055U")
    }

    fn encoded(key: &str, value: &str) -> Matcher {
        Matcher::UrlEncoded(key.into(), value.into())
    }

    #[test]
    fn test_circ_service_methods() {
        assert_eq!(CircService::CheckedOutItems.method(), HttpMethod::Get);
        assert_eq!(CircService::PlaceRequest.method(), HttpMethod::Post);
        assert_eq!(CircService::RenewItem.method(), HttpMethod::Post);
        assert_eq!(CircService::Fines.to_string(), "fine");
    }

    #[test]
    fn test_new_requires_circulation_service() {
        let err = OleDriver::new(&Config::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn test_patron_query_sanitizes_login_field() {
        let mut config = config("http://localhost");
        config.catalog.login_field = "LAST_NM; DROP TABLE x".to_string();
        let query = OleDriver::new(&config).unwrap().patron_query("ABC123", "Dickens");

        assert!(query.sql.contains("lower(krim_entity_nm_t.LAST_NMDROPTABLEx) = :login"));
        assert!(query.sql.contains("FROM ole.ole_ptrn_t, ole.krim_entity_nm_t"));
        assert_eq!(query.login, "dickens");
        assert_eq!(query.barcode, "abc123");
    }

    #[tokio::test]
    async fn test_patron_login() {
        let row: PatronRow = [
            ("OLE_PTRN_ID", "10100055U"),
            ("FIRST_NM", "Charles"),
            ("LAST_NM", "Dickens"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let store = Arc::new(FakeStore {
            row: Some(row),
            ..Default::default()
        });
        let ole = driver("http://localhost").with_patron_store(store.clone());

        let patron = ole.patron_login("ABC123", "Dickens").await.unwrap().unwrap();
        assert_eq!(patron.id, "10100055U");
        assert_eq!(patron.firstname, "Charles");
        assert_eq!(patron.cat_username, "ABC123");
        assert_eq!(patron.cat_password, "Dickens");
        assert_eq!(store.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_patron_login_without_match() {
        let mut blank = PatronRow::new();
        blank.insert("OLE_PTRN_ID".into(), String::new());

        for row in [None, Some(blank)] {
            let store = Arc::new(FakeStore {
                row,
                ..Default::default()
            });
            let ole = driver("http://localhost").with_patron_store(store);
            assert_eq!(ole.patron_login("x", "y").await.unwrap(), None);
        }

        let err = driver("http://localhost").patron_login("x", "y").await.unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[tokio::test]
    async fn test_get_my_transactions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/olefs/circulation")
            .match_query(Matcher::AllOf(vec![
                encoded("service", "getCheckedOutItems"),
                encoded("patronId", "10100055U"),
                encoded("operatorId", "API"),
            ]))
            .with_body(
                "<checkOutItems><code>000</code><message>Success</message><checkOutItems>\
                 <checkOutItem><catalogueId>wbm-1</catalogueId><itemId>33165</itemId>\
                 <dueDate>2013-10-01 23:59:00</dueDate><overDue>false</overDue><title>Bleak House</title></checkOutItem>\
                 <checkOutItem><catalogueId>wbm-2</catalogueId><itemId>33166</itemId>\
                 <dueDate>2013-09-01 23:59:00</dueDate><overDue>true</overDue></checkOutItem>\
                 </checkOutItems></checkOutItems>",
            )
            .create_async()
            .await;

        let transactions = driver(&server.url()).get_my_transactions(&patron()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].id, "1");
        assert_eq!(transactions[0].duedate, "2013-10-01");
        assert_eq!(transactions[0].due_status, "");
        assert_eq!(transactions[1].due_status, "overdue");
        assert_eq!(transactions[1].title, normalize::UNKNOWN_TITLE);
        assert!(transactions.iter().all(|t| t.renewable));
    }

    #[tokio::test]
    async fn test_transactions_renewable_regardless_of_up_front_check() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/olefs/circulation")
            .match_query(encoded("service", "getCheckedOutItems"))
            .with_body(
                "<checkOutItems><code>000</code>\
                 <checkOutItem><catalogueId>wbm-1</catalogueId><itemId>33165</itemId></checkOutItem>\
                 </checkOutItems>",
            )
            .expect(2)
            .create_async()
            .await;

        for check_up_front in [true, false] {
            let mut config = config(&server.url());
            config.renewals.check_up_front = check_up_front;
            let transactions = OleDriver::new(&config)
                .unwrap()
                .get_my_transactions(&patron())
                .await
                .unwrap();

            assert_eq!(transactions.len(), 1);
            assert!(transactions[0].renewable);
            assert_eq!(transactions[0].message, "renewable");
        }
    }

    #[tokio::test]
    async fn test_logical_failure_gives_empty_listings() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/olefs/circulation")
            .match_query(Matcher::Any)
            .with_body(
                "<response><code>002</code><message>Patron not found</message>\
                 <hold><catalogueId>wbm-1</catalogueId></hold>\
                 <fineItem><amount>1.00</amount></fineItem>\
                 <checkOutItem><catalogueId>wbm-1</catalogueId></checkOutItem></response>",
            )
            .expect(3)
            .create_async()
            .await;

        let ole = driver(&server.url());
        assert!(ole.get_my_transactions(&patron()).await.unwrap().is_empty());
        assert!(ole.get_my_holds(&patron()).await.unwrap().is_empty());
        assert!(ole.get_my_fines(&patron()).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_my_holds_and_fines() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/olefs/circulation")
            .match_query(encoded("service", "holds"))
            .with_body(
                "<holds><code>000</code><holdItems>\
                 <hold><catalogueId>wbm-10</catalogueId><itemId>1</itemId><availableDate>2000-01-01</availableDate>\
                 <requestType>Hold</requestType><priority>1</priority><requestId>88</requestId></hold>\
                 <hold><catalogueId>wbm-11</catalogueId><itemId>2</itemId><availableDate>2999-12-31</availableDate></hold>\
                 </holdItems></holds>",
            )
            .create_async()
            .await;
        server
            .mock("GET", "/olefs/circulation")
            .match_query(encoded("service", "fine"))
            .with_body(
                "<fine><code>000</code><fineItems><fineItem><catalogueId>wbm-10</catalogueId>\
                 <amount>5.00</amount><balance>2.50</balance></fineItem></fineItems></fine>",
            )
            .create_async()
            .await;

        let ole = driver(&server.url());
        let holds = ole.get_my_holds(&patron()).await.unwrap();
        assert_eq!(holds.len(), 2);
        assert_eq!(holds[0].id, "10");
        assert_eq!(holds[0].request_type, "Hold");
        assert_eq!(holds[0].reqnum, "88");
        assert!(holds[0].available);
        assert!(!holds[1].available);

        let fines = ole.get_my_fines(&patron()).await.unwrap();
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].id, "10");
        assert_eq!(fines[0].amount, "5.00");
        assert_eq!(fines[0].balance, "2.50");
    }

    #[tokio::test]
    async fn test_get_my_profile_uses_privileged_operator() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/olefs/circulation")
            .match_query(Matcher::AllOf(vec![encoded("service", "lookupUser"), encoded("operatorId", "dev2")]))
            .with_body(
                "<lookupUser><code>000</code><patronName><firstName>Charles</firstName>\
                 <lastName>Dickens</lastName></patronName>\
                 <patronEmail><emailAddress>cd@example.org</emailAddress></patronEmail>\
                 <patronPhone><phoneNumber>555-0100</phoneNumber></patronPhone></lookupUser>",
            )
            .create_async()
            .await;

        let profile = driver(&server.url()).get_my_profile(&patron()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(profile.firstname, "Charles");
        assert_eq!(profile.email, "cd@example.org");
        assert_eq!(profile.phone, "555-0100");
        assert_eq!(profile.address1, "");
        assert_eq!(profile.group, "");
    }

    #[tokio::test]
    async fn test_place_hold() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/olefs/circulation")
            .match_query(Matcher::AllOf(vec![
                encoded("service", "placeRequest"),
                encoded("itemBarcode", "005123641675530699"),
                encoded("requestType", "Page/Hold Request"),
                encoded("operatorId", "API"),
            ]))
            .with_body("<placeRequest><code>021</code><message>Request raised successfully</message></placeRequest>")
            .create_async()
            .await;
        server
            .mock("POST", "/olefs/circulation")
            .match_query(encoded("itemBarcode", "999"))
            .with_body("<placeRequest><code>016</code><message>Request successfully not raised</message></placeRequest>")
            .create_async()
            .await;

        let ole = driver(&server.url());
        let placed = ole
            .place_hold(&HoldDetails {
                patron: patron(),
                id: "123".into(),
                barcode: "005123641675530699".into(),
            })
            .await
            .unwrap();
        assert!(placed.success);
        assert_eq!(placed.sys_message, "Request raised successfully");

        let refused = ole
            .place_hold(&HoldDetails {
                patron: patron(),
                id: "123".into(),
                barcode: "999".into(),
            })
            .await
            .unwrap();
        assert!(!refused.success);
        assert_eq!(refused.sys_message, "Request successfully not raised");
    }

    #[tokio::test]
    async fn test_renew_my_items() {
        let mut server = mockito::Server::new_async().await;
        let renewed = server
            .mock("POST", "/olefs/circulation")
            .match_query(Matcher::AllOf(vec![
                encoded("service", "renewItem"),
                encoded("itemBarcode", "111"),
                encoded("operatorId", "dev2"),
            ]))
            .with_body("<renewItem><code>003</code><message>Item renewed</message></renewItem>")
            .expect(1)
            .create_async()
            .await;
        let refused = server
            .mock("POST", "/olefs/circulation")
            .match_query(encoded("itemBarcode", "222"))
            .with_body("<renewItem><code>010</code><message>The item has been renewed the maximum (1) number of times. </message></renewItem>")
            .expect(1)
            .create_async()
            .await;

        let ole = driver(&server.url());
        let details = RenewDetails {
            patron: patron(),
            details: vec!["111,1".into(), "222,2".into()],
        };
        let results = ole.renew_my_items(&details).await.unwrap();

        renewed.assert_async().await;
        refused.assert_async().await;
        assert_eq!(results.details.len(), 2);
        assert!(results.get("111").unwrap().success);
        let second = results.get("222").unwrap();
        assert!(!second.success);
        assert_eq!(second.new_date, None);
        assert_eq!(second.sys_message, "The item has been renewed the maximum (1) number of times. ");
    }

    #[tokio::test]
    async fn test_get_holding_nested_lookups_in_order() {
        let mut server = mockito::Server::new_async().await;
        let holdings = server
            .mock("GET", "/oledocstore/bib/select")
            .match_query(encoded("q", "bibIdentifier:wbm-123 AND DocType:holdings"))
            .with_body(
                json!({"response": {"docs": [
                    {"holdingsIdentifier": ["who-1"], "LocationLevel_display": ["Main"], "CallNumber_display": ["A1"]},
                    {"holdingsIdentifier": ["who-2"], "LocationLevel_display": ["Annex"], "CallNumber_display": ["B2"]}
                ]}})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/oledocstore/bib/select")
            .match_query(encoded("q", "holdingsIdentifier:who-1 AND DocType:item"))
            .with_body(
                json!({"response": {"docs": [
                    {"itemIdentifier": ["wio-1"], "ItemStatus_display": ["AVAILABLE"], "ItemBarcode_display": ["b1"]},
                    {"itemIdentifier": ["wio-2"], "ItemStatus_display": ["LOANED"], "ItemBarcode_display": ["b2"]}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/oledocstore/bib/select")
            .match_query(encoded("q", "holdingsIdentifier:who-2 AND DocType:item"))
            .with_body(json!({"response": {"docs": [{"itemIdentifier": ["wio-3"], "ItemStatus_display": ["ONORDER"]}]}}).to_string())
            .create_async()
            .await;

        let items = driver(&server.url()).get_holding("123").await.unwrap();

        holdings.assert_async().await;
        assert_eq!(items.iter().map(|i| i.item_id.as_str()).collect::<Vec<_>>(), vec!["1", "2", "3"]);
        assert_eq!(items[1].location, "Main");
        assert!(!items[1].availability);
        assert_eq!(items[2].location, "Annex");
        assert_eq!(items[2].callnumber, "B2");
        assert!(items[2].availability);
        assert!(items.iter().all(|i| i.id == "123"));
    }

    #[tokio::test]
    async fn test_get_holding_aborts_on_nested_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/oledocstore/bib/select")
            .match_query(encoded("q", "bibIdentifier:wbm-123 AND DocType:holdings"))
            .with_body(json!({"response": {"docs": [{"holdingsIdentifier": ["who-1"]}]}}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/oledocstore/bib/select")
            .match_query(encoded("q", "holdingsIdentifier:who-1 AND DocType:item"))
            .with_status(503)
            .create_async()
            .await;

        let err = driver(&server.url()).get_holding("123").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_get_holding_tree() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/oledocstore/holdingsTrees")
            .match_query(encoded("bibId", "wbm-55"))
            .with_body(
                json!({"holdingsTrees": [{
                    "holdings": {"holdingsIdentifier": "who-1", "location": "Main", "callNumber": "A1"},
                    "items": [{"itemIdentifier": "wio-7", "barcode": "b7", "itemStatus": "LOANED"}]
                }]})
                .to_string(),
            )
            .create_async()
            .await;

        let items = driver(&server.url()).get_holding_tree("wbm-55").await.unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "55");
        assert_eq!(items[0].item_id, "7");
        assert!(!items[0].availability);
    }

    #[test]
    fn test_renew_details_and_pickup_locations() {
        let ole = driver("http://localhost");
        let transaction = NormalizedTransaction {
            id: "1".into(),
            item_id: "33165".into(),
            duedate: String::new(),
            due_time: String::new(),
            due_status: String::new(),
            volume: String::new(),
            publication_year: String::new(),
            title: "x".into(),
            renewable: true,
            message: String::new(),
        };

        assert_eq!(ole.get_renew_details(&transaction), "33165,1");
        assert_eq!(ole.get_pickup_locations()[0].location_display, "Location 1");
        assert_eq!(ole.get_default_pickup_location().as_deref(), Some("1"));
        assert!(!ole.capabilities().contains(DriverCapabilities::PATRON_LOGIN));
        assert!(ole.capabilities().contains(DriverCapabilities::HOLDING_TREE));
    }

    #[tokio::test]
    async fn test_purchase_history_is_empty() {
        let history = driver("http://localhost").get_purchase_history("123").await.unwrap();
        assert!(history.is_empty());
    }
}
