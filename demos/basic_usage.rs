//! Basic usage example for the Catalog Bridge library.
//!
//! Searches a Solr core, then looks up the items of the first hit in a Kuali
//! OLE catalog. Point the URLs at real services with `CATALOG_BRIDGE_*`
//! environment variables or a `catalog-bridge.toml` file.

use catalog_bridge::config::{find_config_file, load_config, Config};
use catalog_bridge::ils::{normalize, IlsDriver, OleDriver};
use catalog_bridge::models::{ParamBag, Query};
use catalog_bridge::search::{SearchBackend, SolrBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match find_config_file() {
        Some(path) => load_config(&path)?,
        None => {
            let mut config = Config::default();
            config.search.url = "http://localhost:8080/solr/biblio".to_string();
            config.search.dictionaries = vec!["default".to_string(), "basicSpell".to_string()];
            config.catalog.circulation_service = "http://localhost:8080/olefs/circulation".to_string();
            config.catalog.solr_service = "http://localhost:8080/oledocstore/bib/select".to_string();
            config
        }
    };
    config.validate()?;

    // Search with spelling suggestions
    let backend = SolrBackend::from_config(&config)?;
    let params = ParamBag::from_pairs([("spellcheck.q", "bleak huose")]);
    let results = backend
        .search(&Query::new("bleak huose"), 0, 5, Some(params))
        .await?;

    println!("Found {} records", results.total);
    for record in &results.records {
        println!("  {} - {}", record.id, record.title().unwrap_or_default());
    }
    for suggestion in &results.spellcheck.suggestions {
        println!("Did you mean {:?} for {}?", suggestion.suggestions, suggestion.term);
    }

    // Holdings of the first hit
    let Some(first) = results.records.first() else {
        return Ok(());
    };
    let driver = OleDriver::new(&config)?;
    let bib_id = normalize::derive_id(&first.id);

    for item in driver.get_holding(bib_id).await? {
        let state = if item.availability { "available" } else { "checked out" };
        println!(
            "  {} [{}] {} {} ({})",
            item.barcode, item.callnumber, item.location, item.number, state
        );
    }

    Ok(())
}
