//! Map decoded OLE payloads into the normalized circulation shapes.
//!
//! Every function here is total: absent upstream fields fall back to empty
//! strings, `false`, or the title placeholder.

use chrono::NaiveDate;

use crate::models::{
    NormalizedFine, NormalizedHold, NormalizedHolding, NormalizedItem, NormalizedTransaction, Patron,
    PatronProfile, Renewability,
};
use crate::payload::Payload;

/// Item status meaning the item is checked out
pub const STATUS_LOANED: &str = "LOANED";

/// Circulation response code for a successful lookup
pub const CODE_SUCCESS: &str = "000";

/// Circulation response code for a successful renewal
pub const CODE_RENEWED: &str = "003";

/// Circulation response code for a placed request
pub const CODE_HOLD_PLACED: &str = "021";

/// Title used when the upstream has none
pub const UNKNOWN_TITLE: &str = "unknown title";

/// Application id of a compound `<prefix>-<suffix>` identifier.
///
/// Everything after the first dash; identifiers without a dash are returned
/// unchanged.
pub fn derive_id(compound: &str) -> &str {
    compound.split_once('-').map_or(compound, |(_, suffix)| suffix)
}

/// Remove a configured prefix if present
pub fn strip_prefix<'a>(value: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return value;
    }
    value.strip_prefix(prefix).unwrap_or(value)
}

/// Add a configured prefix unless already present
pub fn apply_prefix(value: &str, prefix: &str) -> String {
    if value.starts_with(prefix) {
        value.to_string()
    } else {
        format!("{}{}", prefix, value)
    }
}

/// Split a combined timestamp into date and time by fixed width.
///
/// The date is the first 10 characters and the time is everything from
/// character 11. Short input yields partial or empty parts.
pub fn split_timestamp(timestamp: &str) -> (String, String) {
    let date = timestamp.chars().take(10).collect();
    let time = timestamp.chars().skip(11).collect();
    (date, time)
}

/// An item is available unless its status is exactly [`STATUS_LOANED`].
///
/// Other unavailable states (missing, in transit, ...) count as available.
pub fn is_available(status: &str) -> bool {
    status != STATUS_LOANED
}

pub fn title_or_placeholder(title: &str) -> String {
    if title.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Text of a reply-level element: a direct child of the root element, else
/// the first match anywhere below it.
fn reply_text(payload: &Payload, name: &str) -> Option<String> {
    payload
        .as_map()
        .and_then(|document| document.values().next())
        .and_then(|root| root.get(name))
        .and_then(Payload::text)
        .or_else(|| payload.select_text(&format!("//{}", name)))
}

/// Response code of a circulation reply
pub fn response_code(payload: &Payload) -> Option<String> {
    reply_text(payload, "code").map(|code| code.trim().to_string())
}

/// Response message of a circulation reply, verbatim
pub fn response_message(payload: &Payload) -> String {
    reply_text(payload, "message").unwrap_or_default()
}

/// Whether the reply carries exactly the given response code
pub fn has_code(payload: &Payload, code: &str) -> bool {
    response_code(payload).as_deref() == Some(code)
}

fn text(node: &Payload, path: &str) -> String {
    node.select_text(path).unwrap_or_default()
}

/// Profile from a `lookupUser` reply, seeded from the login record
pub fn profile(payload: &Payload, patron: &Patron) -> PatronProfile {
    let non_empty = |path: &str| payload.select_text(path).filter(|value| !value.is_empty());

    PatronProfile {
        firstname: non_empty("//patronName/firstName").unwrap_or_else(|| patron.firstname.clone()),
        lastname: non_empty("//patronName/lastName").unwrap_or_else(|| patron.lastname.clone()),
        email: non_empty("//patronEmail/emailAddress").unwrap_or_default(),
        address1: non_empty("//patronAddress/line1").unwrap_or_default(),
        address2: non_empty("//patronAddress/line2"),
        zip: non_empty("//patronAddress/postalCode").unwrap_or_default(),
        phone: non_empty("//patronPhone/phoneNumber").unwrap_or_default(),
        group: String::new(),
    }
}

/// One `<checkOutItem>`
pub fn transaction(node: &Payload, renewability: &Renewability) -> NormalizedTransaction {
    let (duedate, due_time) = split_timestamp(&text(node, "dueDate"));
    let due_status = if text(node, "overDue") == "true" {
        "overdue".to_string()
    } else {
        String::new()
    };

    NormalizedTransaction {
        id: derive_id(&text(node, "catalogueId")).to_string(),
        item_id: text(node, "itemId"),
        duedate,
        due_time,
        due_status,
        volume: String::new(),
        publication_year: String::new(),
        title: title_or_placeholder(&text(node, "title")),
        renewable: renewability.renewable,
        message: renewability.message.clone(),
    }
}

/// One `<hold>`; available once `availableDate` is not after `today`.
///
/// Dates are compared as `YYYY-MM-DD` strings, so a missing date counts as
/// available.
pub fn hold(node: &Payload, today: NaiveDate) -> NormalizedHold {
    let today = today.format("%Y-%m-%d").to_string();
    let available_date = text(node, "availableDate");

    NormalizedHold {
        id: derive_id(&text(node, "catalogueId")).to_string(),
        item_id: text(node, "itemId"),
        request_type: text(node, "requestType"),
        location: String::new(),
        expire: text(node, "expiryDate"),
        create: text(node, "createDate"),
        position: text(node, "priority"),
        available: available_date.as_str() <= today.as_str(),
        reqnum: text(node, "requestId"),
        volume: String::new(),
        publication_year: String::new(),
        title: title_or_placeholder(&text(node, "title")),
    }
}

/// One `<fineItem>`
pub fn fine(node: &Payload) -> NormalizedFine {
    NormalizedFine {
        id: derive_id(&text(node, "catalogueId")).to_string(),
        amount: text(node, "amount"),
        fine: String::new(),
        balance: text(node, "balance"),
        createdate: String::new(),
        checkout: String::new(),
        duedate: String::new(),
    }
}

/// A holdings document from the OLE Solr index
pub fn holding(doc: &Payload) -> NormalizedHolding {
    NormalizedHolding {
        holdings_id: doc.field_text("holdingsIdentifier"),
        location: doc.field_text("LocationLevel_display"),
        callnumber: doc.field_text("CallNumber_display"),
    }
}

/// Item with the attributes shared by every item of a holding
fn item(
    bib_id: &str,
    item_id: &str,
    status: String,
    holding: &NormalizedHolding,
    number: String,
    barcode: String,
) -> NormalizedItem {
    NormalizedItem {
        id: bib_id.to_string(),
        item_id: item_id.to_string(),
        availability: is_available(&status),
        status,
        location: holding.location.clone(),
        reserve: String::new(),
        callnumber: holding.callnumber.clone(),
        return_date: String::new(),
        number,
        requests_placed: String::new(),
        barcode,
        notes: String::new(),
        summary: String::new(),
        is_holdable: true,
        holdtype: "hold".to_string(),
        add_link: true,
    }
}

/// An item document from the OLE Solr index
pub fn solr_item(doc: &Payload, bib_id: &str, holding: &NormalizedHolding, item_prefix: &str) -> NormalizedItem {
    let item_id = doc.field_text("itemIdentifier");
    item(
        bib_id,
        strip_prefix(&item_id, item_prefix),
        doc.field_text("ItemStatus_display"),
        holding,
        format!("{} : {}", doc.field_text("CopyNumber_display"), doc.field_text("Enumeration_search")),
        doc.field_text("ItemBarcode_display"),
    )
}

/// Flatten a docstore `holdingsTrees` reply into items
pub fn holding_tree(payload: &Payload, bib_id: &str, item_prefix: &str) -> Vec<NormalizedItem> {
    let mut items = Vec::new();

    for tree in payload.select("holdingsTrees") {
        let parent = NormalizedHolding {
            holdings_id: text(tree, "holdings/holdingsIdentifier"),
            location: text(tree, "holdings/location"),
            callnumber: text(tree, "holdings/callNumber"),
        };

        for node in tree.select("items") {
            let item_id = node.field_text("itemIdentifier");
            items.push(item(
                bib_id,
                strip_prefix(&item_id, item_prefix),
                node.field_text("itemStatus"),
                &parent,
                format!("{} : {}", node.field_text("copyNumber"), node.field_text("enumeration")),
                node.field_text("barcode"),
            ));
        }
    }
    items
}
