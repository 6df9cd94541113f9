//! Table rendering for command line output.
//!
//! Normalized shapes implement [`TableRow`] so the CLI can print any listing
//! with [`render_table`]. Column widths follow the terminal through
//! comfy-table's dynamic arrangement.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use is_terminal::IsTerminal;

use crate::models::{
    NormalizedFine, NormalizedHold, NormalizedItem, NormalizedRecord, NormalizedTransaction, PatronProfile,
    PickupLocation, RenewResult, TermCount,
};

/// Widest title shown before truncation
pub const MAX_TITLE_WIDTH: usize = 60;

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Truncate text to `max_width` characters, ending with an ellipsis when cut.
///
/// # Examples
///
/// ```
/// use catalog_bridge::utils::display::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if text.chars().count() <= max_width {
        return text.to_string();
    }

    let keep = max_width.saturating_sub(3);
    if keep == 0 {
        return "...".to_string();
    }
    let truncated: String = text.chars().take(keep).collect();
    format!("{}...", truncated.trim_end())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// A value that renders as one table row
pub trait TableRow {
    fn headers() -> Vec<&'static str>;

    fn cells(&self) -> Vec<Cell>;
}

/// Render rows under their headers
pub fn render_table<T: TableRow>(rows: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(T::headers());
    for row in rows {
        table.add_row(row.cells());
    }
    table
}

/// Render label/value pairs as a two-column table
pub fn render_fields(fields: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    for (label, value) in fields {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    table
}

impl TableRow for NormalizedRecord {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Title", "Source"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id),
            Cell::new(truncate_with_ellipsis(&self.title().unwrap_or_default(), MAX_TITLE_WIDTH))
                .add_attribute(Attribute::Bold),
            Cell::new(self.source_identifier.as_deref().unwrap_or_default()),
        ]
    }
}

impl TableRow for NormalizedItem {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Item", "Barcode", "Status", "Available", "Location", "Call Number", "Number"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id),
            Cell::new(&self.item_id),
            Cell::new(&self.barcode),
            Cell::new(&self.status),
            Cell::new(yes_no(self.availability)),
            Cell::new(&self.location),
            Cell::new(&self.callnumber),
            Cell::new(&self.number),
        ]
    }
}

impl TableRow for NormalizedTransaction {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Item", "Title", "Due", "Status", "Renewable"]
    }

    fn cells(&self) -> Vec<Cell> {
        let due = if self.due_time.is_empty() {
            self.duedate.clone()
        } else {
            format!("{} {}", self.duedate, self.due_time)
        };
        vec![
            Cell::new(&self.id),
            Cell::new(&self.item_id),
            Cell::new(truncate_with_ellipsis(&self.title, MAX_TITLE_WIDTH)).add_attribute(Attribute::Bold),
            Cell::new(due),
            Cell::new(&self.due_status),
            Cell::new(yes_no(self.renewable)),
        ]
    }
}

impl TableRow for NormalizedHold {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Item", "Title", "Type", "Created", "Expires", "Position", "Available"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id),
            Cell::new(&self.item_id),
            Cell::new(truncate_with_ellipsis(&self.title, MAX_TITLE_WIDTH)).add_attribute(Attribute::Bold),
            Cell::new(&self.request_type),
            Cell::new(&self.create),
            Cell::new(&self.expire),
            Cell::new(&self.position),
            Cell::new(yes_no(self.available)),
        ]
    }
}

impl TableRow for NormalizedFine {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Amount", "Balance"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::new(&self.id), Cell::new(&self.amount), Cell::new(&self.balance)]
    }
}

impl TableRow for RenewResult {
    fn headers() -> Vec<&'static str> {
        vec!["Barcode", "Renewed", "Message"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.item_id),
            Cell::new(yes_no(self.success)),
            Cell::new(&self.sys_message),
        ]
    }
}

impl TableRow for PickupLocation {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Location"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::new(&self.location_id), Cell::new(&self.location_display)]
    }
}

impl TableRow for TermCount {
    fn headers() -> Vec<&'static str> {
        vec!["Term", "Count"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::new(&self.term), Cell::new(self.count)]
    }
}

/// Label/value pairs of a patron profile
pub fn profile_fields(profile: &PatronProfile) -> Vec<(&'static str, String)> {
    vec![
        ("First name", profile.firstname.clone()),
        ("Last name", profile.lastname.clone()),
        ("Email", profile.email.clone()),
        ("Address", profile.address1.clone()),
        ("Address 2", profile.address2.clone().unwrap_or_default()),
        ("Postal code", profile.zip.clone()),
        ("Phone", profile.phone.clone()),
        ("Group", profile.group.clone()),
    ]
}
