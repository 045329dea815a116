use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One cell as delivered by a reader. CSV readers only produce `Text` and
/// `Empty`; spreadsheet readers may also produce typed cells.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Cell rendered as trimmed text; `None` for empty or blank cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            // Integers without decimals
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(format!("{n}")),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

/// A source table before normalization: header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Build a text-only table. Mostly useful for tests and CSV-shaped data.
    pub fn from_text(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    r.iter()
                        .map(|v| {
                            if v.is_empty() {
                                RawCell::Empty
                            } else {
                                RawCell::Text(v.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }

    /// Cell at (row, col); rows shorter than the header read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&RawCell::Empty)
    }
}

// ---------------------------------------------------------------------------
// Canonical schema
// ---------------------------------------------------------------------------

/// Every canonical field a source column can be mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    FirstName,
    LastName,
    Products,
    Coupons,
    Revenue,
    Email,
    Address,
    City,
    State,
    Zip,
    Website,
    Phone,
    NameForMap,
    Medium,
    ShowLocation,
    BusinessName,
    StudioAddress,
    /// Form entry date. Drives form filtering and tie-breaks; never written
    /// to the report.
    SubmittedAt,
}

/// Report column order.
pub const REPORT_COLUMNS: [Field; 18] = [
    Field::Date,
    Field::FirstName,
    Field::LastName,
    Field::Products,
    Field::Coupons,
    Field::Revenue,
    Field::Email,
    Field::Address,
    Field::City,
    Field::State,
    Field::Zip,
    Field::Website,
    Field::Phone,
    Field::NameForMap,
    Field::Medium,
    Field::ShowLocation,
    Field::BusinessName,
    Field::StudioAddress,
];

impl Field {
    /// Header used in the generated report.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Products => "Product(s)",
            Self::Coupons => "Coupon(s)",
            Self::Revenue => "N. Revenue",
            Self::Email => "email",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Website => "website",
            Self::Phone => "Phone",
            Self::NameForMap => "Name for Map",
            Self::Medium => "Medium",
            Self::ShowLocation => "Show space/location",
            Self::BusinessName => "Name of Business",
            Self::StudioAddress => "Studio/Business Address",
            Self::SubmittedAt => "date",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// Canonical registration row. Order rows fill the commerce fields, form rows
/// fill the contact fields; a merged row may carry both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Registration {
    pub date: Option<NaiveDateTime>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub products: Option<String>,
    pub coupons: Option<String>,
    pub revenue: Option<String>,
    pub email: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub name_for_map: Option<String>,
    pub medium: Option<String>,
    pub show_location: Option<String>,
    pub business_name: Option<String>,
    pub studio_address: Option<String>,
    #[serde(skip)]
    pub submitted_at: Option<NaiveDateTime>,
}

impl Registration {
    fn text_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Products => &mut self.products,
            Field::Coupons => &mut self.coupons,
            Field::Revenue => &mut self.revenue,
            Field::Address => &mut self.address,
            Field::City => &mut self.city,
            Field::State => &mut self.state,
            Field::Zip => &mut self.zip,
            Field::Website => &mut self.website,
            Field::Phone => &mut self.phone,
            Field::NameForMap => &mut self.name_for_map,
            Field::Medium => &mut self.medium,
            Field::ShowLocation => &mut self.show_location,
            Field::BusinessName => &mut self.business_name,
            Field::StudioAddress => &mut self.studio_address,
            Field::Date | Field::SubmittedAt | Field::Email => return None,
        };
        Some(slot)
    }

    /// Text value of a field. Email is always present; date fields return
    /// `None`; read `date` and `submitted_at` directly.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Email => return Some(&self.email),
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Products => &self.products,
            Field::Coupons => &self.coupons,
            Field::Revenue => &self.revenue,
            Field::Address => &self.address,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Zip => &self.zip,
            Field::Website => &self.website,
            Field::Phone => &self.phone,
            Field::NameForMap => &self.name_for_map,
            Field::Medium => &self.medium,
            Field::ShowLocation => &self.show_location,
            Field::BusinessName => &self.business_name,
            Field::StudioAddress => &self.studio_address,
            Field::Date | Field::SubmittedAt => return None,
        };
        value.as_deref()
    }

    /// Set a text field unless it already holds a value (first write wins).
    /// Returns false for fields that are not plain text.
    pub fn fill_text(&mut self, field: Field, value: String) -> bool {
        if field == Field::Email {
            if self.email.is_empty() {
                self.email = value;
            }
            return true;
        }
        match self.text_slot(field) {
            Some(slot) => {
                if slot.is_none() {
                    *slot = Some(value);
                }
                true
            }
            None => false,
        }
    }

    /// Outer-coalesce two rows sharing an email: every field takes `self`'s
    /// value when present, otherwise `other`'s.
    pub fn coalesce(&self, other: &Registration) -> Registration {
        let pick = |a: &Option<String>, b: &Option<String>| a.clone().or_else(|| b.clone());
        Registration {
            date: self.date.or(other.date),
            first_name: pick(&self.first_name, &other.first_name),
            last_name: pick(&self.last_name, &other.last_name),
            products: pick(&self.products, &other.products),
            coupons: pick(&self.coupons, &other.coupons),
            revenue: pick(&self.revenue, &other.revenue),
            email: if self.email.is_empty() {
                other.email.clone()
            } else {
                self.email.clone()
            },
            address: pick(&self.address, &other.address),
            city: pick(&self.city, &other.city),
            state: pick(&self.state, &other.state),
            zip: pick(&self.zip, &other.zip),
            website: pick(&self.website, &other.website),
            phone: pick(&self.phone, &other.phone),
            name_for_map: pick(&self.name_for_map, &other.name_for_map),
            medium: pick(&self.medium, &other.medium),
            show_location: pick(&self.show_location, &other.show_location),
            business_name: pick(&self.business_name, &other.business_name),
            studio_address: pick(&self.studio_address, &other.studio_address),
            submitted_at: self.submitted_at.or(other.submitted_at),
        }
    }

    /// Number of report columns holding a value.
    pub fn populated_fields(&self) -> usize {
        REPORT_COLUMNS
            .iter()
            .filter(|f| match f {
                Field::Date => self.date.is_some(),
                other => self.text(**other).is_some_and(|v| !v.is_empty()),
            })
            .count()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Per-source normalization counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub read: usize,
    pub kept: usize,
    pub outside_window: usize,
    pub blank_email: usize,
    pub denylisted: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub orders: SourceCounts,
    pub forms: SourceCounts,
    /// Rows produced by the outer join before deduplication.
    pub joined_rows: usize,
    /// Final rows (one per distinct email).
    pub registrations: usize,
    /// Final rows that carry both order and form data.
    pub matched: usize,
    pub orders_only: usize,
    pub forms_only: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub file_name: String,
    pub worksheet: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResult {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub rows: Vec<Registration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn number_cells_render_like_text() {
        assert_eq!(RawCell::Number(50.0).as_text().as_deref(), Some("50"));
        assert_eq!(RawCell::Number(49.5).as_text().as_deref(), Some("49.5"));
        assert_eq!(RawCell::Text("  ".into()).as_text(), None);
        assert_eq!(RawCell::Text(" Denver ".into()).as_text().as_deref(), Some("Denver"));
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = RawTable::from_text(&["a", "b"], &[&["1"]]);
        assert_eq!(table.cell(0, 1), &RawCell::Empty);
        assert_eq!(table.cell(5, 0), &RawCell::Empty);
    }

    #[test]
    fn fill_text_keeps_first_value() {
        let mut r = Registration::default();
        assert!(r.fill_text(Field::StudioAddress, "home".into()));
        assert!(r.fill_text(Field::StudioAddress, "business".into()));
        assert_eq!(r.studio_address.as_deref(), Some("home"));
        assert!(!r.fill_text(Field::Date, "2024-05-23".into()));
    }

    #[test]
    fn coalesce_prefers_left_and_fills_gaps() {
        let order = Registration {
            date: Some(dt("2024-05-23 10:00")),
            revenue: Some("50".into()),
            email: "a@x.com".into(),
            ..Default::default()
        };
        let form = Registration {
            city: Some("Denver".into()),
            email: "a@x.com".into(),
            submitted_at: Some(dt("2024-05-24 09:00")),
            ..Default::default()
        };
        let merged = order.coalesce(&form);
        assert_eq!(merged.email, "a@x.com");
        assert_eq!(merged.revenue.as_deref(), Some("50"));
        assert_eq!(merged.city.as_deref(), Some("Denver"));
        assert_eq!(merged.date, Some(dt("2024-05-23 10:00")));
        assert_eq!(merged.submitted_at, Some(dt("2024-05-24 09:00")));
        assert_eq!(merged.populated_fields(), 4);
    }

    #[test]
    fn report_columns_headers_are_unique() {
        let mut headers: Vec<_> = REPORT_COLUMNS.iter().map(|f| f.header()).collect();
        headers.sort();
        headers.dedup();
        assert_eq!(headers.len(), 18);
        assert!(!REPORT_COLUMNS.contains(&Field::SubmittedAt));
    }
}
