//! External source schemas: explicit header → canonical field tables.
//!
//! Both exports are selected by exact header name, so every header the
//! pipeline reads is declared here and resolved once per table. A renamed or
//! missing column fails at [`SourceSchema::resolve`] before any row is read.

use crate::error::ReportError;
use crate::model::Field;

/// Header → field mapping for one source.
#[derive(Debug)]
pub struct SourceSchema {
    pub name: &'static str,
    /// Header holding the row timestamp.
    pub date_header: &'static str,
    /// Field the parsed timestamp lands in.
    pub date_field: Field,
    /// chrono format string for textual timestamps.
    pub date_format: &'static str,
    /// Text columns. Several headers may target the same field; the first
    /// non-empty value in declaration order wins.
    pub columns: &'static [(&'static str, Field)],
}

pub const ORDER_SCHEMA: SourceSchema = SourceSchema {
    name: "orders",
    date_header: "Order Date",
    date_field: Field::Date,
    date_format: "%Y-%m-%d %H:%M",
    columns: &[
        ("First Name (Billing)", Field::FirstName),
        ("Last Name (Billing)", Field::LastName),
        ("Item Name", Field::Products),
        ("Coupon Code", Field::Coupons),
        ("Order Total Amount", Field::Revenue),
        ("Email (Billing)", Field::Email),
    ],
};

pub const FORM_SCHEMA: SourceSchema = SourceSchema {
    name: "forms",
    date_header: "Entry Date",
    date_field: Field::SubmittedAt,
    date_format: "%B %d, %Y %I:%M %p",
    columns: &[
        ("Email", Field::Email),
        ("Address", Field::Address),
        ("City", Field::City),
        ("State", Field::State),
        ("Zip", Field::Zip),
        ("Website Url", Field::Website),
        ("Phone Number", Field::Phone),
        ("Name as it will appear in your map listing", Field::NameForMap),
        ("Medium as it will appear in your map listing", Field::Medium),
        ("During JPOS I will be showing at (check one)", Field::ShowLocation),
        ("Business Name", Field::BusinessName),
        // Home address first: it wins over the business address.
        ("if at home address", Field::StudioAddress),
        ("Business Address", Field::StudioAddress),
    ],
};

/// Column indices of a schema within one concrete table.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub date_idx: usize,
    pub columns: Vec<(usize, Field)>,
}

impl SourceSchema {
    /// All headers this schema requires, date header first.
    pub fn required_headers(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.date_header).chain(self.columns.iter().map(|(h, _)| *h))
    }

    /// Locate every declared header in `headers`. Comparison is exact after
    /// trimming surrounding whitespace; the first matching header wins.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedSchema, ReportError> {
        let idx = |name: &str| -> Result<usize, ReportError> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ReportError::MissingColumn {
                    source_name: self.name.into(),
                    column: name.into(),
                })
        };

        let date_idx = idx(self.date_header)?;
        let columns = self
            .columns
            .iter()
            .map(|(header, field)| Ok((idx(header)?, *field)))
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(ResolvedSchema { date_idx, columns })
    }

    /// Headers from this schema that `headers` lacks.
    pub fn missing_headers(&self, headers: &[String]) -> Vec<&'static str> {
        self.required_headers()
            .filter(|name| !headers.iter().any(|h| h.trim() == *name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_orders_in_any_column_order() {
        let h = headers(&[
            "Order Number",
            "Email (Billing)",
            "Order Total Amount",
            "Coupon Code",
            "Item Name",
            "Last Name (Billing)",
            "First Name (Billing)",
            "Order Date",
        ]);
        let resolved = ORDER_SCHEMA.resolve(&h).unwrap();
        assert_eq!(resolved.date_idx, 7);
        assert!(resolved.columns.contains(&(1, Field::Email)));
        assert!(resolved.columns.contains(&(6, Field::FirstName)));
    }

    #[test]
    fn resolve_trims_header_whitespace() {
        let h = headers(&[
            " Order Date ",
            "First Name (Billing)",
            "Last Name (Billing)",
            "Item Name",
            "Coupon Code",
            "Order Total Amount",
            "Email (Billing)\u{20}",
        ]);
        assert!(ORDER_SCHEMA.resolve(&h).is_ok());
    }

    #[test]
    fn missing_column_names_the_header() {
        let h = headers(&["Order Date", "First Name (Billing)"]);
        let err = ORDER_SCHEMA.resolve(&h).unwrap_err();
        assert!(err.to_string().contains("'Last Name (Billing)'"), "{err}");
        assert!(err.to_string().starts_with("orders"));
    }

    #[test]
    fn missing_headers_lists_all_gaps() {
        let h = headers(&["Entry Date", "Email", "City"]);
        let missing = FORM_SCHEMA.missing_headers(&h);
        assert_eq!(missing.len(), FORM_SCHEMA.columns.len() + 1 - 3);
        assert!(missing.contains(&"Business Address"));
        assert!(!missing.contains(&"City"));
    }

    #[test]
    fn studio_address_prefers_home_column() {
        let targets: Vec<&str> = FORM_SCHEMA
            .columns
            .iter()
            .filter(|(_, f)| *f == Field::StudioAddress)
            .map(|(h, _)| *h)
            .collect();
        assert_eq!(targets, vec!["if at home address", "Business Address"]);
    }
}
