//! SQL text generation

use std::fmt;

use crate::config::mapping::MappingConfig;

/// Schema-qualified (or bare) table reference that renders as quoted
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: Option<String>,
    table: String,
}

impl TableRef {
    pub fn from_mapping(config: &MappingConfig) -> Self {
        TableRef {
            schema: config.target_schema.clone(),
            table: config.target_table.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.{}", quote_ident(schema), quote_ident(&self.table))
        } else {
            write!(f, "{}", quote_ident(&self.table))
        }
    }
}

/// Double-quote an identifier, doubling any embedded quotes. Table and field
/// names always go through this; cell values never end up in statement text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the one INSERT statement for the run: mapped fields in mapping
/// order, one `$n` placeholder per field in the same order.
pub fn build_insert<'a>(table: &TableRef, fields: impl Iterator<Item = &'a str>) -> String {
    let fields: Vec<String> = fields.map(quote_ident).collect();
    let placeholders: Vec<String> = (1..=fields.len()).map(|n| format!("${n}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        fields.join(", "),
        placeholders.join(", ")
    )
}

pub fn build_delete(table: &TableRef) -> String {
    format!("DELETE FROM {table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(schema: Option<&str>, table: &str) -> TableRef {
        TableRef {
            schema: schema.map(String::from),
            table: table.to_string(),
        }
    }

    #[test]
    fn insert_lists_fields_in_mapping_order() {
        let sql = build_insert(&make_table(None, "people"), ["name", "age"].into_iter());
        assert_eq!(sql, r#"INSERT INTO "people" ("name", "age") VALUES ($1, $2)"#);
    }

    #[test]
    fn placeholder_count_matches_field_count() {
        let fields = ["a", "b", "c", "d", "e"];
        let sql = build_insert(&make_table(None, "t"), fields.into_iter());
        for n in 1..=fields.len() {
            assert!(sql.contains(&format!("${n}")));
        }
        assert!(!sql.contains("$6"));
        assert_eq!(sql.matches('"').count(), 2 * (fields.len() + 1));
    }

    #[test]
    fn schema_qualifies_the_table() {
        let sql = build_insert(&make_table(Some("crm"), "people"), ["name"].into_iter());
        assert_eq!(sql, r#"INSERT INTO "crm"."people" ("name") VALUES ($1)"#);
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let sql = build_insert(&make_table(None, r#"we"ird"#), [r#"na"me"#].into_iter());
        assert_eq!(sql, r#"INSERT INTO "we""ird" ("na""me") VALUES ($1)"#);
    }

    #[test]
    fn delete_targets_the_whole_table() {
        assert_eq!(
            build_delete(&make_table(Some("crm"), "people")),
            r#"DELETE FROM "crm"."people""#
        );
    }
}
