//! Column mapping configuration

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

/// Where and how spreadsheet columns land in the database.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    /// Optional schema; the table reference is unqualified when absent
    #[serde(default)]
    pub target_schema: Option<String>,
    pub target_table: String,
    /// Zero-based worksheet index
    pub sheet: usize,
    /// Leading rows to skip (headers)
    pub skip_rows: u32,
    pub mapping: FieldMappings,
}

/// Destination field name → 1-based source column index, in file order.
///
/// The JSON object's order is load-bearing: it fixes both the column list of
/// the generated INSERT and the positional order of every bound row. A hash
/// map would not preserve it, so the entries are kept as a vector of pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMappings(pub Vec<(String, u32)>);

impl FieldMappings {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in mapping order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(field, _)| field.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldMappings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMappingsVisitor;

        impl<'de> Visitor<'de> for FieldMappingsVisitor {
            type Value = FieldMappings;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field name to 1-based column index")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((field, column)) = access.next_entry::<String, u32>()? {
                    if column == 0 {
                        return Err(serde::de::Error::custom(format!(
                            "column index for \"{field}\" must be 1 or greater"
                        )));
                    }
                    pairs.push((field, column));
                }
                Ok(FieldMappings(pairs))
            }
        }

        deserializer.deserialize_map(FieldMappingsVisitor)
    }
}

/// Load and validate the mapping config. This file is a required argument,
/// so every failure here is fatal.
pub fn load(path: &Path) -> Result<MappingConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping config: {}", path.display()))?;
    let config: MappingConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse mapping config: {}", path.display()))?;

    if config.mapping.is_empty() {
        bail!("Mapping config {} maps no fields", path.display());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_mapping_order() {
        let config: MappingConfig = serde_json::from_str(
            r#"{
                "target_table": "people",
                "sheet": 0,
                "skip_rows": 1,
                "mapping": {"zeta": 3, "alpha": 1, "middle": 2}
            }"#,
        )
        .unwrap();

        let fields: Vec<_> = config.mapping.fields().collect();
        assert_eq!(fields, ["zeta", "alpha", "middle"]);
        assert_eq!(
            config.mapping.0,
            vec![
                ("zeta".to_string(), 3),
                ("alpha".to_string(), 1),
                ("middle".to_string(), 2)
            ]
        );
    }

    #[test]
    fn schema_is_optional() {
        let config: MappingConfig = serde_json::from_str(
            r#"{"target_table": "people", "sheet": 0, "skip_rows": 0, "mapping": {"name": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.target_schema, None);

        let config: MappingConfig = serde_json::from_str(
            r#"{
                "target_schema": "crm",
                "target_table": "people",
                "sheet": 0,
                "skip_rows": 0,
                "mapping": {"name": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(config.target_schema.as_deref(), Some("crm"));
    }

    #[test]
    fn rejects_zero_column_index() {
        let result = serde_json::from_str::<MappingConfig>(
            r#"{"target_table": "people", "sheet": 0, "skip_rows": 0, "mapping": {"name": 0}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_missing_target_table() {
        let result = serde_json::from_str::<MappingConfig>(
            r#"{"sheet": 0, "skip_rows": 0, "mapping": {"name": 1}}"#,
        );
        assert!(result.is_err());
    }
}
