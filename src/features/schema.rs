//! Ordered feature schema.
//!
//! A schema is the exact list of columns a trained model expects, in the order it
//! was fit on. Column names follow the one-hot convention `<field>_<value>` for
//! categorical indicators, plus the raw numeric column names.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use crate::domain::{CategoricalField, NumericField};
use crate::error::AppError;

/// How a single schema column is derived from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// 1 when `field` equals `value`, else 0.
    Indicator { field: CategoricalField, value: String },
    /// Numeric value copied verbatim.
    Numeric(NumericField),
    /// Not derivable from a request; always 0.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    /// Classify a column name.
    ///
    /// Numeric names are matched first, then the categorical prefixes. An empty
    /// value after the prefix (`town_`) is treated as `Other`.
    pub fn parse(name: &str) -> Self {
        let kind = if let Some(field) = NumericField::from_column(name) {
            ColumnKind::Numeric(field)
        } else {
            CategoricalField::ALL
                .into_iter()
                .find_map(|field| {
                    name.strip_prefix(field.prefix())
                        .filter(|value| !value.is_empty())
                        .map(|value| ColumnKind::Indicator {
                            field,
                            value: value.to_string(),
                        })
                })
                .unwrap_or(ColumnKind::Other)
        };

        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// The ordered column list plus lookup tables used by the aligner.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from ordered column names.
    ///
    /// Duplicate names are rejected: a duplicated indicator would be set twice and
    /// the model could not tell the positions apart.
    pub fn from_names<I, S>(names: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns = Vec::new();
        let mut index = HashMap::new();

        for name in names {
            let name = name.as_ref();
            if index.insert(name.to_string(), columns.len()).is_some() {
                return Err(AppError::input(format!("Duplicate schema column: `{name}`")));
            }
            columns.push(Column::parse(name));
        }

        if columns.is_empty() {
            return Err(AppError::input("Feature schema has no columns."));
        }

        Ok(Self { columns, index })
    }

    /// The schema the bundled resale model was trained on.
    pub fn default_resale() -> Self {
        let names = DEFAULT_TOWNS
            .iter()
            .map(|v| format!("town_{v}"))
            .chain(DEFAULT_FLAT_TYPES.iter().map(|v| format!("flat_type_{v}")))
            .chain(DEFAULT_STOREY_RANGES.iter().map(|v| format!("storey_range_{v}")))
            .chain(DEFAULT_FLAT_MODELS.iter().map(|v| format!("flat_model_{v}")))
            .chain(NumericField::ALL.iter().map(|f| f.column().to_string()));

        // The constant lists are duplicate-free.
        let columns: Vec<Column> = names.map(|name| Column::parse(&name)).collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, index }
    }

    /// Read a schema from a JSON array of column names.
    pub fn read_json(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open schema '{}': {e}", path.display())))?;
        let names: Vec<String> = serde_json::from_reader(file)
            .map_err(|e| AppError::input(format!("Invalid schema JSON '{}': {e}", path.display())))?;
        Self::from_names(names)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Whether some indicator column exists for `field == value`.
    pub fn has_indicator(&self, field: CategoricalField, value: &str) -> bool {
        self.position(&format!("{}{value}", field.prefix()))
            .map(|i| matches!(self.columns[i].kind, ColumnKind::Indicator { .. }))
            .unwrap_or(false)
    }

    /// Numeric fields the schema carries (in schema order, deduplicated).
    pub fn numeric_fields(&self) -> Vec<NumericField> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .filter_map(|c| match c.kind {
                ColumnKind::Numeric(f) if seen.insert(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    /// Indicator values declared for a categorical field, in schema order.
    pub fn indicator_values(&self, field: CategoricalField) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match &c.kind {
                ColumnKind::Indicator { field: f, value } if *f == field => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

pub const DEFAULT_TOWNS: [&str; 26] = [
    "ANG MO KIO",
    "BEDOK",
    "BISHAN",
    "BUKIT BATOK",
    "BUKIT MERAH",
    "BUKIT PANJANG",
    "BUKIT TIMAH",
    "CENTRAL AREA",
    "CHOA CHU KANG",
    "CLEMENTI",
    "GEYLANG",
    "HOUGANG",
    "JURONG EAST",
    "JURONG WEST",
    "KALLANG/WHAMPOA",
    "MARINE PARADE",
    "PASIR RIS",
    "PUNGGOL",
    "QUEENSTOWN",
    "SEMBAWANG",
    "SENGKANG",
    "SERANGOON",
    "TAMPINES",
    "TOA PAYOH",
    "WOODLANDS",
    "YISHUN",
];

pub const DEFAULT_FLAT_TYPES: [&str; 7] = [
    "1 ROOM",
    "2 ROOM",
    "3 ROOM",
    "4 ROOM",
    "5 ROOM",
    "EXECUTIVE",
    "MULTI-GENERATION",
];

pub const DEFAULT_STOREY_RANGES: [&str; 17] = [
    "01 TO 03",
    "04 TO 06",
    "07 TO 09",
    "10 TO 12",
    "13 TO 15",
    "16 TO 18",
    "19 TO 21",
    "22 TO 24",
    "25 TO 27",
    "28 TO 30",
    "31 TO 33",
    "34 TO 36",
    "37 TO 39",
    "40 TO 42",
    "43 TO 45",
    "46 TO 48",
    "49 TO 51",
];

pub const DEFAULT_FLAT_MODELS: [&str; 21] = [
    "2-room",
    "3Gen",
    "Adjoined flat",
    "Apartment",
    "DBSS",
    "Improved",
    "Improved-Maisonette",
    "Maisonette",
    "Model A",
    "Model A-Maisonette",
    "Model A2",
    "Multi Generation",
    "New Generation",
    "Premium Apartment",
    "Premium Apartment Loft",
    "Premium Maisonette",
    "Simplified",
    "Standard",
    "Terrace",
    "Type S1",
    "Type S2",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_layout() {
        let schema = FeatureSchema::default_resale();
        assert_eq!(schema.len(), 73);
        assert_eq!(schema.columns()[0].name, "town_ANG MO KIO");
        assert_eq!(schema.position("floor_area_sqm"), Some(71));
        assert_eq!(schema.position("lease_commence_date"), Some(72));
        assert_eq!(schema.indicator_values(CategoricalField::Town).len(), 26);
        assert_eq!(schema.indicator_values(CategoricalField::FlatModel).len(), 21);
        assert_eq!(
            schema.numeric_fields(),
            vec![NumericField::FloorAreaSqm, NumericField::LeaseCommenceDate]
        );
    }

    #[test]
    fn parse_classifies_columns() {
        assert_eq!(
            Column::parse("flat_type_4 ROOM").kind,
            ColumnKind::Indicator {
                field: CategoricalField::FlatType,
                value: "4 ROOM".to_string()
            }
        );
        assert_eq!(
            Column::parse("flat_model_Model A2").kind,
            ColumnKind::Indicator {
                field: CategoricalField::FlatModel,
                value: "Model A2".to_string()
            }
        );
        assert_eq!(
            Column::parse("lease_commence_date").kind,
            ColumnKind::Numeric(NumericField::LeaseCommenceDate)
        );
        assert_eq!(Column::parse("remaining_lease").kind, ColumnKind::Other);
        assert_eq!(Column::parse("town_").kind, ColumnKind::Other);
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = FeatureSchema::from_names(["town_BEDOK", "floor_area_sqm", "town_BEDOK"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("town_BEDOK"));
    }

    #[test]
    fn empty_schema_is_rejected() {
        assert!(FeatureSchema::from_names(Vec::<String>::new()).is_err());
    }

    #[test]
    fn has_indicator_is_exact_match() {
        let schema = FeatureSchema::default_resale();
        assert!(schema.has_indicator(CategoricalField::Town, "BEDOK"));
        assert!(!schema.has_indicator(CategoricalField::Town, "bedok"));
        assert!(!schema.has_indicator(CategoricalField::Town, "ATLANTIS"));
    }

    #[test]
    fn read_json_round_trips_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"["town_BEDOK", "flat_type_4 ROOM", "floor_area_sqm"]"#).unwrap();

        let schema = FeatureSchema::read_json(&path).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["town_BEDOK", "flat_type_4 ROOM", "floor_area_sqm"]);
    }
}
