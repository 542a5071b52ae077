//! Record store: grid rows as ordered field maps, plus the deployment schema
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum::Display;

/// One grid row. Field order is preserved so serialized data embedded in a
/// prompt is byte-for-byte deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(serde_json::Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field. `None` means the field is absent from the row;
    /// a JSON null comes back as `FieldValue::Null`.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.0.get(field).map(FieldValue::from_json)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A field value as the evaluator sees it: the four wire types plus null.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s.clone()),
            // Nested structures are opaque; compare them by their JSON text
            other => Self::Text(other.to_string()),
        }
    }

    /// Coerce to a number. Numeric strings qualify; booleans do not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Coerce to a boolean. Only `true`/`false` text qualifies.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// String representation used by the text operators; `None` on null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Parse a calendar date out of the value. Grid dates arrive as
    /// formatted strings (`15.03.2024`, `2024-03-15`, or RFC 3339).
    pub fn as_date(&self) -> Option<NaiveDate> {
        let FieldValue::Text(s) = self else {
            return None;
        };
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%d.%m.%Y")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .ok()
            .or_else(|| {
                chrono::DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, ""),
        }
    }
}

/// Format a float the way the grid shows it: no trailing `.0` on integers
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Declared type of a grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
}

/// One column of the deployment's fixed field set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub title: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: &str, title: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            kind,
        }
    }
}

/// The fixed per-deployment field set, known to the prompt builder (for
/// schema description and digests) and to nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSchema {
    pub fields: Vec<FieldDef>,
}

impl GridSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// The reporting-templates deployment this assistant was built around
    pub fn reporting_templates() -> Self {
        Self::new(vec![
            FieldDef::new("templateName", "Spørremaler", FieldKind::Text),
            FieldDef::new("ownerName", "Eier", FieldKind::Text),
            FieldDef::new("formattedCreatedDate", "Opprettet dato", FieldKind::Date),
            FieldDef::new("formattedLastUpdatedDate", "Sist oppdatert", FieldKind::Date),
            FieldDef::new("isGlobalStringValue", "Tilgangsrettigheter", FieldKind::Text),
            FieldDef::new("isDocWidgetStringValue", "Dokumentwidget", FieldKind::Text),
            FieldDef::new("isLockedStringValue", "Status", FieldKind::Text),
            FieldDef::new("isLocked", "Låst", FieldKind::Boolean),
            FieldDef::new("createdOrg", "Organisasjon", FieldKind::Text),
            FieldDef::new("previousYearActuals", "Regnskap i fjor", FieldKind::Number),
            FieldDef::new("currentYearBudget", "Budsjett i år", FieldKind::Number),
            FieldDef::new("currentYearActuals", "Regnskap i år", FieldKind::Number),
            FieldDef::new("currentYearDeviation", "Avvik i år", FieldKind::Number),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_record_field_lookup() {
        let r = record(json!({"templateName": "X", "isLocked": true, "note": null}));
        assert_eq!(r.get("templateName"), Some(FieldValue::Text("X".into())));
        assert_eq!(r.get("isLocked"), Some(FieldValue::Bool(true)));
        assert_eq!(r.get("note"), Some(FieldValue::Null));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn test_record_preserves_field_order() {
        let r = record(json!({"b": 1, "a": 2, "c": 3}));
        let names: Vec<&String> = r.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_record_built_by_hand() {
        let mut r = Record::new();
        assert!(r.is_empty());
        r.insert("templateName", json!("X"));
        r.insert("currentYearBudget", json!(450000));
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("currentYearBudget"), Some(FieldValue::Number(450000.0)));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(FieldValue::Number(3.0).as_number(), Some(3.0));
        assert_eq!(FieldValue::Text(" 120000 ".into()).as_number(), Some(120000.0));
        assert_eq!(FieldValue::Text("N/A".into()).as_number(), None);
        assert_eq!(FieldValue::Bool(true).as_number(), None);
        assert_eq!(FieldValue::Null.as_number(), None);
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(FieldValue::Bool(false).as_bool(), Some(false));
        assert_eq!(FieldValue::Text("TRUE".into()).as_bool(), Some(true));
        assert_eq!(FieldValue::Text("Låst".into()).as_bool(), None);
        assert_eq!(FieldValue::Number(1.0).as_bool(), None);
    }

    #[test]
    fn test_date_parsing_accepts_grid_formats() {
        let norwegian = FieldValue::Text("15.03.2024".into());
        let iso = FieldValue::Text("2024-03-15".into());
        assert_eq!(norwegian.as_date(), iso.as_date());
        assert!(norwegian.as_date().is_some());
        assert_eq!(FieldValue::Text("not a date".into()).as_date(), None);
    }

    #[test]
    fn test_text_repr_of_numbers_drops_trailing_zero() {
        assert_eq!(FieldValue::Number(450000.0).as_text().unwrap(), "450000");
        assert_eq!(FieldValue::Number(0.5).as_text().unwrap(), "0.5");
        assert_eq!(FieldValue::Null.as_text(), None);
    }

    #[test]
    fn test_reporting_templates_schema() {
        let schema = GridSchema::reporting_templates();
        assert!(schema.contains("templateName"));
        assert!(schema.contains("currentYearDeviation"));
        assert!(!schema.contains("nonexistent"));
        assert_eq!(schema.field("isLocked").unwrap().kind, FieldKind::Boolean);
    }
}
