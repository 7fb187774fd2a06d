//! CSV/JSON front-ends over `save_many`/`listkeys`+`getkey`. Import is
//! not a separate code path: every row is parsed into a `(key, value)`
//! pair and committed through the same transactional bulk save used by
//! `save_many`.

use crate::workspace::Workspace;
use kybase_core::{Error, Result, Value};
use std::path::Path;

/// Export format, inferred from the file extension by `export_data`/
/// `import_data` or chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `Key,Value` header, one row per live key; complex values are
    /// JSON-encoded inline.
    Csv,
    /// A single JSON object mapping key to value.
    Json,
}

impl DataFormat {
    fn from_extension(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DataFormat::Json),
            Some("csv") => Ok(DataFormat::Csv),
            _ => Err(Error::Validation("unsupported format: use .json or .csv".to_string())),
        }
    }
}

impl Workspace {
    /// Write every live key's current value to `path` in `format`.
    pub fn export_data(&self, path: &Path, format: DataFormat) -> Result<()> {
        self.require_kv_mode("export_data")?;
        let keys = self.listkeys(None)?;
        let mut pairs = Vec::with_capacity(keys.len());
        for key in &keys {
            pairs.push((key.clone(), self.getkey(key, true)?));
        }

        let text = match format {
            DataFormat::Json => {
                let object: serde_json::Map<String, serde_json::Value> =
                    pairs.into_iter().map(|(k, v)| (k, v.to_json())).collect();
                serde_json::to_string_pretty(&object).map_err(|e| Error::Serialization(e.to_string()))?
            }
            DataFormat::Csv => {
                let mut out = String::from("Key,Value\n");
                for (key, value) in pairs {
                    out.push_str(&csv_field(&key));
                    out.push(',');
                    out.push_str(&csv_field(&value_to_csv_cell(&value)));
                    out.push('\n');
                }
                out
            }
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Export inferring the format from `path`'s extension (`.json` or
    /// `.csv`).
    pub fn export_data_auto(&self, path: &Path) -> Result<()> {
        self.export_data(path, DataFormat::from_extension(path)?)
    }

    /// Parse `path` (format inferred from its extension) and commit
    /// every `(key, value)` pair through `save_many`.
    pub fn import_data(&self, path: &Path) -> Result<usize> {
        self.require_kv_mode("import_data")?;
        if !path.exists() {
            return Err(Error::Validation(format!("file not found: {}", path.display())));
        }
        let text = std::fs::read_to_string(path)?;
        let format = DataFormat::from_extension(path)?;
        let pairs = match format {
            DataFormat::Json => parse_json(&text)?,
            DataFormat::Csv => parse_csv(&text)?,
        };
        let count = pairs.len();
        let items = pairs.into_iter().map(|(k, v)| (k, v, None)).collect();
        self.save_many(items)?;
        Ok(count)
    }
}

fn value_to_csv_cell(value: &Value) -> String {
    match value {
        Value::List(_) | Value::Map(_) => serde_json::to_string(&value.to_json()).unwrap_or_default(),
        other => other.canonical_encode(),
    }
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_json(text: &str) -> Result<Vec<(String, Value)>> {
    let parsed: serde_json::Value = serde_json::from_str(text).map_err(|e| Error::Validation(e.to_string()))?;
    match parsed {
        serde_json::Value::Object(map) => {
            Ok(map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect())
        }
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Array(mut pair) if pair.len() == 2 => {
                    let value = pair.pop().unwrap();
                    let key_json = pair.pop().unwrap();
                    let key = key_json.as_str().ok_or_else(|| Error::Validation("import key must be a string".to_string()))?.to_string();
                    Ok((key, Value::from_json(value)))
                }
                _ => Err(Error::Validation("expected a [key, value] pair".to_string())),
            })
            .collect(),
        _ => Err(Error::Validation("JSON must be an object or a list of pairs".to_string())),
    }
}

fn parse_csv(text: &str) -> Result<Vec<(String, Value)>> {
    let mut lines = text.lines();
    lines.next(); // header
    let mut pairs = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        if fields.len() < 2 {
            continue;
        }
        pairs.push((fields[0].clone(), Value::parse_literal(&fields[1])));
    }
    Ok(pairs)
}

/// Minimal RFC-4180-style splitter: handles quoted fields with embedded
/// commas and doubled quotes, which is all `csv_field` ever emits.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::tempdir;

    fn open_ws() -> (tempfile::TempDir, Workspace) {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Workspace::open("default", &dir.path().join("default"), &config).unwrap();
        (dir, ws)
    }

    #[test]
    fn json_round_trips_through_export_and_import() {
        let (dir, ws) = open_ws();
        ws.save("name", Value::Text("balu".to_string()), None).unwrap();
        ws.save("age", Value::Int(30), None).unwrap();
        let path = dir.path().join("out.json");
        ws.export_data_auto(&path).unwrap();

        let (_dir2, ws2) = open_ws();
        let count = ws2.import_data(&path).unwrap();
        assert_eq!(count, 2);
        assert_eq!(ws2.getkey("name", true).unwrap(), Value::Text("balu".to_string()));
        assert_eq!(ws2.getkey("age", true).unwrap(), Value::Int(30));
    }

    #[test]
    fn csv_round_trips_complex_values() {
        let (dir, ws) = open_ws();
        ws.push_value("tags", Value::Text("a".to_string()), false).unwrap();
        ws.push_value("tags", Value::Text("b, c".to_string()), false).unwrap();
        let path = dir.path().join("out.csv");
        ws.export_data_auto(&path).unwrap();

        let (_dir2, ws2) = open_ws();
        ws2.import_data(&path).unwrap();
        assert_eq!(
            ws2.getkey("tags", true).unwrap(),
            Value::List(vec![Value::Text("a".to_string()), Value::Text("b, c".to_string())])
        );
    }

    #[test]
    fn import_rejects_missing_file() {
        let (_dir, ws) = open_ws();
        assert!(ws.import_data(Path::new("/nonexistent/file.json")).is_err());
    }
}
