use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::error::{Error, Result};

/// A single cell value in a [`DataTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value. Floats coerce only when they carry no
    /// fractional part, so an id column stored as 12.0 still matches file 12.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn from_json(value: &JsonValue) -> Value {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::String(s.clone()),
            // Nested structures are opaque to the table; keep their text form.
            other => Value::String(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::String(s) => json!(s),
        }
    }
}

/// An ordered table of named columns, one `Value` per column per row.
///
/// Mergers and the extent calculator treat this as the workflow's tabular
/// dataset: rows keyed logically by an image-id column, updated through an
/// explicit id -> row-indices map rather than predicate scans.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. The row width must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row width must match column count"
        );
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of the named column, adding it (filled with `Null`) if absent.
    pub fn add_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn set_value(&mut self, row: usize, column_idx: usize, value: Value) {
        self.rows[row][column_idx] = value;
    }

    /// All values of a column as `f64`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, values)| {
                values[idx].as_f64().ok_or_else(|| Error::NonNumericValue {
                    column: name.to_string(),
                    row,
                })
            })
            .collect()
    }

    /// Append a new column of floats, one per existing row.
    pub fn append_numeric_column(&mut self, name: &str, values: &[f64]) {
        assert_eq!(values.len(), self.rows.len(), "one value per row");
        let idx = self.add_column(name);
        for (row, v) in values.iter().enumerate() {
            self.rows[row][idx] = Value::Float(*v);
        }
    }

    /// Map from integer id to the indices of all rows carrying that id.
    ///
    /// Rows whose id value is not integer-coercible are skipped, so they can
    /// never be matched by a prediction file.
    pub fn id_index(&self, id_column: &str) -> Result<HashMap<i64, Vec<usize>>> {
        let idx = self
            .column_index(id_column)
            .ok_or_else(|| Error::MissingColumn(id_column.to_string()))?;
        let mut index: HashMap<i64, Vec<usize>> = HashMap::new();
        for (row, values) in self.rows.iter().enumerate() {
            if let Some(id) = values[idx].as_i64() {
                index.entry(id).or_default().push(row);
            }
        }
        Ok(index)
    }

    /// Load a table from a JSON file holding an array of objects.
    ///
    /// Column order is the order keys are first seen; keys absent from a
    /// record become `Null` in that row.
    pub fn from_json_records(path: &Path) -> Result<DataTable> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let parsed: JsonValue = serde_json::from_reader(reader)?;

        let records = parsed.as_array().ok_or(Error::InvalidRecords)?;
        let mut table = DataTable::default();
        for record in records {
            let object = record.as_object().ok_or(Error::InvalidRecords)?;
            for key in object.keys() {
                table.add_column(key);
            }
        }
        for record in records {
            let object = record.as_object().ok_or(Error::InvalidRecords)?;
            let row = table
                .columns
                .iter()
                .map(|c| object.get(c).map(Value::from_json).unwrap_or(Value::Null))
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Write the table as a JSON array of objects.
    pub fn to_json_records(&self, path: &Path) -> Result<()> {
        let records: Vec<JsonValue> = self
            .rows
            .iter()
            .map(|row| {
                let mut object = JsonMap::new();
                for (column, value) in self.columns.iter().zip(row) {
                    object.insert(column.clone(), value.to_json());
                }
                JsonValue::Object(object)
            })
            .collect();

        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &records)?;
        Ok(())
    }
}
