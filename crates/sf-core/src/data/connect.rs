//! Format-registry dispatch for data ingestion.
//!
//! Converters turn raw bytes in a tagged external format into a [`Data`]
//! table. Formats whose collaborator crates are compiled out simply do not
//! register their tags.

use std::collections::HashMap;

use super::Data;
use crate::array::ArrayNamespace;
use crate::{Error, Result};

/// Column selection and renaming applied by every converter.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Columns to keep, in this order. `None` keeps all columns.
    pub names: Option<Vec<String>>,
    /// Renames applied after selection.
    pub renamer: Option<HashMap<String, String>>,
}

impl IngestOptions {
    fn rename(&self, name: &str) -> String {
        match &self.renamer {
            Some(renamer) => renamer.get(name).cloned().unwrap_or_else(|| name.to_string()),
            None => name.to_string(),
        }
    }
}

/// A converter from raw bytes to a data table.
pub type Converter<A> = fn(&[u8], &IngestOptions) -> Result<Data<A>>;

/// Registry mapping format tags to converters.
pub struct FormatRegistry<A: ArrayNamespace> {
    converters: HashMap<String, Converter<A>>,
}

impl<A: ArrayNamespace> FormatRegistry<A> {
    /// Empty registry.
    pub fn new() -> Self {
        Self { converters: HashMap::new() }
    }

    /// Registry with all compiled-in converters.
    pub fn with_builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "json-io")]
        {
            registry.register("json.columns", json::from_columns_object);
            registry.register("json.records", json::from_records_array);
        }
        registry
    }

    /// Register a converter, replacing any previous one under the same tag.
    pub fn register(&mut self, tag: impl Into<String>, converter: Converter<A>) {
        self.converters.insert(tag.into(), converter);
    }

    /// Registered tags (unordered).
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    /// Convert `bytes` tagged with `fmt` into a data table.
    pub fn convert(&self, fmt: &str, bytes: &[u8], options: &IngestOptions) -> Result<Data<A>> {
        let converter =
            self.converters.get(fmt).ok_or_else(|| Error::UnknownFormat(fmt.to_string()))?;
        converter(bytes, options)
    }
}

impl<A: ArrayNamespace> Default for FormatRegistry<A> {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(feature = "json-io")]
mod json {
    use serde_json::Value;

    use super::{Data, IngestOptions};
    use crate::array::ArrayNamespace;
    use crate::{Error, Result};

    fn as_f64(v: &Value, context: &str) -> Result<f64> {
        v.as_f64().ok_or_else(|| {
            Error::Validation(format!("expected a number in {context}, got {v}"))
        })
    }

    fn select_names(available: &[String], options: &IngestOptions) -> Result<Vec<String>> {
        match &options.names {
            Some(names) => {
                for n in names {
                    if !available.contains(n) {
                        return Err(Error::KeyLookup(format!("no column '{n}' in input")));
                    }
                }
                Ok(names.clone())
            }
            None => Ok(available.to_vec()),
        }
    }

    /// `{"col": [..], ..}`: one equal-length numeric array per column.
    ///
    /// Without a `names` option, columns appear in sorted key order.
    pub(super) fn from_columns_object<A: ArrayNamespace>(
        bytes: &[u8],
        options: &IngestOptions,
    ) -> Result<Data<A>> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Some(object) = value.as_object() else {
            return Err(Error::Validation("json.columns input must be an object".into()));
        };

        let available: Vec<String> = object.keys().cloned().collect();
        let names = select_names(&available, options)?;

        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let Some(raw) = object.get(name).and_then(Value::as_array) else {
                return Err(Error::Validation(format!("column '{name}' must be an array")));
            };
            let col = raw
                .iter()
                .map(|v| as_f64(v, &format!("column '{name}'")))
                .collect::<Result<Vec<f64>>>()?;
            columns.push((options.rename(name), col));
        }
        Data::from_columns(columns)
    }

    /// `[{"col": x, ..}, ..]`: one object per row.
    ///
    /// Every record must carry every selected column; without a `names`
    /// option the first record fixes the column set, in sorted key order.
    pub(super) fn from_records_array<A: ArrayNamespace>(
        bytes: &[u8],
        options: &IngestOptions,
    ) -> Result<Data<A>> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Some(records) = value.as_array() else {
            return Err(Error::Validation("json.records input must be an array".into()));
        };
        let Some(first) = records.first().and_then(Value::as_object) else {
            return Err(Error::Validation(
                "json.records input must contain at least one record object".into(),
            ));
        };

        let available: Vec<String> = first.keys().cloned().collect();
        let names = select_names(&available, options)?;

        let mut columns: Vec<(String, Vec<f64>)> = names
            .iter()
            .map(|n| (options.rename(n), Vec::with_capacity(records.len())))
            .collect();
        for (i, record) in records.iter().enumerate() {
            let Some(object) = record.as_object() else {
                return Err(Error::Validation(format!("record {i} is not an object")));
            };
            for (name, (_, col)) in names.iter().zip(&mut columns) {
                let Some(v) = object.get(name) else {
                    return Err(Error::KeyLookup(format!("record {i} is missing '{name}'")));
                };
                col.push(as_f64(v, &format!("record {i}, column '{name}'"))?);
            }
        }
        Data::from_columns(columns)
    }
}

#[cfg(all(test, feature = "json-io"))]
mod tests {
    use super::*;
    use crate::array::CpuBackend;

    fn registry() -> FormatRegistry<CpuBackend> {
        FormatRegistry::with_builtin()
    }

    #[test]
    fn test_columns_object_roundtrip() {
        let bytes = br#"{"phi1": [0.0, 1.0], "phi2": [2.0, 3.0]}"#;
        let d = registry().convert("json.columns", bytes, &IngestOptions::default()).unwrap();
        assert_eq!(d.names(), &["phi1".to_string(), "phi2".to_string()]);
        assert_eq!(d.column("phi2").unwrap(), &vec![2.0, 3.0]);
    }

    #[test]
    fn test_records_array_roundtrip() {
        let bytes = br#"[{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}]"#;
        let d = registry().convert("json.records", bytes, &IngestOptions::default()).unwrap();
        assert_eq!(d.n_rows(), 2);
        assert_eq!(d.column("x").unwrap(), &vec![1.0, 3.0]);
    }

    #[test]
    fn test_names_restrict_and_reorder() {
        let bytes = br#"{"a": [1.0], "b": [2.0], "c": [3.0]}"#;
        let options =
            IngestOptions { names: Some(vec!["c".into(), "a".into()]), renamer: None };
        let d = registry().convert("json.columns", bytes, &options).unwrap();
        assert_eq!(d.names(), &["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_renamer_applies_after_selection() {
        let bytes = br#"{"a": [1.0]}"#;
        let renamer = [("a".to_string(), "phi1".to_string())].into_iter().collect();
        let options = IngestOptions { names: None, renamer: Some(renamer) };
        let d = registry().convert("json.columns", bytes, &options).unwrap();
        assert_eq!(d.names(), &["phi1".to_string()]);
    }

    #[test]
    fn test_unknown_tag_fails() {
        let err = registry().convert("hdf5.table", b"", &IngestOptions::default());
        match err {
            Err(Error::UnknownFormat(tag)) => assert_eq!(tag, "hdf5.table"),
            other => panic!("expected UnknownFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_record_field_fails() {
        let bytes = br#"[{"x": 1.0, "y": 2.0}, {"x": 3.0}]"#;
        let err = registry().convert("json.records", bytes, &IngestOptions::default());
        assert!(matches!(err, Err(Error::KeyLookup(_))));
    }
}
