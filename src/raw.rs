//! Raw syntax layer.
//!
//! Mirrors the JSON shape of an annotation document without interpreting
//! type positions. Object keys are kept as ordered entries so that repeated
//! keys survive deserialization and can be reported by the validator.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::types::NULL_MARKER;

/// JSON object entries in source order, duplicates included.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entries<T>(pub Vec<(String, T)>);

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Entries(Vec::new())
    }
}

impl<T> Entries<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// A JSON value in a type position, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawType {
    Name(String),
    List(Vec<RawType>),
    Map(Entries<RawType>),
    /// Any other JSON value; holds its JSON type name.
    Other(&'static str),
}

impl RawType {
    pub fn is_null_marker(&self) -> bool {
        matches!(self, RawType::Name(name) if name == NULL_MARKER)
    }
}

impl From<&Value> for RawType {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => RawType::Name(s.clone()),
            Value::Array(items) => RawType::List(items.iter().map(RawType::from).collect()),
            Value::Object(map) => RawType::Map(Entries(
                map.iter()
                    .map(|(k, v)| (k.clone(), RawType::from(v)))
                    .collect(),
            )),
            other => RawType::Other(crate::types::json_type_name(other)),
        }
    }
}

impl<'de> Deserialize<'de> for RawType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawTypeVisitor;

        impl<'de> Visitor<'de> for RawTypeVisitor {
            type Value = RawType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any JSON value")
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawType, E> {
                Ok(RawType::Other("boolean"))
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<RawType, E> {
                Ok(RawType::Other("number"))
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<RawType, E> {
                Ok(RawType::Other("number"))
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawType, E> {
                Ok(RawType::Other("number"))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<RawType, E> {
                Ok(RawType::Name(s.to_string()))
            }

            fn visit_string<E: de::Error>(self, s: String) -> Result<RawType, E> {
                Ok(RawType::Name(s))
            }

            fn visit_unit<E: de::Error>(self) -> Result<RawType, E> {
                Ok(RawType::Other("null"))
            }

            fn visit_none<E: de::Error>(self) -> Result<RawType, E> {
                Ok(RawType::Other("null"))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawType, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<RawType>()? {
                    items.push(item);
                }
                Ok(RawType::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawType, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, RawType>()? {
                    entries.push((key, value));
                }
                Ok(RawType::Map(Entries(entries)))
            }
        }

        deserializer.deserialize_any(RawTypeVisitor)
    }
}

/// A struct that only deserializes from a JSON object.
///
/// Derived struct impls also accept arrays (`[{}, {}]`), which would let
/// positional documents through.
#[derive(Debug)]
pub(crate) struct MapOnly<T>(pub T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MapOnly<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapOnlyVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for MapOnlyVisitor<T> {
            type Value = MapOnly<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                T::deserialize(de::value::MapAccessDeserializer::new(map)).map(MapOnly)
            }
        }

        deserializer.deserialize_map(MapOnlyVisitor(PhantomData))
    }
}

/// A method body: `{ "request": {..}, "response": {..} }`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, expecting = "a method with request and response")]
pub(crate) struct RawMethod {
    pub request: Entries<RawType>,
    pub response: Entries<RawType>,
}

/// The whole annotation document. Absent or `null` sections are empty.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, expecting = "an annotation document object")]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub enums: Option<Entries<Entries<String>>>,
    #[serde(default)]
    pub objects: Option<Entries<Entries<RawType>>>,
    #[serde(default)]
    pub methods: Option<Entries<MapOnly<RawMethod>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_keep_duplicate_keys() {
        let entries: Entries<String> =
            serde_json::from_str(r#"{"A": "a", "B": "b", "A": "c"}"#).unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B", "A"]);
    }

    #[test]
    fn raw_type_from_json_text() {
        let raw: RawType = serde_json::from_str(r#"[["date", "datetime"], "null", 4]"#).unwrap();
        assert_eq!(
            raw,
            RawType::List(vec![
                RawType::List(vec![
                    RawType::Name("date".into()),
                    RawType::Name("datetime".into()),
                ]),
                RawType::Name("null".into()),
                RawType::Other("number"),
            ])
        );
    }

    #[test]
    fn raw_type_from_value_matches_text() {
        let text = r#"{"a": ["int"], "b": true, "c": null}"#;
        let from_text: RawType = serde_json::from_str(text).unwrap();
        let value: Value = serde_json::from_str(text).unwrap();
        assert_eq!(from_text, RawType::from(&value));
    }

    #[test]
    fn null_marker() {
        assert!(RawType::from(&json!("null")).is_null_marker());
        assert!(!RawType::from(&json!(null)).is_null_marker());
        assert!(!RawType::from(&json!("int")).is_null_marker());
    }

    #[test]
    fn document_sections_default_to_empty() {
        let doc: RawDocument = serde_json::from_str(r#"{"enums": null}"#).unwrap();
        assert!(doc.enums.is_none());
        assert!(doc.objects.is_none());
        assert!(doc.methods.is_none());
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        let result: Result<RawDocument, _> = serde_json::from_str(r#"{"types": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn positional_forms_rejected() {
        assert!(serde_json::from_str::<MapOnly<RawDocument>>("[]").is_err());
        assert!(serde_json::from_str::<MapOnly<RawMethod>>(r#"[{}, {}]"#).is_err());
        assert!(serde_json::from_str::<MapOnly<RawDocument>>("{}").is_ok());
    }

    #[test]
    fn method_requires_both_directions() {
        let result: Result<RawMethod, _> = serde_json::from_str(r#"{"request": {}}"#);
        assert!(result.is_err());
    }
}
