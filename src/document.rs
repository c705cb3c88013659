//! Schema document model and the parse phase.

use serde_json::{Map, Value};

use crate::error::{ParseError, ValidateError};
use crate::parser::parse_fields;
use crate::raw::{MapOnly, RawDocument, RawMethod};
use crate::schema::ValidatedSchema;
use crate::types::{fields_to_value, EnumDecl, EnumMember, MethodDecl, ObjectDecl, ValidateOptions};

/// A parsed, not yet validated, annotation document.
///
/// Declarations are kept in source order. Names are not checked here, so a
/// document may hold repeated or dangling names until it is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDocument {
    pub enums: Vec<EnumDecl>,
    pub objects: Vec<ObjectDecl>,
    pub methods: Vec<MethodDecl>,
}

impl SchemaDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidJson` for syntax errors,
    /// `ParseError::InvalidDocument` if the top-level shape is wrong, or
    /// `ParseError::Malformed` listing every malformed type expression.
    pub fn parse_str(content: &str) -> Result<Self, ParseError> {
        let mut deserializer = serde_json::Deserializer::from_str(content);
        let MapOnly(raw): MapOnly<RawDocument> =
            serde_path_to_error::deserialize(&mut deserializer).map_err(classify)?;
        deserializer
            .end()
            .map_err(|source| ParseError::InvalidJson { source })?;
        Self::from_raw(raw)
    }

    /// Parse a document from an already decoded JSON value.
    ///
    /// Repeated keys cannot be detected here since `Value` has already
    /// merged them.
    ///
    /// # Errors
    ///
    /// Same as [`SchemaDocument::parse_str`], minus syntax errors.
    pub fn parse_value(value: &Value) -> Result<Self, ParseError> {
        let MapOnly(raw): MapOnly<RawDocument> =
            serde_path_to_error::deserialize(value).map_err(classify)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDocument) -> Result<Self, ParseError> {
        let mut errors = Vec::new();

        let enums: Vec<EnumDecl> = raw
            .enums
            .unwrap_or_default()
            .0
            .into_iter()
            .map(|(name, members)| EnumDecl {
                name,
                members: members
                    .0
                    .into_iter()
                    .map(|(name, value)| EnumMember { name, value })
                    .collect(),
            })
            .collect();

        let objects: Vec<ObjectDecl> = raw
            .objects
            .unwrap_or_default()
            .0
            .into_iter()
            .filter_map(|(name, fields)| {
                let fields = parse_fields(&fields, &format!("objects.{}", name), &mut errors)?;
                Some(ObjectDecl { name, fields })
            })
            .collect();

        let methods: Vec<MethodDecl> = raw
            .methods
            .unwrap_or_default()
            .0
            .into_iter()
            .filter_map(|(name, MapOnly(RawMethod { request, response }))| {
                let base = format!("methods.{}", name);
                let request = parse_fields(&request, &format!("{}.request", base), &mut errors);
                let response = parse_fields(&response, &format!("{}.response", base), &mut errors);
                Some(MethodDecl {
                    name,
                    request: request?,
                    response: response?,
                })
            })
            .collect();

        if !errors.is_empty() {
            return Err(ParseError::Malformed { errors });
        }

        let document = SchemaDocument {
            enums,
            objects,
            methods,
        };
        tracing::debug!(
            enums = document.enums.len(),
            objects = document.objects.len(),
            methods = document.methods.len(),
            "parsed schema document"
        );
        Ok(document)
    }

    /// Validate this document. The document itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::Invalid` with every error found.
    pub fn validate(&self, options: &ValidateOptions) -> Result<ValidatedSchema, ValidateError> {
        crate::validator::validate(self, options)
    }

    /// Canonical JSON form of the document.
    ///
    /// Repeated names collapse to the last occurrence, so only validated
    /// documents round-trip exactly.
    pub fn to_value(&self) -> Value {
        let enums: Map<String, Value> = self
            .enums
            .iter()
            .map(|decl| {
                let members: Map<String, Value> = decl
                    .members
                    .iter()
                    .map(|m| (m.name.clone(), Value::String(m.value.clone())))
                    .collect();
                (decl.name.clone(), Value::Object(members))
            })
            .collect();

        let objects: Map<String, Value> = self
            .objects
            .iter()
            .map(|decl| (decl.name.clone(), fields_to_value(&decl.fields)))
            .collect();

        let methods: Map<String, Value> = self
            .methods
            .iter()
            .map(|decl| {
                let mut body = Map::new();
                body.insert("request".to_string(), fields_to_value(&decl.request));
                body.insert("response".to_string(), fields_to_value(&decl.response));
                (decl.name.clone(), Value::Object(body))
            })
            .collect();

        let mut root = Map::new();
        root.insert("enums".to_string(), Value::Object(enums));
        root.insert("objects".to_string(), Value::Object(objects));
        root.insert("methods".to_string(), Value::Object(methods));
        Value::Object(root)
    }
}

fn classify(err: serde_path_to_error::Error<serde_json::Error>) -> ParseError {
    if err.inner().is_data() {
        ParseError::InvalidDocument {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        }
    } else {
        ParseError::InvalidJson {
            source: err.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Primitive, TypeExpr};
    use serde_json::json;

    #[test]
    fn empty_document() {
        let doc = SchemaDocument::parse_str("{}").unwrap();
        assert_eq!(doc, SchemaDocument::default());
    }

    #[test]
    fn sections_in_source_order() {
        let doc = SchemaDocument::parse_str(
            r#"{
                "objects": {"B": {"x": "int"}, "A": {"y": "B"}},
                "enums": {"E": {"ONE": "one"}}
            }"#,
        )
        .unwrap();
        assert_eq!(doc.objects[0].name, "B");
        assert_eq!(doc.objects[1].name, "A");
        assert_eq!(
            doc.objects[1].fields[0].ty,
            TypeExpr::Reference("B".into())
        );
        assert_eq!(doc.enums[0].members[0].value, "one");
    }

    #[test]
    fn repeated_names_survive_parsing() {
        let doc = SchemaDocument::parse_str(
            r#"{"objects": {"Child": {"a": "int", "a": "string"}, "Child": {"b": "int"}}}"#,
        )
        .unwrap();
        assert_eq!(doc.objects.len(), 2);
        assert_eq!(doc.objects[0].fields.len(), 2);
    }

    #[test]
    fn invalid_json() {
        let err = SchemaDocument::parse_str("{ not json }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));

        let err = SchemaDocument::parse_str("{} trailing").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn wrong_shape_reports_path() {
        let err =
            SchemaDocument::parse_str(r#"{"enums": {"TypeEnum": {"FIRST": 1}}}"#).unwrap_err();
        match err {
            ParseError::InvalidDocument { path, .. } => assert_eq!(path, "enums.TypeEnum.FIRST"),
            other => panic!("expected InvalidDocument, got {:?}", other),
        }
    }

    #[test]
    fn method_missing_response() {
        let err = SchemaDocument::parse_value(&json!({
            "methods": {"ping": {"request": {}}}
        }))
        .unwrap_err();
        match err {
            ParseError::InvalidDocument { path, message } => {
                assert_eq!(path, "methods.ping");
                assert!(message.contains("response"));
            }
            other => panic!("expected InvalidDocument, got {:?}", other),
        }
    }

    #[test]
    fn unknown_top_level_key() {
        let err = SchemaDocument::parse_value(&json!({"types": {}})).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDocument { .. }));
    }

    #[test]
    fn malformed_types_collected_across_declarations() {
        let err = SchemaDocument::parse_value(&json!({
            "objects": {"Child": {"age": 3}},
            "methods": {"m": {"request": {"a": []}, "response": {"b": {}}}}
        }))
        .unwrap_err();
        let ParseError::Malformed { errors } = err else {
            panic!("expected Malformed");
        };
        let paths: Vec<&str> = errors.iter().map(|e| e.path()).collect();
        assert_eq!(
            paths,
            vec!["objects.Child.age", "methods.m.request.a", "methods.m.response.b"]
        );
    }

    #[test]
    fn to_value_is_canonical() {
        let doc = SchemaDocument::parse_value(&json!({
            "objects": {"Child": {"born": ["null", "date"], "n": "integer"}},
            "methods": {"m": {"request": {"c": ["Child"]}, "response": {}}}
        }))
        .unwrap();
        assert_eq!(
            doc.to_value(),
            json!({
                "enums": {},
                "objects": {"Child": {"born": ["date", "null"], "n": "int"}},
                "methods": {"m": {"request": {"c": ["Child"]}, "response": {}}}
            })
        );
        assert_eq!(
            doc.objects[0].fields[1].ty,
            TypeExpr::Primitive(Primitive::Integer)
        );
    }
}
