//! Method payloads checked against a validated schema.
//!
//! A method direction is exported as a draft 2020-12 JSON Schema and
//! payloads are validated against it with `jsonschema`.
//!
//! | Annotation | JSON Schema |
//! |------------|-------------|
//! | `int` / `float` / `boolean` / `string` | `integer` / `number` / `boolean` / `string` |
//! | `uuid` / `date` / `datetime` | `string` with format `uuid` / `date` / `date-time` |
//! | enum | `$ref` to a string schema listing the member values |
//! | object | `$ref` to an object schema |
//! | `[T]` | `array` of `T` |
//! | `[A, B]` | `anyOf` |
//! | `[T, "null"]` | `anyOf` with `null` |
//!
//! Every field is required; nullable fields must be present but may be null.
//! Union alternatives may overlap (`["int", "float"]`), so a value only has
//! to match one of them.

use serde_json::{json, Map, Value};

use crate::error::{PayloadError, Violation};
use crate::schema::{ResolvedField, ResolvedType, ValidatedSchema};
use crate::types::{PayloadOptions, Primitive};

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

impl ValidatedSchema {
    /// Export one direction of a method as a standalone JSON Schema.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::UnknownMethod` if the method is not declared.
    pub fn json_schema(
        &self,
        method: &str,
        options: &PayloadOptions,
    ) -> Result<Value, PayloadError> {
        let target = self.method(method).ok_or_else(|| PayloadError::UnknownMethod {
            name: method.to_string(),
        })?;

        let mut defs = Map::new();
        for (_, decl) in self.enums() {
            defs.insert(
                decl.name.clone(),
                json!({ "type": "string", "enum": decl.values() }),
            );
        }
        for (_, decl) in self.objects() {
            defs.insert(
                decl.name.clone(),
                self.object_schema(&decl.fields, options.strict),
            );
        }

        let mut root = Map::new();
        root.insert("$schema".to_string(), Value::String(DRAFT.to_string()));
        root.insert(
            "title".to_string(),
            Value::String(format!("{}.{}", method, options.direction.key())),
        );
        let body = self.object_schema(target.fields(options.direction), options.strict);
        if let Value::Object(body) = body {
            root.extend(body);
        }
        root.insert("$defs".to_string(), Value::Object(defs));

        Ok(Value::Object(root))
    }

    /// Validate a request or response payload of a method.
    ///
    /// Collects every violation rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::UnknownMethod` for undeclared methods, or
    /// `PayloadError::Invalid` if the payload doesn't match.
    pub fn validate_payload(
        &self,
        method: &str,
        payload: &Value,
        options: &PayloadOptions,
    ) -> Result<(), PayloadError> {
        let schema = self.json_schema(method, options)?;
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| PayloadError::InvalidSchema {
                message: e.to_string(),
            })?;

        let violations: Vec<Violation> = validator
            .iter_errors(payload)
            .map(|e| Violation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        tracing::debug!(
            method,
            direction = options.direction.key(),
            violations = violations.len(),
            "checked payload"
        );

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PayloadError::Invalid { violations })
        }
    }

    fn object_schema(&self, fields: &[ResolvedField], strict: bool) -> Value {
        let properties: Map<String, Value> = fields
            .iter()
            .map(|field| (field.name.clone(), self.type_schema(&field.ty, strict)))
            .collect();
        let required: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": required,
        });
        if strict {
            schema["additionalProperties"] = Value::Bool(false);
        }
        schema
    }

    fn type_schema(&self, ty: &ResolvedType, strict: bool) -> Value {
        match ty {
            ResolvedType::Primitive(p) => primitive_schema(*p),
            ResolvedType::Enum(id) => json!({ "$ref": def_ref(&self.enum_decl(*id).name) }),
            ResolvedType::Object(id) => json!({ "$ref": def_ref(&self.object(*id).name) }),
            ResolvedType::Nullable(inner) => json!({
                "anyOf": [self.type_schema(inner, strict), { "type": "null" }]
            }),
            ResolvedType::Union(alternatives) => {
                let alternatives: Vec<Value> = alternatives
                    .iter()
                    .map(|alternative| self.type_schema(alternative, strict))
                    .collect();
                json!({ "anyOf": alternatives })
            }
            ResolvedType::Array(element) => json!({
                "type": "array",
                "items": self.type_schema(element, strict),
            }),
            ResolvedType::InlineObject(fields) => self.object_schema(fields, strict),
        }
    }
}

/// URI fragment pointing at `$defs/<name>`.
///
/// The name is escaped as a JSON Pointer token (`~` as `~0`, `/` as `~1`)
/// and every byte outside the URI unreserved set is percent-encoded.
fn def_ref(name: &str) -> String {
    let mut fragment = String::from("#/$defs/");
    let token = name.replace('~', "~0").replace('/', "~1");
    for byte in token.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            fragment.push(char::from(byte));
        } else {
            fragment.push_str(&format!("%{:02X}", byte));
        }
    }
    fragment
}

fn primitive_schema(primitive: Primitive) -> Value {
    match primitive {
        Primitive::Integer => json!({ "type": "integer" }),
        Primitive::Float => json!({ "type": "number" }),
        Primitive::Boolean => json!({ "type": "boolean" }),
        Primitive::String => json!({ "type": "string" }),
        Primitive::Uuid => json!({ "type": "string", "format": "uuid" }),
        Primitive::Date => json!({ "type": "string", "format": "date" }),
        Primitive::DateTime => json!({ "type": "string", "format": "date-time" }),
    }
}
