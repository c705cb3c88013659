//! Type expression parsing.
//!
//! Turns a JSON value in a type position into a [`TypeExpr`]. Shapes are
//! matched in this order:
//!
//! | JSON | Result |
//! |------|--------|
//! | `"int"`, `"date"`, ... | `Primitive` |
//! | any other string | `Reference` (resolved later) |
//! | `[T]` | `Array(T)` |
//! | `[T, "null"]` | `Nullable(T)` |
//! | `[A, B, ...]` | `Union`, flattened; a `"null"` anywhere makes it `Nullable` |
//! | `{ "field": T, ... }` | `InlineObject` |
//!
//! Anything else is a `MalformedType`. Parsing never looks at declarations.

use serde_json::Value;

use crate::error::{ParseError, SchemaError};
use crate::raw::{Entries, RawType};
use crate::types::{Field, Primitive, TypeExpr, NULL_MARKER};

/// Path used for a type expression parsed on its own.
pub const ROOT_PATH: &str = "$";

/// Parse a single type expression.
///
/// # Errors
///
/// Returns `ParseError::Malformed` with every malformed subtree found.
pub fn parse_type(value: &Value) -> Result<TypeExpr, ParseError> {
    let mut errors = Vec::new();
    match parse_raw(&RawType::from(value), ROOT_PATH, &mut errors) {
        Some(expr) if errors.is_empty() => Ok(expr),
        _ => Err(ParseError::Malformed { errors }),
    }
}

/// Parse a raw type, pushing every malformed subtree to `errors`.
///
/// Returns `None` if anything under `raw` was malformed.
pub(crate) fn parse_raw(
    raw: &RawType,
    path: &str,
    errors: &mut Vec<SchemaError>,
) -> Option<TypeExpr> {
    match raw {
        RawType::Name(name) => parse_name(name, path, errors),
        RawType::List(items) => match items.as_slice() {
            [] => malformed(path, "empty array is not a type", errors),
            [element] => parse_raw(element, &format!("{}[]", path), errors)
                .map(|element| TypeExpr::Array(Box::new(element))),
            _ => parse_alternatives(items, path, errors),
        },
        RawType::Map(entries) if entries.is_empty() => {
            malformed(path, "empty object is not a type", errors)
        }
        RawType::Map(entries) => parse_fields(entries, path, errors).map(TypeExpr::InlineObject),
        RawType::Other(kind) => malformed(
            path,
            format!("expected type name, array or object, got {}", kind),
            errors,
        ),
    }
}

/// Parse a field mapping, continuing past broken fields.
pub(crate) fn parse_fields(
    entries: &Entries<RawType>,
    path: &str,
    errors: &mut Vec<SchemaError>,
) -> Option<Vec<Field>> {
    let mut fields = Vec::with_capacity(entries.0.len());
    let mut complete = true;

    for (name, raw) in entries.iter() {
        let field_path = format!("{}.{}", path, name);
        match parse_raw(raw, &field_path, errors) {
            Some(ty) => fields.push(Field {
                name: name.to_string(),
                ty,
            }),
            None => complete = false,
        }
    }

    complete.then_some(fields)
}

fn parse_name(name: &str, path: &str, errors: &mut Vec<SchemaError>) -> Option<TypeExpr> {
    if name == NULL_MARKER {
        return malformed(
            path,
            "\"null\" is only valid as an alternative of a union",
            errors,
        );
    }
    if name.trim().is_empty() {
        return malformed(path, "empty type name", errors);
    }

    Some(match Primitive::parse(name) {
        Some(primitive) => TypeExpr::Primitive(primitive),
        None => TypeExpr::Reference(name.to_string()),
    })
}

/// Arrays of two or more items: unions, with `"null"` turning into `Nullable`.
fn parse_alternatives(
    items: &[RawType],
    path: &str,
    errors: &mut Vec<SchemaError>,
) -> Option<TypeExpr> {
    let mut nullable = false;
    let mut complete = true;
    let mut alternatives: Vec<TypeExpr> = Vec::with_capacity(items.len());

    for item in items {
        if item.is_null_marker() {
            nullable = true;
            continue;
        }
        match parse_raw(item, path, errors) {
            Some(TypeExpr::Nullable(inner)) => {
                nullable = true;
                push_flat(*inner, &mut alternatives);
            }
            Some(expr) => push_flat(expr, &mut alternatives),
            None => complete = false,
        }
    }

    if !complete {
        return None;
    }

    for (i, alternative) in alternatives.iter().enumerate() {
        if alternatives[..i].contains(alternative) {
            return malformed(
                path,
                format!("duplicate union alternative {}", alternative),
                errors,
            );
        }
    }

    if alternatives.is_empty() {
        return malformed(path, "union has no alternative besides null", errors);
    }
    if alternatives.len() == 1 && !nullable {
        return malformed(path, "union needs at least 2 distinct alternatives", errors);
    }

    let inner = if alternatives.len() == 1 {
        alternatives.swap_remove(0)
    } else {
        TypeExpr::Union(alternatives)
    };

    Some(if nullable {
        TypeExpr::Nullable(Box::new(inner))
    } else {
        inner
    })
}

fn push_flat(expr: TypeExpr, alternatives: &mut Vec<TypeExpr>) {
    match expr {
        TypeExpr::Union(nested) => alternatives.extend(nested),
        other => alternatives.push(other),
    }
}

fn malformed(
    path: &str,
    reason: impl Into<String>,
    errors: &mut Vec<SchemaError>,
) -> Option<TypeExpr> {
    errors.push(SchemaError::MalformedType {
        path: path.to_string(),
        reason: reason.into(),
    });
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prim(p: Primitive) -> TypeExpr {
        TypeExpr::Primitive(p)
    }

    fn reasons(value: Value) -> Vec<String> {
        match parse_type(&value) {
            Err(ParseError::Malformed { errors }) => errors.iter().map(|e| e.to_string()).collect(),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn string_is_primitive_or_reference() {
        assert_eq!(parse_type(&json!("int")).unwrap(), prim(Primitive::Integer));
        assert_eq!(parse_type(&json!("uuid")).unwrap(), prim(Primitive::Uuid));
        assert_eq!(
            parse_type(&json!("TypeEnum")).unwrap(),
            TypeExpr::Reference("TypeEnum".into())
        );
    }

    #[test]
    fn single_element_array_is_array() {
        assert_eq!(
            parse_type(&json!(["Child"])).unwrap(),
            TypeExpr::Array(Box::new(TypeExpr::Reference("Child".into())))
        );
    }

    #[test]
    fn nested_single_element_arrays() {
        assert_eq!(
            parse_type(&json!([["int"]])).unwrap(),
            TypeExpr::Array(Box::new(TypeExpr::Array(Box::new(prim(Primitive::Integer)))))
        );
    }

    #[test]
    fn null_first_is_still_nullable() {
        assert_eq!(
            parse_type(&json!(["null", "string"])).unwrap(),
            TypeExpr::Nullable(Box::new(prim(Primitive::String)))
        );
    }

    #[test]
    fn null_in_longer_union() {
        assert_eq!(
            parse_type(&json!(["int", "string", "null"])).unwrap(),
            TypeExpr::Nullable(Box::new(TypeExpr::Union(vec![
                prim(Primitive::Integer),
                prim(Primitive::String),
            ])))
        );
    }

    #[test]
    fn nullable_alternative_is_hoisted() {
        assert_eq!(
            parse_type(&json!(["string", ["int", "null"]])).unwrap(),
            TypeExpr::Nullable(Box::new(TypeExpr::Union(vec![
                prim(Primitive::String),
                prim(Primitive::Integer),
            ])))
        );
    }

    #[test]
    fn double_nullable_collapses() {
        assert_eq!(
            parse_type(&json!([["date", "null"], "null"])).unwrap(),
            TypeExpr::Nullable(Box::new(prim(Primitive::Date)))
        );
    }

    #[test]
    fn union_may_hold_arrays_and_objects() {
        assert_eq!(
            parse_type(&json!([["int"], {"x": "float"}])).unwrap(),
            TypeExpr::Union(vec![
                TypeExpr::Array(Box::new(prim(Primitive::Integer))),
                TypeExpr::InlineObject(vec![Field {
                    name: "x".into(),
                    ty: prim(Primitive::Float),
                }]),
            ])
        );
    }

    #[test]
    fn inline_object_keeps_order() {
        let expr = parse_type(&json!({"z": "int", "a": ["string", "null"], "m": "Child"})).unwrap();
        let TypeExpr::InlineObject(fields) = expr else {
            panic!("expected inline object");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn scalars_are_malformed() {
        assert_eq!(reasons(json!(4)).len(), 1);
        assert_eq!(reasons(json!(true)).len(), 1);
        assert_eq!(reasons(json!(null)).len(), 1);
    }

    #[test]
    fn empty_shapes_are_malformed() {
        assert!(reasons(json!([]))[0].contains("empty array"));
        assert!(reasons(json!({}))[0].contains("empty object"));
        assert!(reasons(json!(""))[0].contains("empty type name"));
    }

    #[test]
    fn bare_null_is_malformed() {
        assert_eq!(
            reasons(json!("null")),
            vec!["$: malformed type: \"null\" is only valid as an alternative of a union"]
        );
        assert_eq!(reasons(json!(["null"])).len(), 1);
        assert_eq!(reasons(json!(["null", "null"])).len(), 1);
    }

    #[test]
    fn duplicate_alternatives_are_malformed() {
        assert!(reasons(json!(["int", "int"]))[0].contains("duplicate union alternative"));
        assert!(reasons(json!(["int", ["string", "int"]]))[0].contains("duplicate"));
    }

    #[test]
    fn every_broken_subtree_is_reported() {
        let errors = reasons(json!({"a": 1, "b": {"c": []}, "d": "int", "e": [false, "int"]}));
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("$.a:"));
        assert!(errors[1].starts_with("$.b.c:"));
        assert!(errors[2].starts_with("$.e:"));
    }

    #[test]
    fn array_element_path() {
        let errors = reasons(json!([{"x": 3}]));
        assert!(errors[0].starts_with("$[].x:"));
    }
}
