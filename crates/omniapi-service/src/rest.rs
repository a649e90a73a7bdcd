//! Resource-style (OpenAPI / Swagger) request shaping.
//!
//! REST clients send a compact `name` such as `"Buddy (Beagle)"`: the text
//! before `" ("` is the primary name and the text inside the trailing
//! parentheses is the kind's secondary attribute (breed, species, ...).

use serde_json::Value;

use crate::error::ServiceError;
use crate::store::Fields;
use crate::types::EntityKind;

/// Splits a compact name into its primary and optional secondary part.
///
/// Without a well-formed trailing `" (...)"` group the whole string is the
/// primary name.
pub fn split_compact_name(raw: &str) -> (&str, Option<&str>) {
    if let Some(inner) = raw.strip_suffix(')')
        && let Some(idx) = inner.rfind(" (")
    {
        return (&inner[..idx], Some(&inner[idx + 2..]));
    }
    (raw, None)
}

/// Converts a REST request body into store fields for `kind`.
///
/// A string `name` is expanded through the compact-name convention onto
/// the kind's name and secondary fields. Explicit secondary fields in the
/// body win over the parenthesised value.
pub fn body_to_fields(kind: EntityKind, body: Value) -> Result<Fields, ServiceError> {
    let Value::Object(mut fields) = body else {
        return Err(ServiceError::bad_request("request body must be a JSON object"));
    };

    match fields.remove("name") {
        None => {}
        Some(Value::String(raw)) => {
            let (primary, secondary) = split_compact_name(&raw);
            let secondary_field = kind.secondary_field();
            if let Some(secondary) = secondary
                && !fields.contains_key(secondary_field)
            {
                fields.insert(secondary_field.to_owned(), Value::String(secondary.to_owned()));
            }
            fields.insert(kind.name_field().to_owned(), Value::String(primary.to_owned()));
        }
        Some(_) => return Err(ServiceError::bad_request("'name' must be a string")),
    }

    Ok(fields)
}

/// Parses an optional `limit` query value.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, ServiceError> {
    raw.map(|s| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| ServiceError::bad_request(format!("invalid limit '{s}'")))
    })
    .transpose()
}
