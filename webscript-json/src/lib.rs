// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Chris Campbell <c.campbell@mwam.com> https://github.com/c-campbell-mwam
use std::{convert::TryFrom, str::FromStr};

use serde_json::{Map, Value};
use webscript::{BigDecimal, BigInt, Keyword, Term};

pub mod stdlib;

pub use serde_json::{json, Map as JsonMap, Number as JsonNumber, Value as JsonValue};

pub fn json_array(items: impl IntoIterator<Item = JsonValue>) -> JsonValue {
    JsonValue::Array(items.into_iter().collect())
}

pub fn parse(input: &str) -> Result<Term, String> {
    deserialize(input).and_then(hydrate)
}

pub fn stringify(value: &Term) -> Result<String, String> {
    sanitize(value)
        .and_then(|value| serde_json::to_string(&value).map_err(|err| format!("{}", err)))
        .map_err(|err| format!("JSON serialization failed: {}", err))
}

pub fn deserialize(value: &str) -> Result<JsonValue, String> {
    serde_json::from_str(value).map_err(|err| format!("JSON deserialization failed: {}", err))
}

/// Convert a constant term into its JSON equivalent.
///
/// Keywords are written as their qualified name without the leading colon. Integers that do not
/// fit into a JSON number are written as strings.
pub fn sanitize(value: &Term) -> Result<JsonValue, String> {
    match value {
        Term::Nil => Ok(Value::Null),
        Term::Boolean(value) => Ok(Value::Bool(*value)),
        Term::Integer(value) => Ok(match i64::try_from(value) {
            Ok(value) => Value::from(value),
            Err(_) => Value::String(format!("{}", value)),
        }),
        Term::Decimal(value) => f64::from_str(&format!("{}", value))
            .ok()
            .and_then(JsonNumber::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("Unable to serialize decimal: {}", value)),
        Term::Character(value) => Ok(Value::String(value.to_string())),
        Term::String(value) => Ok(Value::String(value.clone())),
        Term::Keyword(value) => Ok(Value::String(value.qualified_name())),
        Term::Error(error) => Ok(json!({
            "error": {
                "code": error.code(),
                "message": error.message(),
            }
        })),
        Term::List(items) => items
            .iter()
            .map(sanitize)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Term::Set(items) => items
            .iter()
            .map(sanitize)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Term::Map(entries) => entries
            .iter()
            .map(|(key, value)| Ok((sanitize_key(key)?, sanitize(value)?)))
            .collect::<Result<Map<_, _>, String>>()
            .map(Value::Object),
        Term::Symbol(_) | Term::Application(_) => {
            Err(format!("Unable to serialize term: {}", value))
        }
    }
}

fn sanitize_key(key: &Term) -> Result<String, String> {
    match key {
        Term::String(value) => Ok(value.clone()),
        Term::Keyword(value) => Ok(value.qualified_name()),
        Term::Integer(value) => Ok(format!("{}", value)),
        _ => Err(format!("Unable to serialize map key: {}", key)),
    }
}

/// Convert a JSON value into a term. Object keys become keywords.
pub fn hydrate(value: Value) -> Result<Term, String> {
    match value {
        Value::Null => Ok(Term::Nil),
        Value::Bool(value) => Ok(Term::Boolean(value)),
        Value::String(value) => Ok(Term::String(value)),
        Value::Number(value) => match value.as_i64() {
            Some(value) => Ok(Term::Integer(BigInt::from(value))),
            None => match value.as_u64() {
                Some(value) => Ok(Term::Integer(BigInt::from(value))),
                None => BigDecimal::from_str(&format!("{}", value))
                    .map(Term::Decimal)
                    .map_err(|_| {
                        format!("JSON deserialization encountered invalid number: {}", value)
                    }),
            },
        },
        Value::Array(value) => hydrate_array(value),
        Value::Object(value) => hydrate_object(value),
    }
}

fn hydrate_array(value: Vec<Value>) -> Result<Term, String> {
    let items = value
        .into_iter()
        .map(hydrate)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Term::list(items))
}

fn hydrate_object(value: Map<String, Value>) -> Result<Term, String> {
    let entries = value
        .into_iter()
        .map(|(key, value)| {
            hydrate(value).map(|value| (Term::Keyword(Keyword::parse(&key)), value))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Term::Map(entries.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use webscript::{Symbol, Term};

    use super::{hydrate, parse, sanitize, stringify, JsonValue};

    #[test]
    fn stringify_primitives() {
        assert_eq!(
            stringify(&Term::symbol("foo")),
            Err(String::from(
                "JSON serialization failed: Unable to serialize term: foo"
            )),
        );
        assert_eq!(stringify(&Term::nil()), Ok(String::from("null")));
        assert_eq!(stringify(&Term::boolean(false)), Ok(String::from("false")));
        assert_eq!(stringify(&Term::integer(-3)), Ok(String::from("-3")));
        assert_eq!(
            stringify(&webscript_edn::parse("3.142M").unwrap()),
            Ok(String::from("3.142"))
        );
        assert_eq!(
            stringify(&webscript_edn::parse("123456789012345678901234567890").unwrap()),
            Ok(String::from("\"123456789012345678901234567890\""))
        );
        assert_eq!(
            stringify(&Term::string("\"'\n\r")),
            Ok(String::from("\"\\\"'\\n\\r\"")),
        );
        assert_eq!(stringify(&Term::keyword("foo/bar")), Ok(String::from("\"foo/bar\"")));
    }

    #[test]
    fn stringify_collections() {
        assert_eq!(stringify(&Term::list([])), Ok(String::from("[]")));
        assert_eq!(
            stringify(&Term::list([Term::integer(3), Term::integer(4)])),
            Ok(String::from("[3,4]")),
        );
        assert_eq!(
            stringify(&Term::keyword_map([
                ("first", Term::integer(3)),
                ("second", Term::string("foo")),
            ])),
            Ok(String::from("{\"first\":3,\"second\":\"foo\"}")),
        );
        assert_eq!(
            stringify(&Term::list([Term::application(
                Symbol::parse("sys/list"),
                []
            )])),
            Err(String::from(
                "JSON serialization failed: Unable to serialize term: (sys/list)"
            )),
        );
    }

    #[test]
    fn sanitize_errors() {
        assert_eq!(
            sanitize(&Term::error("HttpError", "Not Found")),
            Ok(serde_json::json!({ "error": { "code": "HttpError", "message": "Not Found" } }))
        );
    }

    #[test]
    fn parse_values() {
        assert_eq!(parse("null"), Ok(Term::nil()));
        assert_eq!(parse("3"), Ok(Term::integer(3)));
        assert_eq!(
            parse("1.5"),
            Ok(webscript_edn::parse("1.5M").unwrap())
        );
        assert_eq!(
            parse("{\"url\": \"http://example.com\", \"tags\": [\"a\", true]}"),
            Ok(Term::keyword_map([
                ("url", Term::string("http://example.com")),
                (
                    "tags",
                    Term::list([Term::string("a"), Term::boolean(true)])
                ),
            ]))
        );
        assert!(parse("{").is_err());
        assert_eq!(hydrate(JsonValue::Bool(true)), Ok(Term::boolean(true)));
    }
}
