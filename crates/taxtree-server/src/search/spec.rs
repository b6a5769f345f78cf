//! Sparse search requests
//!
//! GET endpoints build a [`SearchSpec`] from query parameters, POST endpoints
//! from a JSON object. In both, an absent or null value means "no predicate".

use serde_json::Value;
use std::collections::BTreeMap;

use super::SearchError;

const LIMIT_PARAM: &str = "limit";
const OFFSET_PARAM: &str = "offset";

/// One bound or one value as supplied by the client
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchValue {
    Scalar(Scalar),
    /// Ordered `[lower, upper]` pair
    Range(Scalar, Scalar),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSpec {
    pub fields: BTreeMap<String, SearchValue>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchSpec {
    /// Build from URL query parameters. Empty values are treated as absent.
    /// Every value is text here; the compiler coerces it per field type.
    pub fn from_query_params<I>(params: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut spec = SearchSpec::default();

        for (name, value) in params {
            if value.is_empty() {
                continue;
            }
            match name.as_str() {
                LIMIT_PARAM => spec.limit = Some(parse_bound(LIMIT_PARAM, &value)?),
                OFFSET_PARAM => spec.offset = Some(parse_bound(OFFSET_PARAM, &value)?),
                _ => {
                    spec.fields.insert(name, SearchValue::Scalar(Scalar::Text(value)));
                },
            }
        }

        Ok(spec)
    }

    /// Build from a JSON object body. A two-element array is a range.
    pub fn from_json(body: Value) -> Result<Self, SearchError> {
        let Value::Object(map) = body else {
            return Err(SearchError::NotAnObject);
        };

        let mut spec = SearchSpec::default();

        for (name, value) in map {
            if value.is_null() {
                continue;
            }
            match name.as_str() {
                LIMIT_PARAM => spec.limit = Some(json_bound(LIMIT_PARAM, &value)?),
                OFFSET_PARAM => spec.offset = Some(json_bound(OFFSET_PARAM, &value)?),
                _ => {
                    let parsed = json_value(&name, value)?;
                    spec.fields.insert(name, parsed);
                },
            }
        }

        Ok(spec)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: SearchValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

fn parse_bound(name: &str, value: &str) -> Result<i64, SearchError> {
    value.trim().parse().map_err(|_| SearchError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn json_bound(name: &str, value: &Value) -> Result<i64, SearchError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| SearchError::InvalidParameter {
            name: name.to_string(),
            value: n.to_string(),
        }),
        Value::String(s) => parse_bound(name, s),
        other => Err(SearchError::InvalidParameter {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

fn json_value(field: &str, value: Value) -> Result<SearchValue, SearchError> {
    match value {
        Value::Array(items) => {
            let [lower, upper]: [Value; 2] =
                items
                    .try_into()
                    .map_err(|_| SearchError::MalformedRange {
                        field: field.to_string(),
                    })?;
            match (json_scalar(field, lower)?, json_scalar(field, upper)?) {
                (Some(lower), Some(upper)) => Ok(SearchValue::Range(lower, upper)),
                _ => Err(SearchError::MalformedRange {
                    field: field.to_string(),
                }),
            }
        },
        other => json_scalar(field, other)?
            .map(SearchValue::Scalar)
            .ok_or_else(|| SearchError::UnsupportedValue {
                field: field.to_string(),
                reason: "null".to_string(),
            }),
    }
}

fn json_scalar(field: &str, value: Value) -> Result<Option<Scalar>, SearchError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(Scalar::Text(s))),
        Value::Number(n) => Ok(Some(Scalar::Number(n))),
        Value::Bool(b) => Ok(Some(Scalar::Bool(b))),
        Value::Array(_) | Value::Object(_) => Err(SearchError::UnsupportedValue {
            field: field.to_string(),
            reason: "nested arrays and objects are not supported".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_query_params() {
        let spec = SearchSpec::from_query_params(params(&[
            ("name_txt", "Homo*"),
            ("rank", ""),
            ("limit", "5"),
            ("offset", "10"),
        ]))
        .unwrap();

        assert_eq!(spec.limit, Some(5));
        assert_eq!(spec.offset, Some(10));
        assert_eq!(spec.fields.len(), 1);
        assert_eq!(
            spec.fields["name_txt"],
            SearchValue::Scalar(Scalar::Text("Homo*".to_string()))
        );
    }

    #[test]
    fn test_query_param_bounds_must_be_integers() {
        let err = SearchSpec::from_query_params(params(&[("limit", "ten")])).unwrap_err();
        assert!(matches!(err, SearchError::InvalidParameter { .. }));
    }

    #[test]
    fn test_from_json() {
        let spec = SearchSpec::from_json(json!({
            "is_leaf": true,
            "depth": 3,
            "comments": null,
            "source_version": ["2024-01-01", "2024-06-30"],
            "limit": 2
        }))
        .unwrap();

        assert_eq!(spec.limit, Some(2));
        assert_eq!(spec.offset, None);
        assert!(!spec.fields.contains_key("comments"));
        assert_eq!(spec.fields["is_leaf"], SearchValue::Scalar(Scalar::Bool(true)));
        assert_eq!(
            spec.fields["source_version"],
            SearchValue::Range(
                Scalar::Text("2024-01-01".to_string()),
                Scalar::Text("2024-06-30".to_string())
            )
        );
    }

    #[test]
    fn test_json_rejects_bad_shapes() {
        assert_eq!(SearchSpec::from_json(json!([1, 2])), Err(SearchError::NotAnObject));
        assert!(matches!(
            SearchSpec::from_json(json!({"started_at": ["2024-01-01"]})),
            Err(SearchError::MalformedRange { .. })
        ));
        assert!(matches!(
            SearchSpec::from_json(json!({"started_at": ["2024-01-01", null]})),
            Err(SearchError::MalformedRange { .. })
        ));
        assert!(matches!(
            SearchSpec::from_json(json!({"rank": {"eq": "species"}})),
            Err(SearchError::UnsupportedValue { .. })
        ));
    }
}
