//! Typed outputs read back from an applied stack.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

/// Names of the stack outputs the pipeline reads.
pub mod names {
    pub const API_ENDPOINT: &str = "api_endpoint";
    pub const FRONTEND_BUCKET: &str = "frontend_bucket";
    pub const CDN_URL: &str = "cdn_url";
    pub const CUSTOM_DOMAIN_URL: &str = "custom_domain_url";
    pub const CDN_DISTRIBUTION_ID: &str = "cdn_distribution_id";
}

/// Values read back from the applied stack.
///
/// Produced once per run and read-only afterward. The custom domain and
/// distribution id may legitimately be absent; the rest are required.
#[derive(Debug, Clone)]
pub struct StackOutputs {
    pub api_endpoint: Url,
    pub frontend_bucket: String,
    pub cdn_url: Url,
    pub custom_domain_url: Option<Url>,
    pub cdn_distribution_id: Option<String>,
}

/// Failure to read outputs back from a reported-successful apply.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("required stack output missing: {0}")]
    Missing(&'static str),

    #[error("stack output {name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("stack output {0} is not a string")]
    NotAString(&'static str),
}

impl StackOutputs {
    /// Extract typed outputs from the raw output value map.
    ///
    /// The three required outputs must be present; an absent custom domain
    /// means the feature is not enabled and is not an error.
    pub fn from_values(values: &HashMap<String, Value>) -> Result<Self, OutputError> {
        Ok(Self {
            api_endpoint: required_url(values, names::API_ENDPOINT)?,
            frontend_bucket: required_str(values, names::FRONTEND_BUCKET)?.to_string(),
            cdn_url: required_url(values, names::CDN_URL)?,
            custom_domain_url: optional_url(values, names::CUSTOM_DOMAIN_URL)?,
            cdn_distribution_id: optional_str(values, names::CDN_DISTRIBUTION_ID)?
                .map(str::to_string),
        })
    }
}

fn required_str<'a>(
    values: &'a HashMap<String, Value>,
    name: &'static str,
) -> Result<&'a str, OutputError> {
    match values.get(name) {
        None | Some(Value::Null) => Err(OutputError::Missing(name)),
        Some(value) => value.as_str().ok_or(OutputError::NotAString(name)),
    }
}

fn optional_str<'a>(
    values: &'a HashMap<String, Value>,
    name: &'static str,
) -> Result<Option<&'a str>, OutputError> {
    match values.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or(OutputError::NotAString(name)),
    }
}

fn required_url(
    values: &HashMap<String, Value>,
    name: &'static str,
) -> Result<Url, OutputError> {
    let raw = required_str(values, name)?;
    Url::parse(raw).map_err(|_| OutputError::InvalidUrl {
        name,
        value: raw.to_string(),
    })
}

fn optional_url(
    values: &HashMap<String, Value>,
    name: &'static str,
) -> Result<Option<Url>, OutputError> {
    match optional_str(values, name)? {
        None => Ok(None),
        Some(raw) => Url::parse(raw)
            .map(Some)
            .map_err(|_| OutputError::InvalidUrl {
                name,
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_values() -> HashMap<String, Value> {
        HashMap::from([
            (
                names::API_ENDPOINT.to_string(),
                json!("https://api.example.com/v1"),
            ),
            (
                names::FRONTEND_BUCKET.to_string(),
                json!("chattis-frontend-dev"),
            ),
            (names::CDN_URL.to_string(), json!("https://d123.cdn.example.net")),
            (
                names::CUSTOM_DOMAIN_URL.to_string(),
                json!("https://chat.example.com"),
            ),
            (names::CDN_DISTRIBUTION_ID.to_string(), json!("E2ABCDEF")),
        ])
    }

    #[test]
    fn extracts_all_outputs() {
        let outputs = StackOutputs::from_values(&full_values()).unwrap();
        assert_eq!(outputs.api_endpoint.as_str(), "https://api.example.com/v1");
        assert_eq!(outputs.frontend_bucket, "chattis-frontend-dev");
        assert_eq!(
            outputs.custom_domain_url.unwrap().as_str(),
            "https://chat.example.com/"
        );
        assert_eq!(outputs.cdn_distribution_id.as_deref(), Some("E2ABCDEF"));
    }

    #[test]
    fn missing_required_output_is_an_error() {
        let mut values = full_values();
        values.remove(names::CDN_URL);
        let err = StackOutputs::from_values(&values).unwrap_err();
        assert!(matches!(err, OutputError::Missing(name) if name == names::CDN_URL));
    }

    #[test]
    fn absent_custom_domain_is_not_an_error() {
        let mut values = full_values();
        values.remove(names::CUSTOM_DOMAIN_URL);
        let outputs = StackOutputs::from_values(&values).unwrap();
        assert!(outputs.custom_domain_url.is_none());
    }

    #[test]
    fn null_custom_domain_is_treated_as_absent() {
        let mut values = full_values();
        values.insert(names::CUSTOM_DOMAIN_URL.to_string(), Value::Null);
        let outputs = StackOutputs::from_values(&values).unwrap();
        assert!(outputs.custom_domain_url.is_none());
    }

    #[test]
    fn malformed_endpoint_is_an_error() {
        let mut values = full_values();
        values.insert(names::API_ENDPOINT.to_string(), json!("not a url"));
        assert!(matches!(
            StackOutputs::from_values(&values),
            Err(OutputError::InvalidUrl { .. })
        ));
    }
}
