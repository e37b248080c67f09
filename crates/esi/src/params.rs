//! Request parameters and content negotiation.

use std::collections::HashMap;

use axum::extract::{FromRequest, Query, Request};
use axum::http::{HeaderMap, header};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::ApiError;

/// Parameters of a request.
///
/// Holds the query string, the raw body, and the body fields when it was
/// sent as JSON or as a urlencoded form. Lookups check the query string
/// first and then the top-level fields of the body. An empty query value
/// does not hide a body field of the same name.
#[derive(Debug, Default)]
pub struct Params {
    query: HashMap<String, String>,
    body: Option<Value>,
    raw: Bytes,
    json: bool,
}

impl Params {
    /// String value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .or_else(|| self.body_field(key).and_then(Value::as_str))
    }

    /// A structured body field. A field that does not have the expected
    /// shape is ignored.
    #[must_use]
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.body_field(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(field) => Some(field),
            Err(error) => {
                warn!(key, %error, "Ignoring malformed body field");
                None
            }
        }
    }

    /// Names of every parameter present, for logging.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.query.keys().map(String::as_str).collect();
        if let Some(Value::Object(fields)) = &self.body {
            names.extend(fields.keys().map(String::as_str));
        }
        names
    }

    /// Whether the body was sent as JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// The body exactly as received.
    #[must_use]
    pub const fn raw(&self) -> &Bytes {
        &self.raw
    }

    fn body_field(&self, key: &str) -> Option<&Value> {
        self.body.as_ref()?.get(key)
    }
}

impl<S> FromRequest<S> for Params
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map(|Query(query)| query)
            .map_err(|rejection| ApiError::InvalidContent(rejection.body_text()))?;
        let json = is_json(req.headers());
        let form = is_form(req.headers());
        let raw = Bytes::from_request(req, state).await?;

        let body = if raw.is_empty() {
            None
        } else if json {
            let value = serde_json::from_slice(&raw).map_err(|error| {
                warn!(%error, "Rejecting malformed JSON body");
                ApiError::InvalidContent(format!("invalid JSON body: {error}"))
            })?;
            Some(value)
        } else if form {
            Some(form_fields(&raw)?)
        } else {
            None
        };

        Ok(Self {
            query,
            body,
            raw,
            json,
        })
    }
}

/// Whether the content type names JSON (`application/json` or a `+json`
/// subtype).
fn is_json(headers: &HeaderMap) -> bool {
    mime_type(headers).is_some_and(|mime| {
        mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    })
}

fn is_form(headers: &HeaderMap) -> bool {
    mime_type(headers).is_some_and(|mime| mime == "application/x-www-form-urlencoded")
}

fn mime_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
}

/// Decode a urlencoded form into a JSON object of string fields.
fn form_fields(raw: &[u8]) -> Result<Value, ApiError> {
    let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw).map_err(|error| {
        warn!(%error, "Rejecting malformed form body");
        ApiError::InvalidContent(format!("invalid form body: {error}"))
    })?;

    Ok(Value::Object(
        pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    ))
}

/// Whether the client accepts a JSON response.
///
/// A request without an `Accept` header accepts anything. Ranges with
/// `q=0` are refusals.
#[must_use]
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let mut values = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .peekable();
    if values.peek().is_none() {
        return true;
    }

    values.flat_map(|value| value.split(',')).any(|range| {
        let mut parts = range.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let refused = parts
            .filter_map(|param| param.trim().strip_prefix("q="))
            .any(|q| q.trim().parse::<f32>().is_ok_and(|q| q <= 0.0));

        !refused
            && (matches!(mime.as_str(), "*/*" | "application/*" | "application/json")
                || mime.ends_with("+json"))
    })
}
