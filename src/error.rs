/// Error types for RelationHub
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Non-2xx response from the hosted backend
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// A browser or extension API threw or rejected
    #[error("browser API error: {0}")]
    Js(String),

    /// The request never produced a response (DNS, CORS, bad URL)
    #[error("network error: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// User input rejected before any backend call
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("contact already exists: {0}")]
    DuplicateContact(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("no active tab")]
    NoActiveTab,

    #[error("timed out after {0} ms")]
    Timeout(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<JsValue> for Error {
    fn from(value: JsValue) -> Self {
        // Prefer the message of a thrown `Error` over its debug form
        match value.dyn_ref::<js_sys::Error>() {
            Some(err) => Error::Js(String::from(err.message())),
            None => Error::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value))),
        }
    }
}

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = Error::Backend {
            status: 409,
            message: "duplicate key value".to_string(),
        };

        assert_eq!(err.to_string(), "backend error (409): duplicate key value");
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let err: Error = parse.unwrap_err().into();

        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(err.to_string().starts_with("configuration error: invalid URL"));
    }
}
