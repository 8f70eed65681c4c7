/// HTTP plumbing for the backend: requests, responses and the fetch transport
use crate::error::{Error, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RestRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx response, otherwise a backend error with a readable message
    pub fn into_result(self) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(Error::Backend {
                status: self.status,
                message: error_message(&self.body),
            })
        }
    }
}

/// Pull the human-readable part out of a backend error body.
///
/// The data API answers `{"message": ...}`, the auth API uses
/// `error_description`, `msg` or `error` depending on the endpoint.
pub fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|value| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: RestRequest) -> Result<RestResponse>;
}

/// Transport over `reqwest`, which drives the browser's `fetch` on wasm32
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    client: reqwest::Client,
}

impl FetchTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for FetchTransport {
    async fn send(&self, request: RestRequest) -> Result<RestResponse> {
        log::debug!("{} {}", request.method.as_str(), request.url);

        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RestResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_success() {
        let response = RestResponse {
            status: 201,
            body: "[]".to_string(),
        };
        assert_eq!(response.into_result(), Ok("[]".to_string()));
    }

    #[test]
    fn test_into_result_postgrest_error() {
        let response = RestResponse {
            status: 409,
            body: r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#
                .to_string(),
        };

        assert_eq!(
            response.into_result(),
            Err(Error::Backend {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            })
        );
    }

    #[test]
    fn test_error_message_auth_shapes() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"code":422,"msg":"Password too short"}"#), "Password too short");
    }

    #[test]
    fn test_error_message_plain_body() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response");
        assert_eq!(error_message(r#"{"unexpected":true}"#), r#"{"unexpected":true}"#);
    }

    #[test]
    fn test_method_maps_to_http_verb() {
        for method in [Method::Get, Method::Post, Method::Patch, Method::Delete] {
            assert_eq!(reqwest::Method::from(method).as_str(), method.as_str());
        }
    }

    #[test]
    fn test_fetch_transport_rejects_malformed_url() {
        let request = RestRequest {
            method: Method::Get,
            url: "not a url".to_string(),
            headers: vec![("apikey".to_string(), "anon".to_string())],
            body: None,
        };

        let result = futures::executor::block_on(FetchTransport::default().send(request));

        assert!(matches!(result, Err(Error::Network(_))), "got {:?}", result);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = RestRequest {
            method: Method::Get,
            url: "https://x".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: None,
        };

        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.header("apikey"), None);
    }
}
