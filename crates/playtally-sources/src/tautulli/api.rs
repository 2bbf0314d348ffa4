use crate::error::SourceError;
use crate::traits::TautulliApi;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

const API_PATH: &str = "/api/v2";

/// reqwest backed client for the Tautulli v2 command API
pub struct TautulliHttpClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl TautulliHttpClient {
    pub fn with_timeout(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        let endpoint = endpoint_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|source| SourceError::Transport {
                command: "client setup".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TautulliApi for TautulliHttpClient {
    async fn call(&self, command: &str, params: &[(&str, Option<String>)]) -> Result<Value, SourceError> {
        let mut query: Vec<(&str, &str)> = vec![("apikey", self.api_key.as_str()), ("cmd", command)];
        query.extend(
            params
                .iter()
                .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v))),
        );

        debug!(command, params = ?params, "Tautulli request");

        let transport = |source: reqwest::Error| SourceError::Transport {
            command: command.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;

        let json: Value = response.json().await.map_err(transport)?;
        trace!(command, "Tautulli response: {}", json);

        unwrap_envelope(command, json)
    }
}

/// `<base>/api/v2`, tolerating a trailing slash on the base
fn endpoint_url(base_url: &str) -> Result<Url, SourceError> {
    let joined = format!("{}{}", base_url.trim().trim_end_matches('/'), API_PATH);
    Url::parse(&joined).map_err(|e| SourceError::InvalidUrl {
        url: base_url.to_string(),
        detail: e.to_string(),
    })
}

/// Check `response.result` and return `response.data`
pub fn unwrap_envelope(command: &str, json: Value) -> Result<Value, SourceError> {
    let Value::Object(mut root) = json else {
        return Err(SourceError::decode(command, "response is not a JSON object"));
    };
    let Some(Value::Object(mut response)) = root.remove("response") else {
        return Err(SourceError::decode(command, "missing 'response' object"));
    };

    let result = response
        .get("result")
        .and_then(|r| r.as_str())
        .unwrap_or("")
        .to_string();
    if result != "success" {
        let message = response
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message")
            .to_string();
        return Err(SourceError::Api {
            command: command.to_string(),
            result,
            message,
        });
    }

    Ok(response.remove("data").unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        let url = endpoint_url("http://tautulli.local:8181/").unwrap();
        assert_eq!(url.as_str(), "http://tautulli.local:8181/api/v2");

        let url = endpoint_url("https://example.com/tautulli").unwrap();
        assert_eq!(url.as_str(), "https://example.com/tautulli/api/v2");
    }

    #[test]
    fn test_endpoint_url_rejects_garbage() {
        assert!(matches!(
            endpoint_url("not a url"),
            Err(SourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let data = unwrap_envelope(
            "get_users",
            json!({"response": {"result": "success", "message": null, "data": [{"user_id": 1}]}}),
        )
        .unwrap();
        assert_eq!(data, json!([{"user_id": 1}]));
    }

    #[test]
    fn test_unwrap_envelope_error_result() {
        let err = unwrap_envelope(
            "get_history",
            json!({"response": {"result": "error", "message": "Invalid apikey", "data": {}}}),
        )
        .unwrap_err();
        match err {
            SourceError::Api { command, result, message } => {
                assert_eq!(command, "get_history");
                assert_eq!(result, "error");
                assert_eq!(message, "Invalid apikey");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwrap_envelope_missing_response() {
        let err = unwrap_envelope("get_users", json!({"data": []})).unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));

        let err = unwrap_envelope("get_users", json!({"response": {"data": []}})).unwrap_err();
        assert!(matches!(err, SourceError::Api { .. }));
    }

    fn client(server: &mockito::ServerGuard) -> TautulliHttpClient {
        TautulliHttpClient::with_timeout(&server.url(), "secret".to_string(), Duration::from_secs(5)).unwrap()
    }

    fn envelope(result: &str, data: Value) -> String {
        json!({"response": {"result": result, "message": "Invalid apikey", "data": data}}).to_string()
    }

    #[tokio::test]
    async fn test_call_sends_key_command_and_set_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2")
            .match_query(Matcher::Exact("apikey=secret&cmd=get_history&user_id=42&start=0".to_string()))
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope("success", json!({"data": [{"rating_key": 1}]})))
            .create_async()
            .await;

        let data = client(&server)
            .call(
                "get_history",
                &[
                    ("user_id", Some("42".to_string())),
                    ("media_type", None),
                    ("start", Some("0".to_string())),
                ],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data, json!({"data": [{"rating_key": 1}]}));
    }

    #[tokio::test]
    async fn test_call_error_status_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client(&server).call("get_users", &[]).await.unwrap_err();
        match err {
            SourceError::Transport { command, source } => {
                assert_eq!(command, "get_users");
                assert_eq!(source.status().map(|s| s.as_u16()), Some(500));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_call_failed_envelope_with_ok_status_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope("error", json!({})))
            .create_async()
            .await;

        let err = client(&server).call("get_user_names", &[]).await.unwrap_err();
        match err {
            SourceError::Api { command, result, message } => {
                assert_eq!(command, "get_user_names");
                assert_eq!(result, "error");
                assert_eq!(message, "Invalid apikey");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
