use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{FetchError, UNKNOWN_ERROR},
    location::Location,
    model::AirQualityReading,
};

use super::AirQualityProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.waqi.info";

/// Client for the World Air Quality Index `feed` endpoint.
#[derive(Debug, Clone)]
pub struct WaqiProvider {
    base_url: String,
    http: Client,
}

impl Default for WaqiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WaqiProvider {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the client at another deployment of the API (proxy, mirror).
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        parse_base(base_url)?;

        Ok(Self {
            base_url: base_url.to_string(),
            http: Client::new(),
        })
    }

    /// `<base>/feed/<slug>/?token=<token>`
    ///
    /// The token travels in the query string; the API offers no header
    /// alternative, so the URL must never be logged.
    pub fn feed_url(&self, location: &Location, token: &str) -> Result<Url, FetchError> {
        let mut url = parse_base(&self.base_url)?;

        url.path_segments_mut()
            .map_err(|()| invalid_endpoint(&self.base_url, "URL cannot have a path"))?
            .pop_if_empty()
            .push("feed")
            .extend(location.path_segments())
            .push("");

        url.query_pairs_mut().append_pair("token", token);

        Ok(url)
    }
}

#[async_trait]
impl AirQualityProvider for WaqiProvider {
    #[tracing::instrument(name = "waqi_fetch", level = "debug", skip(self, token))]
    async fn fetch(
        &self,
        location: &Location,
        token: &str,
    ) -> Result<AirQualityReading, FetchError> {
        let url = self.feed_url(location, token)?;
        debug!(base_url = %self.base_url, "requesting air quality feed");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        parse_feed_response(status.as_u16(), &body)
    }
}

/// Validate a raw `feed` response and extract its payload.
///
/// Checked in order: HTTP 200, envelope `status == "ok"`, payload
/// `data.status != "error"`.
pub fn parse_feed_response(status: u16, body: &str) -> Result<AirQualityReading, FetchError> {
    if status != StatusCode::OK.as_u16() {
        let message = serde_json::from_str::<Value>(body)
            .map(|envelope| error_message(&envelope))
            .unwrap_or_else(|_| UNKNOWN_ERROR.to_string());

        warn!(status, body = %truncate_body(body), "air quality API returned non-200 status");
        return Err(FetchError::Status { status, message });
    }

    let mut envelope: Value = serde_json::from_str(body)?;

    let envelope_ok = envelope.get("status").and_then(Value::as_str) == Some("ok");
    let payload_failed = envelope.pointer("/data/status").and_then(Value::as_str) == Some("error");

    if !envelope_ok || payload_failed {
        let message = error_message(&envelope);
        warn!(%message, "air quality API reported an error");
        return Err(FetchError::Api { message });
    }

    let data = envelope.get_mut("data").map(Value::take).unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

/// Pick the most specific error text from an envelope.
///
/// Probed in order: `msg`, `data.msg`, `data` when it is a bare string
/// (the API answers bad tokens with `{"status":"error","data":"Invalid key"}`),
/// then [`UNKNOWN_ERROR`]. Empty strings count as absent.
pub fn error_message(envelope: &Value) -> String {
    envelope
        .get("msg")
        .and_then(non_empty_str)
        .or_else(|| envelope.pointer("/data/msg").and_then(non_empty_str))
        .or_else(|| envelope.get("data").and_then(non_empty_str))
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn parse_base(base_url: &str) -> Result<Url, FetchError> {
    let url = Url::parse(base_url).map_err(|e| invalid_endpoint(base_url, e))?;

    if url.cannot_be_a_base() {
        return Err(invalid_endpoint(base_url, "URL cannot have a path"));
    }

    Ok(url)
}

fn invalid_endpoint(endpoint: &str, reason: impl ToString) -> FetchError {
    FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OK_BODY: &str = r#"{
        "status": "ok",
        "data": {
            "aqi": 42,
            "city": {"name": "Shanghai (上海)", "url": "https://aqicn.org/city/shanghai"},
            "time": {"iso": "2024-03-01T14:00:00+08:00"},
            "attributions": [{"name": "World Air Quality Index Project", "url": "https://waqi.info/"}]
        }
    }"#;

    #[test]
    fn feed_url_for_city() {
        let provider = WaqiProvider::new();
        let url = provider
            .feed_url(&Location::City("beijing".into()), "T")
            .expect("valid url");

        assert_eq!(url.as_str(), "https://api.waqi.info/feed/beijing/?token=T");
    }

    #[test]
    fn feed_url_for_here() {
        let provider = WaqiProvider::new();
        let url = provider.feed_url(&Location::Here, "abc").expect("valid url");

        assert_eq!(url.as_str(), "https://api.waqi.info/feed/here/?token=abc");
    }

    #[test]
    fn feed_url_keeps_nested_slug_and_custom_base_path() {
        let provider = WaqiProvider::with_base_url("http://localhost:8080/proxy/").expect("valid base");
        let url = provider
            .feed_url(&Location::City("china/guangzhou".into()), "T")
            .expect("valid url");

        assert_eq!(url.as_str(), "http://localhost:8080/proxy/feed/china/guangzhou/?token=T");
    }

    #[test]
    fn feed_url_drops_empty_and_dot_segments() {
        let provider = WaqiProvider::new();

        let doubled = provider
            .feed_url(&Location::resolve(Some("//x//")), "T")
            .expect("valid url");
        assert_eq!(doubled.as_str(), "https://api.waqi.info/feed/x/?token=T");

        let dotted = provider.feed_url(&Location::resolve(Some("..")), "T").expect("valid url");
        assert_eq!(dotted.as_str(), "https://api.waqi.info/feed/here/?token=T");
    }

    #[test]
    fn feed_url_encodes_token() {
        let provider = WaqiProvider::new();
        let url = provider
            .feed_url(&Location::City("paris".into()), "a b&c")
            .expect("valid url");

        assert_eq!(url.as_str(), "https://api.waqi.info/feed/paris/?token=a+b%26c");
    }

    #[test]
    fn rejects_unusable_base() {
        let err = WaqiProvider::with_base_url("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, FetchError::InvalidEndpoint { .. }));
    }

    #[test]
    fn ok_envelope_yields_payload() {
        let reading = parse_feed_response(200, OK_BODY).expect("ok envelope");

        assert_eq!(reading.aqi, 42);
        assert_eq!(reading.city.name, "Shanghai (上海)");
        assert_eq!(reading.attributions.len(), 1);
    }

    #[test]
    fn nested_payload_error_is_raised() {
        let body = r#"{"status":"ok","data":{"status":"error","msg":"bad token"}}"#;
        let err = parse_feed_response(200, body).unwrap_err();

        assert!(matches!(err, FetchError::Api { .. }));
        assert_eq!(err.to_string(), "bad token");
    }

    #[test]
    fn envelope_error_with_string_data() {
        let body = r#"{"status":"error","data":"Invalid key"}"#;
        let err = parse_feed_response(200, body).unwrap_err();

        assert_eq!(err.to_string(), "Invalid key");
    }

    #[test]
    fn envelope_error_without_message_falls_back() {
        let err = parse_feed_response(200, r#"{"status":"error"}"#).unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);
    }

    #[test]
    fn http_500_fails_even_with_ok_body() {
        let err = parse_feed_response(500, OK_BODY).unwrap_err();

        match err {
            FetchError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, UNKNOWN_ERROR);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn http_error_with_non_json_body() {
        let err = parse_feed_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.upstream_message(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn malformed_ok_body_is_decode_error() {
        let err = parse_feed_response(200, "not json").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn ok_envelope_with_wrong_payload_shape_is_decode_error() {
        let err = parse_feed_response(200, r#"{"status":"ok","data":{"aqi":5}}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn message_precedence() {
        let all = json!({"status": "error", "msg": "top", "data": {"msg": "nested"}});
        assert_eq!(error_message(&all), "top");

        let nested = json!({"status": "error", "msg": "", "data": {"msg": "nested"}});
        assert_eq!(error_message(&nested), "nested");

        let bare = json!({"status": "error", "data": "Over quota"});
        assert_eq!(error_message(&bare), "Over quota");

        let none = json!({"status": "error", "data": {"status": "error"}});
        assert_eq!(error_message(&none), UNKNOWN_ERROR);
    }

    #[test]
    fn truncates_long_bodies_on_char_boundary() {
        let body = "é".repeat(300);
        assert_eq!(truncate_body(&body).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
