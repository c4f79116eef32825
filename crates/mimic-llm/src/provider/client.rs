//! Streaming client for `OpenAI`-compatible chat completion endpoints

use std::io;
use std::sync::Arc;

use futures_util::{StreamExt, TryFutureExt, stream};
use http::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio_util::io::StreamReader;
use url::Url;

use crate::error::LlmError;
use crate::overrides::ExtraParameters;
use crate::protocol::openai::OpenAiRequest;
use crate::sse::decode_chunks;
use crate::types::{ChatRequest, ChatStream};

/// Target of one outbound call, open to rewriting by a [`RequestShaper`]
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// Full endpoint URL, including any query
    pub url: Url,
    /// Headers sent with the request
    pub headers: HeaderMap,
}

/// Provider-specific rewriting of the outbound URL and headers
pub trait RequestShaper: Send + Sync {
    /// Adjust `upstream` for `request`
    fn shape(&self, request: &OpenAiRequest, upstream: &mut UpstreamRequest);
}

impl<F> RequestShaper for F
where
    F: Fn(&OpenAiRequest, &mut UpstreamRequest) + Send + Sync,
{
    fn shape(&self, request: &OpenAiRequest, upstream: &mut UpstreamRequest) {
        self(request, upstream);
    }
}

/// Plain bearer-token endpoint; leaves the request as built
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerShaper;

impl RequestShaper for BearerShaper {
    fn shape(&self, _request: &OpenAiRequest, _upstream: &mut UpstreamRequest) {}
}

/// Azure `OpenAI` deployment endpoint
///
/// Routes to `<base>/openai/deployments/<deployment>/chat/completions`,
/// adds `api-version` and authenticates with an `api-key` header.
pub struct AzureShaper {
    base_url: Url,
    deployment: Option<String>,
    api_version: String,
    api_key: Option<SecretString>,
}

impl AzureShaper {
    /// Shaper for one Azure resource; `deployment` defaults to the model name
    pub const fn new(
        base_url: Url,
        deployment: Option<String>,
        api_version: String,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            base_url,
            deployment,
            api_version,
            api_key,
        }
    }
}

impl RequestShaper for AzureShaper {
    fn shape(&self, request: &OpenAiRequest, upstream: &mut UpstreamRequest) {
        let deployment = self.deployment.as_deref().unwrap_or(&request.model);

        let mut url = join_path(&self.base_url, &["openai", "deployments", deployment, "chat", "completions"]);
        url.query_pairs_mut().append_pair("api-version", &self.api_version);
        upstream.url = url;

        upstream.headers.remove(AUTHORIZATION);
        if let Some(key) = &self.api_key
            && let Ok(value) = HeaderValue::from_str(key.expose_secret())
        {
            upstream.headers.insert(HeaderName::from_static("api-key"), value);
        }
    }
}

/// Append path segments to `base`, ignoring a trailing slash
fn join_path(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Build the outbound JSON body
///
/// Opaque parameters are spliced in at the top level and win over typed
/// fields of the same name.
pub fn outbound_body(request: &ChatRequest, extra: Option<&ExtraParameters>) -> Result<Value, LlmError> {
    let wire = OpenAiRequest::from(request);
    let mut body = serde_json::to_value(&wire).map_err(|e| LlmError::Internal(e.into()))?;

    if let Some(extra) = extra
        && let Value::Object(map) = &mut body
    {
        for (key, value) in extra {
            map.insert(key.clone(), value.clone());
        }
    }

    Ok(body)
}

/// Client for one `OpenAI`-compatible endpoint
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    shaper: Arc<dyn RequestShaper>,
}

impl OpenAiClient {
    /// Client using the shared `http` connection pool and bearer authentication
    pub fn new(http: reqwest::Client, base_url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            api_key,
            shaper: Arc::new(BearerShaper),
        }
    }

    /// Replace the request shaper
    #[must_use]
    pub fn with_shaper(mut self, shaper: Arc<dyn RequestShaper>) -> Self {
        self.shaper = shaper;
        self
    }

    /// Endpoint and headers for `request`, after shaping
    pub fn upstream_request(&self, request: &OpenAiRequest) -> UpstreamRequest {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        if let Some(key) = &self.api_key
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
        {
            headers.insert(AUTHORIZATION, value);
        }

        let mut upstream = UpstreamRequest {
            url: join_path(&self.base_url, &["chat", "completions"]),
            headers,
        };

        self.shaper.shape(request, &mut upstream);
        upstream
    }

    /// Stream a chat completion
    ///
    /// Nothing is sent until the returned stream is first polled. A
    /// transport failure or non-success status is the stream's only item.
    pub fn stream_chat(&self, request: &ChatRequest, extra: Option<&ExtraParameters>) -> ChatStream {
        let body = match outbound_body(request, extra) {
            Ok(body) => body,
            Err(e) => return Box::pin(stream::once(async move { Err(e) })),
        };

        let upstream = self.upstream_request(&OpenAiRequest::from(request));
        tracing::debug!(url = %upstream.url, model = %request.model, "opening upstream stream");

        let send = self
            .http
            .post(upstream.url)
            .headers(upstream.headers)
            .json(&body)
            .send();

        let open = async move {
            let response = send.await.map_err(|e| {
                tracing::error!(error = %e, "upstream request failed");
                LlmError::Upstream(e.to_string())
            })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %status, body = %body, "upstream returned error");
                return Err(LlmError::Upstream(format!("provider returned {status}: {body}")));
            }

            let bytes = Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)));
            Ok::<_, LlmError>(decode_chunks(StreamReader::new(bytes)))
        };

        Box::pin(open.try_flatten_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};

    fn wire(model: &str) -> OpenAiRequest {
        OpenAiRequest::from(&ChatRequest::new(model, vec![Message::new(Role::User, "hi")]))
    }

    fn client(base: &str, key: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            key.map(|k| SecretString::from(k.to_owned())),
        )
    }

    #[test]
    fn default_request_shape() {
        let upstream = client("https://api.example.com/v1/", Some("sk-1")).upstream_request(&wire("gpt-4o"));

        assert_eq!(upstream.url.as_str(), "https://api.example.com/v1/chat/completions");
        assert_eq!(upstream.headers[AUTHORIZATION], "Bearer sk-1");
        assert_eq!(upstream.headers[ACCEPT], "text/event-stream");
        assert_eq!(upstream.headers[CACHE_CONTROL], "no-cache");
    }

    #[test]
    fn bare_host_base_url() {
        let upstream = client("https://api.deepseek.com", None).upstream_request(&wire("deepseek-chat"));

        assert_eq!(upstream.url.as_str(), "https://api.deepseek.com/chat/completions");
        assert!(!upstream.headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn azure_shaping() {
        let base = Url::parse("https://res.openai.azure.com").unwrap();
        let shaper = AzureShaper::new(
            base.clone(),
            None,
            "2024-06-01".to_owned(),
            Some(SecretString::from("az-key".to_owned())),
        );
        let client = client(base.as_str(), Some("az-key")).with_shaper(Arc::new(shaper));

        let upstream = client.upstream_request(&wire("gpt-4o-mini"));

        assert_eq!(
            upstream.url.as_str(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-06-01"
        );
        assert!(!upstream.headers.contains_key(AUTHORIZATION));
        assert_eq!(upstream.headers["api-key"], "az-key");
        assert_eq!(upstream.headers[ACCEPT], "text/event-stream");
    }

    #[test]
    fn azure_explicit_deployment() {
        let base = Url::parse("https://res.openai.azure.com/").unwrap();
        let shaper = AzureShaper::new(base.clone(), Some("prod-4o".to_owned()), "2024-06-01".to_owned(), None);
        let client = client(base.as_str(), None).with_shaper(Arc::new(shaper));

        let upstream = client.upstream_request(&wire("gpt-4o"));
        assert_eq!(upstream.url.path(), "/openai/deployments/prod-4o/chat/completions");
    }

    #[test]
    fn closure_shaper() {
        let shaper = |_: &OpenAiRequest, upstream: &mut UpstreamRequest| {
            upstream
                .headers
                .insert(HeaderName::from_static("x-title"), HeaderValue::from_static("mimic"));
        };
        let client = client("http://localhost:9000/v1", None).with_shaper(Arc::new(shaper));

        let upstream = client.upstream_request(&wire("m"));
        assert_eq!(upstream.headers["x-title"], "mimic");
    }

    #[test]
    fn opaque_parameters_override_typed_keys() {
        let request = ChatRequest {
            max_tokens: Some(10),
            ..ChatRequest::new("m", vec![Message::new(Role::User, "hi")])
        };
        let mut extra = ExtraParameters::new();
        extra.insert("max_tokens".to_owned(), Value::from(99));
        extra.insert("reasoning".to_owned(), serde_json::json!({"effort": "low"}));

        let body = outbound_body(&request, Some(&extra)).unwrap();
        assert_eq!(body["max_tokens"], 99);
        assert_eq!(body["reasoning"]["effort"], "low");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn connection_failure_is_first_item() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = client("http://127.0.0.1:9/v1", None);
        let request = ChatRequest::new("m", vec![Message::new(Role::User, "hi")]);

        let items: Vec<_> = client.stream_chat(&request, None).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(LlmError::Upstream(_))));
    }
}
