//! Asynchronous client for the chat completions API.

use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::{Stream, StreamExt};

use crate::config::{ClientConfig, ConfigBuilder};
use crate::error::Error;
use crate::sse::SseStream;
use crate::types::{Input, ModelSpec};
use crate::wire::{ChatChunk, ChatRequest, ChatResponse};

/// Asynchronous API client.
///
/// Holds a connection pool internally, so a single instance should be
/// created and reused. Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Client::builder().api_key(api_key).build()
    }

    /// Create a client with the key taken from the `KHULNASOFT_KEY`
    /// environment variable.
    pub fn from_env() -> Result<Self, Error> {
        Client::builder().build()
    }

    /// Start building a client with custom settings.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    fn from_config(config: ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build().map_err(Error::Init)?;
        Ok(Self { http, config })
    }

    /// Start a generation request for `input`, which may be a prompt string
    /// or a conversation history.
    pub fn generate(&self, input: impl Into<Input>) -> Generate<'_> {
        Generate {
            client: self,
            input: input.into(),
            system_prompt: None,
            spec: ModelSpec::default(),
        }
    }

    async fn execute(&self, request: &ChatRequest) -> Result<reqwest::Response, Error> {
        let response = self
            .http
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status.as_u16(), &body));
        }

        Ok(response)
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ConfigBuilder,
}

impl ClientBuilder {
    /// Use an explicit API key instead of the environment.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key(api_key);
        self
    }

    /// Point the client at a different deployment of the API.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url(base_url);
        self
    }

    /// Replace the environment lookup used to resolve the default API key.
    /// Lets callers source the credential from somewhere other than process
    /// environment variables.
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.config.env_lookup(lookup);
        self
    }

    pub fn build(self) -> Result<Client, Error> {
        Client::from_config(self.config.resolve()?)
    }
}

/// A pending generation request.
///
/// Finish with [`send`](Generate::send) for the complete response text or
/// [`stream`](Generate::stream) for incremental deltas.
#[must_use = "a generation request does nothing until sent"]
pub struct Generate<'a> {
    client: &'a Client,
    input: Input,
    system_prompt: Option<String>,
    spec: ModelSpec,
}

impl<'a> Generate<'a> {
    /// Prepend a system message to the conversation. Empty prompts are
    /// dropped rather than sent as empty messages.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Select the model, keeping the current provider. Defaults to
    /// `llama-2-13b-chat`.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.spec.model = model.into();
        self
    }

    /// Select the provider that serves the model. Defaults to `anyscale`.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.spec.provider = provider.into();
        self
    }

    fn into_request(self, stream: bool) -> (&'a Client, ChatRequest) {
        let request = ChatRequest::new(
            self.input,
            self.system_prompt.as_deref(),
            &self.spec,
            stream,
        );
        (self.client, request)
    }

    /// Send the request and wait for the complete response text.
    ///
    /// Leading and trailing spaces the model likes to emit are stripped.
    pub async fn send(self) -> Result<String, Error> {
        let (client, request) = self.into_request(false);
        let response = client.execute(&request).await?;
        let body = response.text().await?;
        let completion: ChatResponse = serde_json::from_str(&body)?;
        Ok(completion.into_content().trim_matches(' ').to_string())
    }

    /// Send the request and stream the response as text deltas.
    pub async fn stream(self) -> Result<CompletionStream, Error> {
        let (client, request) = self.into_request(true);
        let response = client.execute(&request).await?;
        Ok(CompletionStream::new(response.bytes_stream()))
    }
}

/// Stream of completion text deltas.
///
/// Yields each piece of assistant text as the service produces it and ends
/// at the terminal `[DONE]` event. Chunks carrying no text (role
/// announcements, finish markers) are skipped. After the first error the
/// stream is fused and yields nothing further.
pub struct CompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>,
    done: bool,
}

impl CompletionStream {
    pub(crate) fn new<S, E>(bytes: S) -> Self
    where
        S: Stream<Item = Result<bytes::Bytes, E>> + Send + Unpin + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let deltas = SseStream::new(bytes)
            .take_while(|event| {
                let done = matches!(event, Ok(event) if event.is_done());
                async move { !done }
            })
            .filter_map(|event| async move {
                match event {
                    Ok(event) => match serde_json::from_str::<ChatChunk>(&event.data) {
                        Ok(chunk) => chunk.into_delta().map(Ok),
                        Err(error) => Some(Err(Error::Json(error))),
                    },
                    Err(error) => Some(Err(error)),
                }
            });

        Self {
            inner: Box::pin(deltas),
            done: false,
        }
    }
}

impl Stream for CompletionStream {
    type Item = Result<String, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match ready!(this.inner.as_mut().poll_next(cx)) {
            Some(Ok(delta)) => Poll::Ready(Some(Ok(delta))),
            Some(Err(error)) => {
                this.done = true;
                Poll::Ready(Some(Err(error)))
            }
            None => {
                this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

impl fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn completion_stream(sse: &'static str) -> CompletionStream {
        let chunks: Vec<Result<bytes::Bytes, std::io::Error>> = vec![Ok(sse.into())];
        CompletionStream::new(stream::iter(chunks))
    }

    #[test]
    fn test_builder_with_explicit_key_resolves() {
        let client = Client::builder().api_key("sk-test").build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_builder_without_key_or_environment_fails() {
        let result = Client::builder().env_lookup(|_| None).build();
        assert!(matches!(result, Err(Error::MissingApiKey)));
    }

    #[test]
    fn test_env_lookup_supplies_the_key() {
        let client = Client::builder()
            .env_lookup(|name| (name == crate::config::API_KEY_ENV).then(|| "sk-env".to_string()))
            .build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_completion_stream_extracts_deltas_and_stops_at_done() {
        let mut deltas = completion_stream(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\n\n\
             data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
             data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
             data: [DONE]\n\n",
        );

        let collected: Vec<String> = tokio_test::block_on(async {
            let mut out = Vec::new();
            while let Some(delta) = deltas.next().await {
                out.push(delta.unwrap());
            }
            out
        });

        assert_eq!(collected, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_completion_stream_without_deltas_yields_nothing() {
        let mut deltas = completion_stream(
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
             data: [DONE]\n\n",
        );

        assert!(tokio_test::block_on(deltas.next()).is_none());
    }

    #[test]
    fn test_empty_string_deltas_pass_through() {
        let mut deltas = completion_stream(
            "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n\
             data: [DONE]\n\n",
        );

        assert_eq!(tokio_test::block_on(deltas.next()).unwrap().unwrap(), "");
        assert!(tokio_test::block_on(deltas.next()).is_none());
    }

    #[test]
    fn test_completion_stream_reports_unparseable_chunks() {
        let mut deltas = completion_stream("data: not json\n\n");

        let result = tokio_test::block_on(deltas.next());
        assert!(matches!(result, Some(Err(Error::Json(_)))));
        assert!(tokio_test::block_on(deltas.next()).is_none());
    }

    #[test]
    fn test_completion_stream_fuses_after_an_error() {
        let mut deltas = completion_stream(
            "data: not json\n\n\
             data: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}\n\n\
             data: [DONE]\n\n",
        );

        assert!(matches!(
            tokio_test::block_on(deltas.next()),
            Some(Err(Error::Json(_)))
        ));
        assert!(tokio_test::block_on(deltas.next()).is_none());
    }
}
