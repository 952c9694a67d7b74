//! Blocking API client, mirroring [`crate::Client`].
//!
//! Follows the same convention as `reqwest::blocking`: the async client is
//! the primary interface and this module wraps the same behavior for
//! programs without an async runtime. Do not call it from inside one; the
//! underlying transport refuses to block an executor thread.

use std::fmt;
use std::io::Read;

use crate::config::{ClientConfig, ConfigBuilder};
use crate::error::Error;
use crate::sse::SseReader;
use crate::types::{Input, ModelSpec};
use crate::wire::{ChatChunk, ChatRequest, ChatResponse};

/// Blocking API client.
///
/// Holds a connection pool internally, so a single instance should be
/// created and reused. Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
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
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(Error::Init)?;
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

    fn execute(&self, request: &ChatRequest) -> Result<reqwest::blocking::Response, Error> {
        let response = self
            .http
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::from_response(status.as_u16(), &body));
        }

        Ok(response)
    }
}

/// Builder for the blocking [`Client`], accepting the same settings as the
/// async [`crate::ClientBuilder`].
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
    pub fn send(self) -> Result<String, Error> {
        let (client, request) = self.into_request(false);
        let response = client.execute(&request)?;
        let body = response.text()?;
        let completion: ChatResponse = serde_json::from_str(&body)?;
        Ok(completion.into_content().trim_matches(' ').to_string())
    }

    /// Send the request and iterate over the response as text deltas.
    pub fn stream(self) -> Result<CompletionStream, Error> {
        let (client, request) = self.into_request(true);
        let response = client.execute(&request)?;
        Ok(CompletionStream::new(response))
    }
}

/// Iterator over completion text deltas, the blocking counterpart of
/// [`crate::CompletionStream`].
///
/// Yields each piece of assistant text as the service produces it and ends
/// at the terminal `[DONE]` event. Chunks carrying no text (role
/// announcements, finish markers) are skipped. After the first error the
/// iterator is fused and yields nothing further.
pub struct CompletionStream {
    events: SseReader<Box<dyn Read + Send>>,
    done: bool,
}

impl CompletionStream {
    fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            events: SseReader::new(Box::new(reader)),
            done: false,
        }
    }
}

impl fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStream").finish_non_exhaustive()
    }
}

impl Iterator for CompletionStream {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            match self.events.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(error)) => {
                    self.done = true;
                    return Some(Err(error));
                }
                Some(Ok(event)) if event.is_done() => {
                    self.done = true;
                    return None;
                }
                Some(Ok(event)) => match serde_json::from_str::<ChatChunk>(&event.data) {
                    Ok(chunk) => match chunk.into_delta() {
                        Some(delta) => return Some(Ok(delta)),
                        None => continue,
                    },
                    Err(error) => {
                        self.done = true;
                        return Some(Err(Error::Json(error)));
                    }
                },
            }
        }
    }
}
