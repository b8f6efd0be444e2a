use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::error::ChatError;
use crate::model::Message;
use crate::providers;

pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<String>, ChatError>> + 'a>>;

/// A conversational endpoint: given the full history, produce the next
/// reply's text, or `None` if the reply carried no text.
pub trait ChatBackend {
    fn chat<'a>(&'a self, messages: &'a [Message]) -> ChatFuture<'a>;
}

pub struct GeminiBackend<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> GeminiBackend<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }
}

impl ChatBackend for GeminiBackend<'_> {
    fn chat<'a>(&'a self, messages: &'a [Message]) -> ChatFuture<'a> {
        Box::pin(providers::gemini::chat(self.client, self.cfg, messages))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: Option<String>,
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// The conversation of one run. Owns the history; only `send_message`
/// changes it.
pub struct ChatSession<B> {
    backend: B,
    history: Vec<Message>,
}

impl<B> ChatSession<B>
where
    B: ChatBackend,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// Sends `text` with the prior turns. The user turn and the reply are
    /// kept only when the reply has text; otherwise history is left as it was.
    pub async fn send_message(&mut self, text: &str) -> Result<Reply, ChatError> {
        self.history.push(Message::user(text));

        match self.backend.chat(&self.history).await {
            Ok(Some(reply)) => {
                self.history.push(Message::model(reply.clone()));
                Ok(Reply { text: Some(reply) })
            }
            Ok(None) => {
                self.history.pop();
                Ok(Reply { text: None })
            }
            Err(err) => {
                self.history.pop();
                Err(err)
            }
        }
    }
}
