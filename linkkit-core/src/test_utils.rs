//! Scripted [`Transport`] for unit tests: replays queued replies and records every call.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::http_request::{BinaryBody, HttpResponse, Transport, TransportError};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(Result<HttpResponse<String>, TransportError>),
    Binary(Result<HttpResponse<BinaryBody>, TransportError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub form: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a text reply for the next call.
    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.push(Reply::Text(Ok(HttpResponse {
            status,
            body: body.to_string(),
        })))
    }

    /// Queues a binary reply for the next call.
    pub fn reply_binary(&self, status: u16, bytes: &[u8], content_type: Option<&str>) -> &Self {
        self.push(Reply::Binary(Ok(HttpResponse {
            status,
            body: BinaryBody {
                bytes: bytes.to_vec(),
                content_type: content_type.map(ToString::to_string),
            },
        })))
    }

    /// Queues a transport failure for the next call, for either kind of request.
    pub fn fail(&self, error: &str) -> &Self {
        self.push(Reply::Text(Err(TransportError(error.to_string()))))
    }

    /// Reply used once the queue is empty.
    pub fn always(&self, status: u16, body: &str) -> &Self {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Reply::Text(Ok(HttpResponse {
                status,
                body: body.to_string(),
            })));
        self
    }

    /// Makes every exchange take `delay` of (tokio) time.
    pub fn with_delay(&self, delay: Duration) -> &Self {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn push(&self, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
        self
    }

    async fn next(&self, method: &'static str, url: &str, form: &[(&str, &str)]) -> Reply {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method,
                url: url.to_string(),
                form: form
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            });

        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued
            .or_else(|| {
                self.fallback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .unwrap_or_else(|| {
                Reply::Text(Err(TransportError(format!("no scripted reply for {url}"))))
            })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse<String>, TransportError> {
        match self.next("GET", url, &[]).await {
            Reply::Text(reply) => reply,
            Reply::Binary(_) => panic!("binary reply scripted for text GET {url}"),
        }
    }

    async fn post(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse<String>, TransportError> {
        match self.next("POST", url, form).await {
            Reply::Text(reply) => reply,
            Reply::Binary(_) => panic!("binary reply scripted for POST {url}"),
        }
    }

    async fn get_binary(
        &self,
        url: &str,
    ) -> Result<HttpResponse<BinaryBody>, TransportError> {
        match self.next("GET", url, &[]).await {
            Reply::Binary(reply) => reply,
            Reply::Text(Err(err)) => Err(err),
            Reply::Text(Ok(_)) => panic!("text reply scripted for binary GET {url}"),
        }
    }
}
