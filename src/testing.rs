//! Scripted in-memory transport for unit tests

use crate::client::{DownloadStream, HttpClient, HttpResponse};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Outcome of one scripted HEAD probe
#[derive(Debug, Clone)]
pub enum ProbeScript {
    Respond(Duration),
    Fail,
    Hang,
}

/// Shape of the scripted download response
#[derive(Debug, Clone)]
pub struct DownloadScript {
    status: u16,
    content_length: Option<u64>,
    chunks: Vec<usize>,
    fail_after: Option<usize>,
    chunk_delay: Duration,
    gate: Option<Arc<Notify>>,
}

impl DownloadScript {
    /// Successful download delivering `chunks`, advertising their total
    pub fn chunks(chunks: Vec<usize>) -> Self {
        let total = chunks.iter().map(|c| *c as u64).sum();
        Self {
            status: 200,
            content_length: Some(total),
            chunks,
            fail_after: None,
            chunk_delay: Duration::ZERO,
            gate: None,
        }
    }

    pub fn without_length(mut self) -> Self {
        self.content_length = None;
        self
    }

    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Break the stream after `count` chunks
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Hold the body until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Default for DownloadScript {
    fn default() -> Self {
        Self::chunks(vec![256 * 1024; 4])
    }
}

#[derive(Debug, Clone)]
struct UploadScript {
    status: u16,
    delay: Duration,
    failure: Option<String>,
}

/// [`HttpClient`] that answers from a script and records every request
#[derive(Debug)]
pub struct ScriptedClient {
    probes: Mutex<VecDeque<ProbeScript>>,
    download: Mutex<DownloadScript>,
    upload: Mutex<UploadScript>,
    requests: Mutex<Vec<(String, String)>>,
    uploads: Mutex<Vec<usize>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    /// Instant probes, a 1 MiB download and an accepting upload endpoint
    pub fn new() -> Self {
        Self {
            probes: Mutex::new(VecDeque::new()),
            download: Mutex::new(DownloadScript::default()),
            upload: Mutex::new(UploadScript {
                status: 200,
                delay: Duration::ZERO,
                failure: None,
            }),
            requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Probes beyond the script respond immediately
    pub fn with_probes(self, probes: Vec<ProbeScript>) -> Self {
        *self.probes.lock().unwrap() = probes.into();
        self
    }

    pub fn with_download(self, script: DownloadScript) -> Self {
        self.set_download(script);
        self
    }

    pub fn set_download(&self, script: DownloadScript) {
        *self.download.lock().unwrap() = script;
    }

    pub fn with_upload_status(self, status: u16) -> Self {
        self.upload.lock().unwrap().status = status;
        self
    }

    pub fn with_upload_delay(self, delay: Duration) -> Self {
        self.upload.lock().unwrap().delay = delay;
        self
    }

    pub fn with_upload_failure(self, message: &str) -> Self {
        self.upload.lock().unwrap().failure = Some(message.to_string());
        self
    }

    /// `(method, url)` of every request so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Body sizes of every upload so far
    pub fn uploaded_bytes(&self) -> Vec<usize> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, method: &str, url: &str) {
        self.requests.lock().unwrap().push((method.to_string(), url.to_string()));
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn head(&self, url: &str, _timeout: Duration) -> Result<HttpResponse> {
        self.record("HEAD", url);
        let script = self.probes.lock().unwrap().pop_front();

        match script {
            None => Ok(HttpResponse::new(200)),
            Some(ProbeScript::Respond(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse::new(200))
            }
            Some(ProbeScript::Fail) => Err(AppError::network("connection refused")),
            Some(ProbeScript::Hang) => std::future::pending().await,
        }
    }

    async fn get_stream(&self, url: &str, _timeout: Duration) -> Result<DownloadStream> {
        self.record("GET", url);
        let script = self.download.lock().unwrap().clone();

        let mut items: Vec<Result<usize>> = Vec::new();
        for (index, chunk) in script.chunks.iter().enumerate() {
            if script.fail_after == Some(index) {
                items.push(Err(AppError::network("connection reset by peer")));
                break;
            }
            items.push(Ok(*chunk));
        }

        let gate = script.gate.clone();
        let delay = script.chunk_delay;
        let hold = stream::once(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            None::<Result<usize>>
        })
        .filter_map(futures::future::ready);

        let body = stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            item
        });

        Ok(DownloadStream {
            status_code: script.status,
            content_length: script.content_length,
            chunks: hold.chain(body).boxed(),
        })
    }

    async fn post(&self, url: &str, body: Vec<u8>, _timeout: Duration) -> Result<HttpResponse> {
        self.record("POST", url);
        self.uploads.lock().unwrap().push(body.len());
        let script = self.upload.lock().unwrap().clone();

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        match script.failure {
            Some(message) => Err(AppError::network(message)),
            None => Ok(HttpResponse::new(script.status)),
        }
    }
}
