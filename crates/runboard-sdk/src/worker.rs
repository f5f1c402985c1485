//! Background worker
//!
//! A [`RunsWorker`] runs one [`RunsPipeline`] on a dedicated OS thread.
//! Requests travel over a FIFO channel and each is answered on its own
//! one-shot reply, so responses come back in issue order. The worker stamps
//! every request with a generation as it takes it off the queue, so
//! generations follow queue order even with several clients. Callers that
//! issue queries faster than they are answered keep only the newest with
//! [`LatestResponse`].

use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use crate::pipeline::{RunsPipeline, RunsRequest, RunsResponse};
use serde::Serialize;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

/// A response stamped with the generation of its request
#[derive(Debug, Clone, Serialize)]
pub struct TaggedResponse {
    pub generation: u64,
    #[serde(flatten)]
    pub response: RunsResponse,
}

enum Message {
    Query {
        request: RunsRequest,
        reply: oneshot::Sender<Result<TaggedResponse>>,
    },
    Shutdown,
}

/// Cloneable handle for submitting requests to a worker
#[derive(Clone)]
pub struct RunsClient {
    tx: mpsc::UnboundedSender<Message>,
}

impl RunsClient {
    fn enqueue(&self, request: RunsRequest) -> Result<oneshot::Receiver<Result<TaggedResponse>>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Query { request, reply })
            .map_err(|_| SdkError::WorkerClosed)?;
        Ok(rx)
    }

    /// Submit a request and wait for its response
    pub async fn submit(&self, request: RunsRequest) -> Result<TaggedResponse> {
        let rx = self.enqueue(request)?;
        rx.await.map_err(|_| SdkError::WorkerClosed)?
    }

    /// Blocking variant of [`RunsClient::submit`] for callers outside an async
    /// runtime. Must not be called from within one.
    pub fn submit_blocking(&self, request: RunsRequest) -> Result<TaggedResponse> {
        let rx = self.enqueue(request)?;
        rx.blocking_recv().map_err(|_| SdkError::WorkerClosed)?
    }
}

/// Owner of the worker thread
pub struct RunsWorker {
    client: RunsClient,
    handle: Option<JoinHandle<()>>,
}

impl RunsWorker {
    /// Start a worker thread owning a fresh pipeline
    pub fn spawn(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let name = config.worker_thread_name.clone();

        let handle = std::thread::Builder::new().name(name.clone()).spawn(move || {
            let mut pipeline = RunsPipeline::new(config);
            let mut generation = 0u64;
            tracing::info!("Worker {} started", name);

            while let Some(message) = rx.blocking_recv() {
                let (request, reply) = match message {
                    Message::Query { request, reply } => (request, reply),
                    Message::Shutdown => break,
                };
                generation += 1;
                let result = pipeline
                    .handle(request)
                    .map(|response| TaggedResponse {
                        generation,
                        response,
                    });
                if reply.send(result).is_err() {
                    tracing::debug!("Caller dropped before generation {} was answered", generation);
                }
            }
            tracing::info!("Worker {} stopped", name);
        })?;

        Ok(Self {
            client: RunsClient { tx },
            handle: Some(handle),
        })
    }

    /// A handle for submitting requests
    pub fn client(&self) -> RunsClient {
        self.client.clone()
    }

    pub async fn submit(&self, request: RunsRequest) -> Result<TaggedResponse> {
        self.client.submit(request).await
    }

    pub fn submit_blocking(&self, request: RunsRequest) -> Result<TaggedResponse> {
        self.client.submit_blocking(request)
    }

    /// Stop the worker after the requests already queued and wait for its
    /// thread to exit. Clients still held elsewhere get `WorkerClosed`.
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.client.tx.send(Message::Shutdown);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| SdkError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for RunsWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.client.tx.send(Message::Shutdown);
        }
    }
}

/// Last-write-wins holder for responses
#[derive(Debug, Default)]
pub struct LatestResponse {
    generation: u64,
    response: Option<RunsResponse>,
}

impl LatestResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt `tagged` if it is newer than the current response. Returns
    /// whether it was adopted.
    pub fn offer(&mut self, tagged: TaggedResponse) -> bool {
        if tagged.generation <= self.generation {
            tracing::debug!(
                "Discarding stale generation {} (current {})",
                tagged.generation,
                self.generation
            );
            return false;
        }
        self.generation = tagged.generation;
        self.response = Some(tagged.response);
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self) -> Option<&RunsResponse> {
        self.response.as_ref()
    }
}
