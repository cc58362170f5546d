//! Ordered request-handling chain and the server loop driving it
//!
//! A [Server] owns a fixed, ordered list of [Stage]s declared once at
//! startup. Every request walks the chain from the first stage: a stage
//! either signals continuation ([ControlFlow::Continue]) or terminates the
//! chain with a response ([ControlFlow::Break]). If no stage responds, the
//! server answers with a default not-found response, so every request gets
//! exactly one response.

use std::any::type_name;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::{
    io::{self, AsyncWriteExt, BufReader},
    net::TcpListener,
};

use crate::http::{AsyncTryFrom, HttpStatus, Request, Response};

pub trait Named {
    fn name(&self) -> &str {
        type_name::<Self>().split("::").last().unwrap()
    }
}

/// One unit of the request-handling chain.
///
/// Implementations must resolve to exactly one of the two outcomes on
/// every path, error paths included; a stage that neither responds nor
/// continues would leave the request unanswered.
#[async_trait]
pub trait Stage: Send + Sync + Named + 'static {
    async fn handle(&self, request: &Request) -> ControlFlow<Response>;
}

pub struct Server {
    bind: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl Server {
    pub fn new(bind: String) -> Self {
        Self {
            bind,
            stages: Vec::new(),
        }
    }

    /// Append a stage to the end of the chain. Stages run in insertion
    /// order; inserting or removing one never reorders the rest.
    pub fn push_stage(&mut self, stage: Arc<dyn Stage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Walk the chain until a stage responds; default when exhausted.
    pub async fn dispatch(&self, request: &Request) -> Response {
        Self::run_chain(&self.stages, request).await
    }

    async fn run_chain(stages: &[Arc<dyn Stage>], request: &Request) -> Response {
        for stage in stages {
            match stage.handle(request).await {
                ControlFlow::Continue(()) => {}
                ControlFlow::Break(response) => return response,
            }
        }

        Response::not_found()
    }

    pub async fn run(&self) -> io::Result<()> {
        debug!("Running in a debug mode...");
        debug!("Server chain: {self:?}");

        info!("bind -> {}", self.bind);

        let listener = TcpListener::bind(&self.bind).await?;
        loop {
            let (stream, socket) = listener.accept().await?;

            debug!("Connection from: {}:{}", socket.ip(), socket.port());

            let stages = self.stages.clone();

            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let reader = BufReader::new(read_half);

                let request: Request = match AsyncTryFrom::try_from(reader).await {
                    Ok(req) => req,
                    Err(e) => {
                        error!("Server can't build the request: {e}");
                        let bad = Response::new(HttpStatus::BadRequest);
                        if let Err(e) = write_half.write_all(&bad.as_bytes()).await {
                            error!("Failed writing response: {e}");
                        }
                        return;
                    }
                };

                debug!("Request -> {request:?}");

                let response = Self::run_chain(&stages, &request).await;

                debug!("Response -> {response:?}");

                if let Err(e) = write_half.write_all(&response.as_bytes()).await {
                    error!("Failed writing response: {e}");
                }
            });
        }
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self
            .stages
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" -> ");

        write!(f, "[{chain}]")
    }
}
