//! HTTP server and graceful shutdown.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. stops calling `listener.accept()`, so no new connections are made;
//! 2. lets every in-flight connection task run to completion;
//! 3. returns from [`Server::serve`], which lets `main` exit cleanly.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, warn};

use crate::error::{ApiError, Error};
use crate::middleware::Flow;
use crate::request::Request;
use crate::response::IntoResponse;
use crate::router::Router;

/// Request bodies larger than this are answered with 413 unless
/// [`Server::body_limit`] says otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    body_limit: usize,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), stockroom::Error> {
    /// let server = stockroom::Server::bind("127.0.0.1:0").await?;
    /// println!("listening on {}", server.local_addr()?);
    /// # Ok(()) }
    /// ```
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, body_limit: DEFAULT_BODY_LIMIT })
    }

    /// Sets the largest request body, in bytes, that is read into memory.
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// The address actually bound; useful after binding port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections and returns.
    pub async fn serve<S>(self, router: Router<S>) -> Result<(), Error>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `signal` resolves.
    pub async fn serve_with_shutdown<S, F>(self, router: Router<S>, signal: F) -> Result<(), Error>
    where
        S: Clone + Send + Sync + 'static,
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        let Server { listener, body_limit } = self;

        // Shared across connection tasks without copying the routing table.
        let router = Arc::new(router);

        info!(%addr, body_limit, "stockroom listening");

        // Tracks every connection task so shutdown can wait for them.
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting immediately,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, remote_addr, body_limit).await }
                        });

                        // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays small.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("stockroom stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Screens the request head, buffers the body, runs the rest of the router,
/// and logs the outcome.
///
/// The global stages run before any body bytes are read, so a rejected
/// request never has its body buffered. Infallible: every failure is turned
/// into a response here or in the router.
async fn dispatch<S>(
    router: Arc<Router<S>>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
    body_limit: usize,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible>
where
    S: Clone + Send + Sync + 'static,
{
    let start = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();

    let headers = parts.headers.iter()
        .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
        .collect();
    let mut req = Request::new(parts.method.as_str(), path.clone(), headers, Vec::new());

    let response = match router.screen(&req) {
        Flow::Respond(res) => res,
        Flow::Continue => match read_body(body, body_limit).await {
            Ok(bytes) => {
                req.body = bytes;
                router.route(req).await
            }
            Err(e) => {
                warn!(peer = %remote_addr, "failed to read request body: {e}");
                e.into_response()
            }
        },
    };

    info!(
        method = %parts.method,
        %path,
        status = response.status_code(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    Ok(response.into_inner())
}

/// Collects at most `limit` bytes of `body`.
///
/// A declared length over the limit is refused before anything is read.
async fn read_body<B>(body: B, limit: usize) -> Result<Vec<u8>, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if body.size_hint().lower() > limit as u64 {
        return Err(ApiError::BodyTooLarge { limit });
    }
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes().to_vec()),
        Err(e) if e.is::<LengthLimitError>() => Err(ApiError::BodyTooLarge { limit }),
        Err(e) => Err(ApiError::MalformedBody(e.to_string())),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
