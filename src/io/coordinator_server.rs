//! Coordinator Service HTTP boundary
//!
//! Exposes the aggregated occupancy summary. The summary route always
//! answers 200, even when every lot is unreachable.

use crate::services::aggregator::Aggregator;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(body.into()))
        .expect("static response should not fail")
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<Incoming>,
    aggregator: Arc<Aggregator>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/resumen") => {
            let summary = aggregator.summarize().await;
            let body = serde_json::to_vec(&summary.to_json())
                .expect("summary serialization should not fail");
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail"))
        }
        (&Method::GET, "/health") => Ok(text_response(StatusCode::OK, "ok")),
        _ => Ok(text_response(StatusCode::NOT_FOUND, "Not Found")),
    }
}

/// Serve the summary route on an already-bound listener.
pub async fn serve_coordinator(
    listener: TcpListener,
    aggregator: Arc<Aggregator>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let aggregator = aggregator.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let aggregator = aggregator.clone();
                                async move { handle_request(req, aggregator).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "coordinator_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "coordinator_accept_error");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("coordinator_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

/// Start the Coordinator Service HTTP server
pub async fn start_coordinator_server(
    port: u16,
    aggregator: Arc<Aggregator>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = %port, "coordinator_server_started");

    serve_coordinator(listener, aggregator, shutdown).await
}
