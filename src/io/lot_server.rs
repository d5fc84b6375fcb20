//! Lot Service HTTP boundary
//!
//! Translates the three per-lot routes onto registry calls and maps
//! registry failures to response codes. Uses hyper for the HTTP server.

use crate::domain::types::RegistryError;
use crate::services::registry::LotRegistry;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Body of the two plate-bearing commands.
#[derive(Debug, Deserialize)]
struct PlacaRequest {
    placa: String,
}

/// Body of a successful departure response.
#[derive(Debug, Serialize)]
struct SalidaResponse {
    placa: String,
    minutos: u64,
    costo: String,
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(body.into()))
        .expect("static response should not fail")
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("static response should not fail")
}

fn registry_error_response(err: &RegistryError) -> Response<Full<Bytes>> {
    match err {
        RegistryError::InvalidPlate => text_response(StatusCode::BAD_REQUEST, "Placa inválida"),
        RegistryError::AlreadyParked(_) => {
            text_response(StatusCode::CONFLICT, "Vehículo ya ingresado")
        }
        RegistryError::NotFound(_) => {
            text_response(StatusCode::NOT_FOUND, "Vehículo no encontrado")
        }
    }
}

/// Decode a `{"placa": ...}` body. None when the body is not that shape.
async fn read_placa(body: Incoming) -> Option<String> {
    let bytes = body.collect().await.ok()?.to_bytes();
    let request: PlacaRequest = serde_json::from_slice(&bytes).ok()?;
    Some(request.placa)
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<Incoming>,
    registry: Arc<LotRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    match (&parts.method, parts.uri.path()) {
        (&Method::POST, "/ingreso") => {
            let Some(placa) = read_placa(body).await else {
                return Ok(text_response(StatusCode::BAD_REQUEST, "Placa inválida"));
            };
            Ok(match registry.admit(&placa, Instant::now()) {
                Ok(()) => text_response(
                    StatusCode::CREATED,
                    format!("Vehículo {placa} ingresado"),
                ),
                Err(e) => registry_error_response(&e),
            })
        }
        (&Method::POST, "/salida") => {
            let Some(placa) = read_placa(body).await else {
                return Ok(text_response(StatusCode::BAD_REQUEST, "Placa inválida"));
            };
            Ok(match registry.depart(&placa, Instant::now()) {
                Ok(receipt) => {
                    let payload = SalidaResponse {
                        costo: receipt.fee_display(),
                        placa: receipt.plate,
                        minutos: receipt.minutes,
                    };
                    let body = serde_json::to_vec(&payload)
                        .expect("receipt serialization should not fail");
                    json_response(StatusCode::OK, body)
                }
                Err(e) => registry_error_response(&e),
            })
        }
        (&Method::GET, "/estado") => {
            let status = registry.snapshot();
            let body =
                serde_json::to_vec(&status).expect("status serialization should not fail");
            Ok(json_response(StatusCode::OK, body))
        }
        (&Method::GET, "/health") => Ok(text_response(StatusCode::OK, "ok")),
        _ => Ok(text_response(StatusCode::NOT_FOUND, "Not Found")),
    }
}

/// Serve the lot routes on an already-bound listener.
///
/// Split from [`start_lot_server`] so tests can bind an ephemeral port
/// and learn the address before serving.
pub async fn serve_lot(
    listener: TcpListener,
    registry: Arc<LotRegistry>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let registry = registry.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let registry = registry.clone();
                                async move { handle_request(req, registry).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "lot_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "lot_accept_error");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("lot_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

/// Start the Lot Service HTTP server
pub async fn start_lot_server(
    port: u16,
    registry: Arc<LotRegistry>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = %port, "lot_server_started");

    serve_lot(listener, registry, shutdown).await
}
