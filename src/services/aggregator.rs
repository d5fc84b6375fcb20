//! Fan-out aggregation of per-lot occupancy
//!
//! Queries every configured lot's `/estado` route and combines the answers
//! into one summary. A lot that cannot be queried degrades to the
//! `desconectado` sentinel for that entry only; the rest of the summary
//! stays live. Every call is a fresh fan-out: no retry, no caching.

use crate::domain::types::LotStatus;
use anyhow::Context;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of one lot's status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotReport {
    Online(LotStatus),
    Unreachable,
}

/// Combined view over every configured lot, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub lots: Vec<LotReport>,
    pub total_ocupados: u64,
}

impl Summary {
    /// Wire form: positional 1-indexed lot entries plus the total.
    ///
    /// A reachable lot's payload is embedded verbatim; an unreachable one
    /// becomes the string `"desconectado"`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (i, report) in self.lots.iter().enumerate() {
            let value = match report {
                LotReport::Online(status) => json!(status),
                LotReport::Unreachable => Value::String("desconectado".to_string()),
            };
            out.insert(format!("parqueadero{}", i + 1), value);
        }
        out.insert("total_ocupados".to_string(), json!(self.total_ocupados));
        Value::Object(out)
    }
}

/// Queries a fixed list of lot endpoints and combines their occupancy.
///
/// The HTTP client is built once and reused across fan-outs (connection
/// pooling); the endpoint list is static for the process lifetime.
pub struct Aggregator {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl Aggregator {
    pub fn new(endpoints: Vec<String>, query_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(query_timeout)
            .http1_only()
            .build()
            .context("failed to build lot query client")?;
        Ok(Self { client, endpoints })
    }

    /// Query every configured lot and combine the results.
    ///
    /// Never fails: an unreachable lot yields its sentinel entry and
    /// contributes nothing to the total.
    pub async fn summarize(&self) -> Summary {
        let mut lots = Vec::with_capacity(self.endpoints.len());
        let mut total_ocupados = 0u64;

        for (i, base) in self.endpoints.iter().enumerate() {
            match self.query_lot(base).await {
                Ok(status) => {
                    debug!(lot = i + 1, endpoint = %base, ocupados = status.ocupados, "lot_reachable");
                    total_ocupados += status.ocupados;
                    lots.push(LotReport::Online(status));
                }
                Err(e) => {
                    warn!(lot = i + 1, endpoint = %base, error = %e, "lot_unreachable");
                    lots.push(LotReport::Unreachable);
                }
            }
        }

        Summary { lots, total_ocupados }
    }

    /// Fetch one lot's status. A payload that does not parse as the
    /// expected shape is treated the same as a network failure.
    async fn query_lot(&self, base: &str) -> anyhow::Result<LotStatus> {
        let url = format!("{}/estado", base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("status query failed")?
            .error_for_status()
            .context("lot answered with an error status")?;
        let body = response.bytes().await.context("failed to read status body")?;
        let status: LotStatus =
            serde_json::from_slice(&body).context("malformed status payload")?;
        Ok(status)
    }
}
