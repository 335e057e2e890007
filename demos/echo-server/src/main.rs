//! # Echo Server Demo
//!
//! Starts one or more JSON-RPC servers on an in-process bus and calls them
//! with the bundled client.
//!
//! ## Usage
//! ```bash
//! cargo run --package echo-server -- --message "hello" --workers 3
//! RUST_LOG=busrpc_server=debug cargo run --package echo-server
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use busrpc_client::prelude::*;
use busrpc_server::{ApplicationError, JsonRpcServer, MethodRegistry, TracingObserver};
use busrpc_transport::MemoryBus;
use clap::Parser;
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Subject the servers listen on
    #[arg(short, long, default_value = "demo.rpc")]
    subject: String,

    /// Queue group shared by the servers
    #[arg(short, long, default_value = "echo-workers")]
    queue_group: String,

    /// Number of servers in the queue group
    #[arg(short, long, default_value = "2")]
    workers: usize,

    /// Client timeout in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Text sent to the echo method
    #[arg(short, long, default_value = "hi")]
    message: String,
}

/// Smallest client timeout; the deliberately slow call waits half of it
const MIN_TIMEOUT_MS: u64 = 2;

impl Args {
    /// Clamp arguments that would leave nothing to run or a zero timeout
    fn clamped(mut self) -> Self {
        self.workers = self.workers.max(1);
        self.timeout_ms = self.timeout_ms.max(MIN_TIMEOUT_MS);
        self
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Timeout for the call that is expected to time out
    fn short_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms / 2)
    }
}

fn registry() -> MethodRegistry {
    MethodRegistry::new()
        .with_fn("echo", |params: Value| async move { Ok(params["value"].clone()) })
        .with_fn("add", |params: Value| async move {
            match (params["a"].as_f64(), params["b"].as_f64()) {
                (Some(a), Some(b)) => Ok(json!(a + b)),
                _ => Err(ApplicationError::with_code(-32602, "a and b must be numbers")),
            }
        })
        .with_fn("fail", |params: Value| async move {
            Err(ApplicationError::new("Requested failure").with_data(params))
        })
        .with_fn("sleep", |params: Value| async move {
            let millis = params["ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(json!({"slept_ms": millis}))
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse().clamped();
    let bus = Arc::new(MemoryBus::new());

    let mut servers = Vec::with_capacity(args.workers);
    for _ in 0..args.workers {
        let server = JsonRpcServer::builder()
            .subject(&args.subject)
            .queue_group(&args.queue_group)
            .observer(Arc::new(TracingObserver))
            .registry(registry())
            .start(Arc::clone(&bus))
            .await
            .context("failed to start server")?;
        servers.push(server);
    }
    info!(
        "{} server(s) on '{}' answering {:?}",
        servers.len(),
        args.subject,
        servers
            .first()
            .map(|server| server.registered_methods())
            .unwrap_or_default()
    );

    let config = ClientConfig::new(&args.subject)
        .with_default_timeout(args.default_timeout());
    let client = JsonRpcClient::new(bus.clone(), config);

    let echoed = client.request("echo", json!({"value": args.message})).await?;
    info!("echo -> {}", echoed);

    let sum: f64 = client.call("add", &json!({"a": 40, "b": 2})).await?;
    info!("add -> {}", sum);

    match client.request("fail", json!({"reason": "demo"})).await {
        Ok(value) => warn!("fail unexpectedly returned {}", value),
        Err(err) => info!("fail -> {} (code {:?})", err, err.error_code()),
    }

    match client.request("missing", Value::Null).await {
        Ok(value) => warn!("missing unexpectedly returned {}", value),
        Err(err) => info!("missing -> {} (kind {:?})", err, err.rpc_kind()),
    }

    let slow = client
        .request_with_options(
            "sleep",
            json!({"ms": args.timeout_ms.saturating_mul(2)}),
            RequestOptions::with_timeout(args.short_timeout()),
        )
        .await;
    match slow {
        Ok(value) => warn!("sleep unexpectedly returned {}", value),
        Err(err) if err.is_timeout() => info!("sleep -> timed out as expected"),
        Err(err) => return Err(err.into()),
    }

    for server in servers {
        server.shutdown().await;
    }
    Ok(())
}
