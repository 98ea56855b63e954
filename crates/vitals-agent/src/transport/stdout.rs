use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use vitals_core::error::{Result, VitalsError};
use vitals_core::protocol::Outbound;

use super::Transport;

#[derive(Serialize)]
struct Line<'a> {
    channel: &'a str,
    payload: &'a Outbound,
}

/// Newline-delimited JSON on stdout: `{"channel": ..., "payload": ...}`.
pub struct StdoutTransport {
    out: Mutex<Stdout>,
}

impl StdoutTransport {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdoutTransport {
    async fn connect(&self) -> Result<()> {
        tracing::info!("stdout transport ready");
        Ok(())
    }

    async fn send(&self, channel: &str, payload: &Outbound) -> Result<()> {
        let mut line = serde_json::to_string(&Line { channel, payload })
            .map_err(|e| VitalsError::Transport(format!("encode failed: {e}")))?;
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| VitalsError::Transport(format!("stdout write failed: {e}")))?;
        out.flush()
            .await
            .map_err(|e| VitalsError::Transport(format!("stdout flush failed: {e}")))
    }

    async fn close_and_reconnect(&self) -> Result<()> {
        Ok(())
    }
}
