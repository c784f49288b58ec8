//! Stdio transport: JSON-RPC lines on stdin, responses on stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult};

use super::channel::ChannelTransport;

const CHANNEL_CAPACITY: usize = 64;

/// Stdio transport for desktop MCP clients.
pub struct StdioTransport {
    handler: Arc<ProtocolHandler>,
}

impl StdioTransport {
    pub fn new(handler: Arc<ProtocolHandler>) -> Self {
        Self { handler }
    }

    /// Run until EOF on stdin or a shutdown request. EOF closes the session,
    /// cancelling whatever is still in flight.
    pub async fn run(self) -> McpResult<()> {
        let (in_tx, in_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (out_tx, mut out_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if in_tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("EOF on stdin, shutting down");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Failed to read stdin: {e}");
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(frame) = out_rx.recv().await {
                stdout.write_all(frame.as_bytes()).await?;
                stdout.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        tracing::info!("Stdio transport started");
        let result = ChannelTransport::new(self.handler, in_rx, out_tx).run().await;

        // The reader may be parked on a blocking stdin read.
        reader.abort();
        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Failed to write stdout: {e}");
                return Err(McpError::Io(e));
            }
            Err(e) => return Err(McpError::Transport(format!("writer task failed: {e}"))),
        }
        result
    }
}
