//! Drives one `ProtocolHandler` from a pair of frame channels.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::ProtocolHandler;
use crate::types::McpResult;

use super::framing;

/// How often a full read-ahead slot checks whether the peer has gone.
const DISCONNECT_POLL: Duration = Duration::from_millis(50);

/// Bidirectional frame channel. Inbound frames are processed one at a time
/// in arrival order; each response is sent as one outbound frame.
pub struct ChannelTransport {
    handler: Arc<ProtocolHandler>,
    inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(
        handler: Arc<ProtocolHandler>,
        inbound: mpsc::Receiver<String>,
        outbound: mpsc::Sender<String>,
    ) -> Self {
        Self {
            handler,
            inbound,
            outbound,
        }
    }

    pub fn handler(&self) -> &Arc<ProtocolHandler> {
        &self.handler
    }

    /// Run until the inbound side ends or the session is shut down.
    ///
    /// While a request is being handled at most one further frame is read
    /// ahead; the rest stay in the bounded inbound channel. If the channel
    /// ends the session is closed so the in-flight request resolves as
    /// cancelled.
    pub async fn run(self) -> McpResult<()> {
        let Self {
            handler,
            mut inbound,
            outbound,
        } = self;
        let mut pending: Option<String> = None;
        let mut inbound_open = true;

        loop {
            let frame = match pending.take() {
                Some(frame) => frame,
                None if !inbound_open => break,
                None => match inbound.recv().await {
                    Some(frame) => frame,
                    None => break,
                },
            };
            if frame.trim().is_empty() {
                continue;
            }

            let response = {
                let work = process(&handler, &frame);
                tokio::pin!(work);
                let mut poll = tokio::time::interval(DISCONNECT_POLL);
                loop {
                    tokio::select! {
                        response = &mut work => break response,
                        next = inbound.recv(), if inbound_open && pending.is_none() => {
                            match next {
                                Some(next) => pending = Some(next),
                                None => {
                                    inbound_open = false;
                                    disconnected(&handler);
                                }
                            }
                        }
                        _ = poll.tick(), if inbound_open && pending.is_some() => {
                            if inbound.is_closed() {
                                inbound_open = false;
                                disconnected(&handler);
                            }
                        }
                    }
                }
            };

            if let Some(response) = response {
                let framed = framing::frame_message(&response)?;
                if outbound.send(framed).await.is_err() {
                    tracing::warn!("Outbound channel closed, dropping response");
                    break;
                }
            }

            if handler.is_closed() {
                break;
            }
        }

        handler.close();
        tracing::info!("Channel transport stopped");
        Ok(())
    }
}

fn disconnected(handler: &ProtocolHandler) {
    tracing::info!("Inbound channel closed with a request in flight");
    handler.close();
}

async fn process(handler: &ProtocolHandler, frame: &str) -> Option<Value> {
    match framing::parse_message(frame) {
        Ok(msg) => handler.handle_message(msg).await,
        Err(e) => {
            tracing::warn!("Parse error: {e}");
            Some(framing::parse_error_response(&e))
        }
    }
}
