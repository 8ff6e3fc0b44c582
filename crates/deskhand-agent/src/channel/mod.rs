//! Socket.IO client session with the coordinator.
//!
//! One logical session is kept alive for the life of the process. Each
//! connection attempt runs the Engine.IO handshake, joins the namespace
//! named by the server URL path, announces the configured identity and then serves events
//! until the socket drops, after which the next attempt waits an
//! exponentially growing delay.

pub mod endpoint;
pub mod packet;

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{bail, Context};
use deskhand_core::config::ReconnectConfig;
use deskhand_core::DeskError;
use deskhand_core::protocol::{
    ExecuteActions, Identify, ScreenshotRequest, EVENT_EXECUTE_ACTIONS, EVENT_IDENTIFY,
    EVENT_REQUEST_SCREENSHOT, EVENT_SCREENSHOT_UNVALIDATED,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::context::AgentContext;
use crate::screenshot;
use crate::worker::{self, Batch, BatchQueue};

pub use endpoint::socket_url;
use packet::{EnginePacket, Handshake, SocketPacket};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

// ─── Outbound events ──────────────────────────────────────────────────────

/// An event waiting to be emitted. Events produced while disconnected stay
/// queued until the next session.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub event: &'static str,
    pub payload: Value,
}

impl Outbound {
    fn frame(&self, namespace: &str) -> String {
        SocketPacket::event(namespace, self.event, self.payload.clone()).to_frame()
    }
}

// ─── Backoff ──────────────────────────────────────────────────────────────

/// Reconnect delay: doubles from `initial_delay_ms` up to `max_delay_ms` and
/// starts over after a successful connect.
#[derive(Debug)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    attempts: u32,
}

impl Backoff {
    pub(crate) fn new(config: &ReconnectConfig) -> Self {
        let initial = Duration::from_millis(config.initial_delay_ms);
        Self {
            initial,
            max: Duration::from_millis(config.max_delay_ms).max(initial),
            attempts: 0,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        self.initial.saturating_mul(factor).min(self.max)
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
    }
}

// ─── Session loop ─────────────────────────────────────────────────────────

/// Connect and serve forever, reconnecting whenever the session ends.
pub async fn serve(ctx: AgentContext) -> anyhow::Result<()> {
    let endpoint = socket_url(&ctx.config.server_url)?;
    let (queue, _worker) = worker::spawn(ctx.interpreter());
    let (outbox, mut outbound) = mpsc::unbounded_channel::<Outbound>();
    let mut pending = VecDeque::new();
    let mut backoff = Backoff::new(&ctx.config.reconnect);

    info!(
        url = %endpoint.url,
        namespace = %endpoint.namespace,
        input = ctx.backend.name(),
        capture = ctx.capture.name(),
        "starting agent"
    );

    loop {
        let mut session = Session {
            ctx: &ctx,
            namespace: &endpoint.namespace,
            queue: &queue,
            outbox: &outbox,
            outbound: &mut outbound,
            pending: &mut pending,
        };
        match session.run(&endpoint.url, &mut backoff).await {
            Ok(()) => info!("disconnected from coordinator"),
            Err(e) => warn!(error = %format!("{e:#}"), "connection error"),
        }
        let delay = backoff.next_delay();
        info!(
            delay_ms = delay.as_millis() as u64,
            unsent = pending.len(),
            "reconnecting"
        );
        tokio::time::sleep(delay).await;
    }
}

struct Session<'a> {
    ctx: &'a AgentContext,
    namespace: &'a str,
    queue: &'a BatchQueue,
    outbox: &'a mpsc::UnboundedSender<Outbound>,
    outbound: &'a mut mpsc::UnboundedReceiver<Outbound>,
    /// Events taken off `outbound` whose send failed.
    pending: &'a mut VecDeque<Outbound>,
}

impl Session<'_> {
    async fn run(&mut self, url: &str, backoff: &mut Backoff) -> anyhow::Result<()> {
        let (mut ws, _) = connect_async(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))?;

        let open = tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(&mut ws, self.namespace))
            .await
            .context("handshake timed out")??;
        info!(sid = %open.sid, "connected to coordinator");
        backoff.reset();

        if let Some(agent_id) = self.ctx.agent_id() {
            let identify = Identify {
                user_id: agent_id.to_string(),
            };
            let frame = SocketPacket::event(
                self.namespace,
                EVENT_IDENTIFY,
                serde_json::to_value(&identify)?,
            )
            .to_frame();
            ws.send(WsMessage::Text(frame)).await?;
            info!(agent_id, "sent identify");
        }

        while let Some(out) = self.pending.pop_front() {
            if let Err(e) = ws.send(WsMessage::Text(out.frame(self.namespace))).await {
                self.pending.push_front(out);
                return Err(e).context("failed to flush queued events");
            }
            debug!(event = out.event, "flushed queued event");
        }

        let liveness = Duration::from_millis(open.ping_interval + open.ping_timeout);
        let idle = tokio::time::sleep(liveness);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                _ = &mut idle => {
                    bail!("no traffic from coordinator for {}ms", liveness.as_millis());
                }
                out = self.outbound.recv() => {
                    let Some(out) = out else {
                        bail!("outbound queue closed");
                    };
                    if let Err(e) = ws.send(WsMessage::Text(out.frame(self.namespace))).await {
                        self.pending.push_front(out);
                        return Err(e).context("failed to send event");
                    }
                    debug!(event = out.event, "sent event");
                }
                frame = ws.next() => {
                    idle.as_mut().reset(Instant::now() + liveness);
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            if !self.on_text(&mut ws, &text).await? {
                                return Ok(());
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            info!(?frame, "websocket closed by coordinator");
                            return Ok(());
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            ws.send(WsMessage::Pong(data)).await?;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e).context("websocket error"),
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Handle one Engine.IO frame. Returns `false` when the session is over.
    async fn on_text(&self, ws: &mut WsStream, text: &str) -> anyhow::Result<bool> {
        match EnginePacket::decode(text) {
            Ok(EnginePacket::Ping(data)) => {
                ws.send(WsMessage::Text(EnginePacket::Pong(data).encode()))
                    .await?;
            }
            Ok(EnginePacket::Close) => {
                info!("coordinator closed the session");
                return Ok(false);
            }
            Ok(EnginePacket::Message(body)) => match SocketPacket::decode(&body) {
                Ok(packet) if packet.namespace() != self.namespace => {
                    debug!(
                        namespace = packet.namespace(),
                        "ignoring packet for another namespace"
                    );
                }
                Ok(SocketPacket::Event { name, args, .. }) => {
                    dispatch(self.ctx, self.queue, self.outbox, &name, args);
                }
                Ok(SocketPacket::Disconnect { .. }) => {
                    info!("coordinator disconnected the socket");
                    return Ok(false);
                }
                Ok(other) => debug!(?other, "ignoring Socket.IO packet"),
                Err(e) => warn!(error = %e, "undecodable Socket.IO packet"),
            },
            Ok(other) => debug!(?other, "ignoring Engine.IO packet"),
            Err(e) => warn!(error = %e, "undecodable Engine.IO packet"),
        }
        Ok(true)
    }
}

/// Engine.IO open, then join `namespace`.
async fn handshake(ws: &mut WsStream, namespace: &str) -> anyhow::Result<Handshake> {
    let open = match EnginePacket::decode(&read_text(ws).await?)? {
        EnginePacket::Open(open) => open,
        other => bail!("expected Engine.IO open packet, got {other:?}"),
    };
    debug!(
        sid = %open.sid,
        ping_interval = open.ping_interval,
        max_payload = ?open.max_payload,
        "engine open"
    );

    ws.send(WsMessage::Text(SocketPacket::connect(namespace).to_frame()))
        .await?;

    loop {
        match EnginePacket::decode(&read_text(ws).await?)? {
            EnginePacket::Ping(data) => {
                ws.send(WsMessage::Text(EnginePacket::Pong(data).encode()))
                    .await?;
            }
            EnginePacket::Message(body) => match SocketPacket::decode(&body)? {
                packet if packet.namespace() != namespace => {
                    debug!(?packet, "ignoring packet for another namespace");
                }
                SocketPacket::Connect { .. } => return Ok(open),
                SocketPacket::ConnectError { data, .. } => {
                    let reason = data
                        .as_ref()
                        .and_then(|d| d.get("message"))
                        .and_then(Value::as_str)
                        .unwrap_or("no reason given")
                        .to_string();
                    return Err(DeskError::Channel(format!(
                        "coordinator refused connection: {reason}"
                    ))
                    .into());
                }
                other => debug!(?other, "ignoring packet before connect"),
            },
            EnginePacket::Close => bail!("coordinator closed the session during handshake"),
            _ => {}
        }
    }
}

async fn read_text(ws: &mut WsStream) -> anyhow::Result<String> {
    while let Some(frame) = ws.next().await {
        match frame? {
            WsMessage::Text(text) => return Ok(text),
            WsMessage::Close(frame) => bail!("websocket closed: {frame:?}"),
            WsMessage::Ping(data) => ws.send(WsMessage::Pong(data)).await?,
            _ => continue,
        }
    }
    bail!("websocket stream ended")
}

// ─── Event dispatch ───────────────────────────────────────────────────────

/// Route one inbound event. Never blocks: batches go to the worker queue and
/// each screenshot request gets its own task.
pub(crate) fn dispatch(
    ctx: &AgentContext,
    queue: &BatchQueue,
    outbox: &mpsc::UnboundedSender<Outbound>,
    name: &str,
    args: Vec<Value>,
) {
    let payload = args.into_iter().next().unwrap_or(Value::Null);
    match name {
        EVENT_EXECUTE_ACTIONS => {
            let request: ExecuteActions = match serde_json::from_value(payload) {
                Ok(request) => request,
                Err(e) => {
                    error!(error = %e, "rejecting malformed execute_actions batch");
                    return;
                }
            };
            let batch = Batch::new(request.user_id, request.actions);
            debug!(batch = %batch.id, actions = batch.actions.len(), "queued batch");
            queue.submit(batch);
        }
        EVENT_REQUEST_SCREENSHOT => {
            let request: ScreenshotRequest = match serde_json::from_value(payload) {
                Ok(request) => request,
                Err(e) => {
                    error!(error = %e, "malformed request_screenshot payload");
                    return;
                }
            };
            let span = info_span!("screenshot", user = %request.user_id);
            let capture = ctx.capture.clone();
            let outbox = outbox.clone();
            tokio::spawn(
                async move {
                    let reply = match screenshot::produce(capture.as_ref(), request).await {
                        Ok(reply) => reply,
                        Err(e) => {
                            error!(error = %e, "screenshot failed");
                            return;
                        }
                    };
                    let payload = match serde_json::to_value(&reply) {
                        Ok(payload) => payload,
                        Err(e) => {
                            error!(error = %e, "failed to encode screenshot reply");
                            return;
                        }
                    };
                    let out = Outbound {
                        event: EVENT_SCREENSHOT_UNVALIDATED,
                        payload,
                    };
                    if outbox.send(out).is_err() {
                        error!("channel is shut down; screenshot dropped");
                    } else {
                        info!("screenshot ready");
                    }
                }
                .instrument(span),
            );
        }
        other => debug!(event = other, "ignoring unknown event"),
    }
}
