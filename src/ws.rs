use std::sync::Arc;
use std::time::Instant;

use actix_ws::{CloseCode, CloseReason, MessageStream, Session};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::broadcast::Event;
use crate::config::HandlerConfig;
use crate::message::serialize_event;
use crate::registry::SubscriberRegistry;

/// Per-connection loop for the live event feed.
///
/// Registers the connection as a subscriber, forwards every broadcast event
/// to it as JSON, and keeps the connection healthy with heartbeat pings. The
/// feed is push-only; client payloads are ignored. On any exit path the
/// subscriber is removed from the registry.
pub async fn feed(
    mut session: Session,
    stream: MessageStream,
    registry: Arc<SubscriberRegistry>,
    config: HandlerConfig,
) {
    let subscriber_id = Uuid::new_v4();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    registry.add(subscriber_id, event_tx);
    info!("subscriber {subscriber_id} connected");

    let mut stream = stream.aggregate_continuations();
    let mut last_heartbeat = Instant::now();
    let mut heartbeat = interval(config.heartbeat_interval);

    let close_reason: Option<CloseReason> = loop {
        let tick = heartbeat.tick();

        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(actix_ws::AggregatedMessage::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break Some(CloseReason {
                                code: CloseCode::Abnormal,
                                description: Some("Pong failed".to_string()),
                            });
                        }
                    }
                    Some(Ok(actix_ws::AggregatedMessage::Pong(_))) => {
                        last_heartbeat = Instant::now();
                    }
                    Some(Ok(actix_ws::AggregatedMessage::Close(reason))) => {
                        break reason;
                    }
                    Some(Ok(other)) => {
                        debug!("ignoring message from subscriber {subscriber_id}: {other:?}");
                    }
                    Some(Err(err)) => {
                        error!("websocket error for subscriber {subscriber_id}: {err}");
                        break Some(CloseReason {
                            code: CloseCode::Error,
                            description: Some(err.to_string()),
                        });
                    }
                    None => break None,
                }
            }

            event = event_rx.recv() => {
                let Some(event) = event else {
                    break Some(CloseReason {
                        code: CloseCode::Normal,
                        description: Some("Feed closed".to_string()),
                    });
                };

                match serialize_event(&event) {
                    Ok(json) => {
                        if let Err(err) = session.text(json).await {
                            error!("failed to push event to subscriber {subscriber_id}: {err}");
                            break Some(CloseReason {
                                code: CloseCode::Error,
                                description: Some("Send failed".to_string()),
                            });
                        }
                    }
                    Err(err) => {
                        error!("failed to serialize event: {err}");
                        break Some(CloseReason {
                            code: CloseCode::Error,
                            description: Some("Serialization failed".to_string()),
                        });
                    }
                }
            }

            _tick = tick => {
                if Instant::now() - last_heartbeat > config.client_timeout {
                    break Some(CloseReason {
                        code: CloseCode::Error,
                        description: Some("Client timeout".to_string()),
                    });
                }

                if session.ping(b"").await.is_err() {
                    break Some(CloseReason {
                        code: CloseCode::Error,
                        description: Some("Ping failed".to_string()),
                    });
                }
            }
        }
    };

    registry.remove(subscriber_id);
    info!("subscriber {subscriber_id} disconnected: {close_reason:?}");
    let _ = session.close(close_reason).await;
}
