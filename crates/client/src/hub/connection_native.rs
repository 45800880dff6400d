//! Native WebSocket transport using tokio-tungstenite.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_channel::mpsc::unbounded;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{backoff_sleep, dispatch_frame, reconnect_delay_ms, ConnectionState, HubInner};

/// Connection loop: connect, pump frames until the socket dies, retry
/// on the fixed backoff ladder. Exits when the generation goes stale
/// (`stop()`) or the session token disappears.
pub(crate) async fn drive(inner: Arc<HubInner>, generation: u64) {
    let mut attempt: u32 = 0;

    loop {
        if inner.current_generation() != generation {
            break;
        }
        let Some(url) = (inner.url_builder)() else {
            crate::log_info!("{} hub: session gone, abandoning reconnect", inner.name);
            break;
        };

        match connect_async(&url).await {
            Ok((stream, _response)) => {
                if inner.current_generation() != generation {
                    break;
                }
                attempt = 0;
                inner.set_state(ConnectionState::Connected);
                crate::log_info!("{} hub: connected", inner.name);

                let (tx, mut rx) = unbounded::<String>();
                inner.install_sender(tx);

                let (mut write, mut read) = stream.split();
                loop {
                    tokio::select! {
                        frame = read.next() => match frame {
                            Some(Ok(Message::Text(text))) => dispatch_frame(&inner, text.as_str()),
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {} // ping/pong/binary
                            Some(Err(e)) => {
                                crate::log_error!("{} hub: read error: {}", inner.name, e);
                                break;
                            }
                        },
                        outbound = rx.next() => match outbound {
                            Some(json) => {
                                if let Err(e) = write.send(Message::Text(json.into())).await {
                                    crate::log_error!("{} hub: send failed: {}", inner.name, e);
                                    break;
                                }
                            }
                            // stop() dropped the sender
                            None => break,
                        },
                    }
                    if inner.current_generation() != generation {
                        break;
                    }
                }

                inner.clear_sender();
                if inner.current_generation() != generation {
                    break;
                }
                crate::log_warn!("{} hub: connection lost", inner.name);
            }
            Err(e) => {
                crate::log_error!("{} hub: connect failed: {}", inner.name, e);
                if inner.current_generation() != generation {
                    break;
                }
            }
        }

        let delay = reconnect_delay_ms(attempt);
        attempt = attempt.saturating_add(1);
        inner.set_state(ConnectionState::Reconnecting { attempt });
        if !backoff_sleep(&inner, generation, delay).await {
            break;
        }
    }

    inner.clear_sender();
    if inner.current_generation() == generation {
        inner.set_state(ConnectionState::Disconnected);
    }
    inner.connect_in_flight.store(false, Ordering::SeqCst);
}
