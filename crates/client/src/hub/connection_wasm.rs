//! Browser WebSocket transport using `web_sys::WebSocket`.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_channel::mpsc::unbounded;
use futures_util::StreamExt;
use wasm_bindgen::prelude::*;
use web_sys::{js_sys, CloseEvent, ErrorEvent, MessageEvent, WebSocket};

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

        match open_socket(&url, inner.clone()).await {
            Ok(ws) => {
                if inner.current_generation() != generation {
                    let _ = ws.close();
                    break;
                }
                attempt = 0;
                inner.set_state(ConnectionState::Connected);
                crate::log_info!("{} hub: connected", inner.name);

                let (tx, mut rx) = unbounded::<String>();
                inner.install_sender(tx);

                // Close signal: the pump below parks on it.
                let (close_tx, mut close_rx) = unbounded::<()>();
                let onclose = Closure::wrap(Box::new(move |_: CloseEvent| {
                    let _ = close_tx.unbounded_send(());
                }) as Box<dyn FnMut(CloseEvent)>);
                ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
                onclose.forget();

                // Outbound pump: ends when stop() drops the sender or
                // the socket stops being writable.
                let ws_send = ws.clone();
                let name = inner.name;
                crate::platform::spawn(async move {
                    while let Some(json) = rx.next().await {
                        if ws_send.ready_state() != WebSocket::OPEN {
                            break;
                        }
                        if let Err(e) = ws_send.send_with_str(&json) {
                            crate::log_error!("{} hub: send failed: {:?}", name, e);
                        }
                    }
                });

                close_rx.next().await;
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

/// Open a socket and wire its callbacks. Resolves once the connection
/// is open, or with the close/error reason.
async fn open_socket(url: &str, inner: Arc<HubInner>) -> Result<WebSocket, String> {
    let ws = WebSocket::new(url).map_err(|e| format!("failed to create WebSocket: {e:?}"))?;

    let is_open = Rc::new(RefCell::new(false));
    let failure = Rc::new(RefCell::new(None::<String>));

    let is_open_cb = is_open.clone();
    let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
        *is_open_cb.borrow_mut() = true;
    }) as Box<dyn FnMut(web_sys::Event)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    let failure_close = failure.clone();
    let onclose = Closure::wrap(Box::new(move |e: CloseEvent| {
        let reason = if e.reason().is_empty() {
            format!("close code {}", e.code())
        } else {
            e.reason()
        };
        *failure_close.borrow_mut() = Some(reason);
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();

    let failure_err = failure.clone();
    let onerror = Closure::wrap(Box::new(move |_: ErrorEvent| {
        *failure_err.borrow_mut() = Some("socket error".to_string());
    }) as Box<dyn FnMut(ErrorEvent)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
        if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
            let text: String = text.into();
            dispatch_frame(&inner, &text);
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    // Wait (up to 5s) for the open callback to fire.
    for _ in 0..500 {
        if *is_open.borrow() {
            return Ok(ws);
        }
        if let Some(reason) = failure.borrow().clone() {
            return Err(reason);
        }
        crate::platform::sleep_ms(10).await;
    }

    Err("connection timeout".to_string())
}
