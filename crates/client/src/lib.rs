//! Motorbay client - marketplace web application
//!
//! This crate contains the web client for motorbay, a car-marketplace
//! application with realtime chat and a friends graph. The UI modules
//! compile for wasm only; everything underneath them (session store,
//! event bus, REST layer, hub clients, resource stores) also compiles
//! natively so it can be exercised by the test suite.

pub mod api_client;
pub mod bus;
pub mod config;
pub mod hub;
pub mod logging;
pub mod platform;
pub mod session;
pub mod storage;
pub mod stores;
pub mod throttle;

#[cfg(target_arch = "wasm32")]
pub mod views;

pub use api_client::ApiClient;
pub use bus::{AppEvent, EventBus, EventKind};
pub use session::{Session, SessionStore};
