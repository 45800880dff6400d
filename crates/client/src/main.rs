//! Motorbay client - main entry point.
//!
//! The UI only exists for the wasm/web target. The native build is a
//! headless shell for the core modules exercised by the test suite.

#![allow(non_snake_case)]

#[cfg(target_arch = "wasm32")]
fn main() {
    dioxus::launch(motorbay_client::views::App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("motorbay_client=debug")),
        )
        .init();

    motorbay_client::log_info!(
        "motorbay client core (headless). Build with --target wasm32-unknown-unknown for the web UI; API base: {}",
        motorbay_client::config::api_base_url()
    );
}
