//! Platform seam for task spawning, timers and callback types.
//!
//! The client runs single-threaded on the browser event loop (wasm) and
//! on the tokio runtime natively. Callback types follow the executor:
//! `Rc<dyn Fn>` on wasm, `Arc<dyn Fn + Send + Sync>` natively, so the
//! same modules compile against either without littering call sites
//! with cfg blocks.

#[cfg(target_arch = "wasm32")]
mod imp {
    use std::future::Future;
    use std::rc::Rc;

    pub type Callback<T> = Rc<dyn Fn(T)>;
    pub type TaskFn = Rc<dyn Fn()>;

    pub fn callback<T, F: Fn(T) + 'static>(f: F) -> Callback<T> {
        Rc::new(f)
    }

    pub fn task<F: Fn() + 'static>(f: F) -> TaskFn {
        Rc::new(f)
    }

    pub fn spawn<F: Future<Output = ()> + 'static>(fut: F) {
        wasm_bindgen_futures::spawn_local(fut);
    }

    pub async fn sleep_ms(ms: u64) {
        gloo_timers::future::TimeoutFuture::new(ms as u32).await;
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use std::future::Future;
    use std::sync::Arc;

    pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;
    pub type TaskFn = Arc<dyn Fn() + Send + Sync>;

    pub fn callback<T, F: Fn(T) + Send + Sync + 'static>(f: F) -> Callback<T> {
        Arc::new(f)
    }

    pub fn task<F: Fn() + Send + Sync + 'static>(f: F) -> TaskFn {
        Arc::new(f)
    }

    pub fn spawn<F: Future<Output = ()> + Send + 'static>(fut: F) {
        tokio::spawn(fut);
    }

    pub async fn sleep_ms(ms: u64) {
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
    }
}

pub use imp::{callback, sleep_ms, spawn, task, Callback, TaskFn};
