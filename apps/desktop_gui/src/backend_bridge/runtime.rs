//! Dedicated backend thread hosting a current-thread tokio runtime.
//!
//! The UI thread never blocks on it. Cache fetches are spawned through the returned
//! [`Handle`] and report back through subscriber callbacks.

use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use tokio::{runtime::Handle, sync::oneshot};

pub struct BackendRuntime {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl BackendRuntime {
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }
}

impl Drop for BackendRuntime {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("backend runtime thread panicked");
            }
        }
    }
}

pub fn launch() -> Result<BackendRuntime> {
    let (handle_tx, handle_rx) = crossbeam_channel::bounded::<Result<Handle, String>>(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let thread = thread::Builder::new()
        .name("catalog-backend".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::error!("failed to build backend runtime: {err}");
                    let _ = handle_tx.send(Err(err.to_string()));
                    return;
                }
            };
            let _ = handle_tx.send(Ok(runtime.handle().clone()));
            runtime.block_on(async move {
                let _ = shutdown_rx.await;
            });
            tracing::debug!("backend runtime stopped");
        })
        .context("failed to spawn backend thread")?;

    let handle = handle_rx
        .recv()
        .context("backend thread exited before reporting its runtime")?
        .map_err(|err| anyhow!("backend worker startup failure: failed to build runtime: {err}"))?;

    Ok(BackendRuntime {
        handle,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}
