//! Latest-wins scheduling of reload passes on a background worker.

use super::internal::ManagerState;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::presentation::Presenter;
use crate::reconcile::PassOutcome;
use crossbeam_channel::{Receiver, Sender};
use geocluster_types::MapRect;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;

pub(crate) const DEFAULT_THREAD_NAME: &str = "geocluster-reload";

/// Callback told whether a reload reached the display.
pub type Completion = Box<dyn FnOnce(bool) + Send + 'static>;

pub(crate) struct ReloadJob {
    pub(crate) visible_rect: MapRect,
    pub(crate) zoom_scale: f64,
    pub(crate) token: CancellationToken,
    pub(crate) completion: Completion,
}

pub(crate) struct Coordinator {
    sender: Option<Sender<ReloadJob>>,
    presenter: Arc<dyn Presenter>,
    current: Mutex<Option<CancellationToken>>,
    worker: Option<JoinHandle<()>>,
}

impl Coordinator {
    pub(crate) fn spawn(state: Arc<ManagerState>, thread_name: &str) -> Result<Self> {
        let presenter = Arc::clone(&state.presenter);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || run_worker(state, receiver))?;
        log::debug!("Started reload worker '{}'", thread_name);

        Ok(Self {
            sender: Some(sender),
            presenter,
            current: Mutex::new(None),
            worker: Some(worker),
        })
    }

    /// Cancel whatever pass is pending and queue `job` behind it.
    pub(crate) fn schedule(&self, job: ReloadJob) {
        {
            let mut current = self.current.lock();
            if let Some(previous) = current.replace(job.token.clone()) {
                previous.cancel();
            }
        }
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(err) = sender.send(job) {
            log::warn!("Reload worker is gone, dropping request");
            let completion = err.into_inner().completion;
            self.presenter.dispatch(Box::new(move || completion(false)));
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
        // Closing the channel ends the worker loop.
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::warn!("Reload worker panicked");
        }
    }
}

fn run_worker(state: Arc<ManagerState>, receiver: Receiver<ReloadJob>) {
    for job in receiver {
        let ReloadJob {
            visible_rect,
            zoom_scale,
            token,
            completion,
        } = job;

        if token.is_cancelled() {
            log::debug!("Skipping superseded reload");
            state.presenter.dispatch(Box::new(move || completion(false)));
            continue;
        }

        let Some((pass, config)) = state.cluster(zoom_scale, &visible_rect, &token) else {
            log::debug!("Reload cancelled during clustering");
            state.presenter.dispatch(Box::new(move || completion(false)));
            continue;
        };

        let shared = Arc::clone(&state);
        state.presenter.dispatch(Box::new(move || {
            match shared.commit(pass, &config, zoom_scale, &visible_rect, &token) {
                PassOutcome::Completed(delta) => {
                    log::debug!(
                        "Reload applied: -{} +{}",
                        delta.to_remove.len(),
                        delta.to_add.len()
                    );
                    shared.apply_delta(&delta);
                    completion(true);
                }
                PassOutcome::Cancelled => {
                    log::debug!("Reload cancelled before reconciliation");
                    completion(false);
                }
            }
        }));
    }
    log::debug!("Reload worker stopped");
}
