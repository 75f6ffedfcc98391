use std::collections::VecDeque;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A single background thread that runs submitted jobs one at a time, in
/// submission order.
///
/// The queue can be suspended: while the suspend count is above zero no new
/// job starts (a job that is already running finishes). Dropping the queue
/// lets it drain pending jobs unless it is suspended, then joins the thread.
pub struct SerialQueue {
    handle: QueueHandle,
    worker: Option<JoinHandle<()>>,
}

/// Cloneable submission handle for a [`SerialQueue`].
#[derive(Clone)]
pub struct QueueHandle {
    inner: Arc<Inner>,
}

struct Inner {
    label: String,
    state: Mutex<State>,
    wake: Condvar,
}

struct State {
    jobs: VecDeque<Job>,
    suspend_count: usize,
    shutdown: bool,
}

impl SerialQueue {
    pub fn new(label: &str) -> std::io::Result<Self> {
        let inner = Arc::new(Inner {
            label: label.to_string(),
            state: Mutex::new(State {
                jobs: VecDeque::new(),
                suspend_count: 0,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        let worker_inner = inner.clone();
        let worker = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || run_worker(&worker_inner))?;

        Ok(Self {
            handle: QueueHandle { inner },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }
}

impl Deref for SerialQueue {
    type Target = QueueHandle;

    fn deref(&self) -> &QueueHandle {
        &self.handle
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        {
            let mut state = self.handle.inner.lock();
            state.shutdown = true;
        }
        self.handle.inner.wake.notify_all();

        if let Some(worker) = self.worker.take() {
            // Joining from the worker itself would deadlock.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                log::error!("{} worker thread panicked", self.handle.inner.label);
            }
        }
    }
}

impl QueueHandle {
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Enqueues `job`. Returns `false` if the queue has shut down.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        {
            let mut state = self.inner.lock();
            if state.shutdown {
                return false;
            }
            state.jobs.push_back(Box::new(job));
        }
        self.inner.wake.notify_one();
        true
    }

    /// Runs `job` on the queue and blocks until it returns.
    ///
    /// Returns `None` if the queue shut down before running it. Must not be
    /// called from a job on the same queue.
    pub fn sync<R: Send + 'static>(&self, job: impl FnOnce() -> R + Send + 'static) -> Option<R> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        if !self.dispatch(move || {
            let _ = tx.send(job());
        }) {
            return None;
        }
        rx.recv().ok()
    }

    pub fn suspend(&self) {
        let mut state = self.inner.lock();
        state.suspend_count += 1;
    }

    pub fn resume(&self) {
        let resumed = {
            let mut state = self.inner.lock();
            state.suspend_count = state.suspend_count.saturating_sub(1);
            state.suspend_count == 0
        };
        if resumed {
            self.inner.wake.notify_all();
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.inner.lock().suspend_count > 0
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().jobs.len()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_worker(inner: &Inner) {
    loop {
        let job = {
            let mut state = inner.lock();
            loop {
                if state.suspend_count == 0 {
                    if let Some(job) = state.jobs.pop_front() {
                        break job;
                    }
                }
                if state.shutdown {
                    state.jobs.clear();
                    return;
                }
                state = inner
                    .wake
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("job on {} panicked", inner.label);
        }
    }
}
