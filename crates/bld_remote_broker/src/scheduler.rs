//! Execution serializer: at most one command on the main loop at a time.
//!
//! The host API is single-threaded and not reentrant, so every mutating
//! command is wrapped into a job, queued, and drained by [`TickQueue`]
//! from the host's own tick. I/O workers block on a per-job completion
//! slot; the ordering guarantee is the queue order itself.
//!
//! # Timeout asymmetry
//!
//! A worker whose deadline elapses abandons its job but the job is NOT
//! cancelled - the embedded interpreter has no safe cancellation primitive
//! for arbitrary user code. The abandoned job runs to completion on the
//! main loop and only then frees its queue slot, so the next request pays
//! no penalty beyond waiting its turn.

use crate::error::BrokerError;
use crate::host::Host;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A unit of work destined for the host main loop.
pub type MainLoopJob = Box<dyn FnOnce(&mut dyn Host) -> Result<Value, BrokerError> + Send>;

/// One-shot result slot the owning worker blocks on.
#[derive(Default)]
struct CompletionSlot {
    result: Mutex<Option<Result<Value, BrokerError>>>,
    done: Condvar,
}

struct ScheduledJob {
    run: MainLoopJob,
    slot: Arc<CompletionSlot>,
}

/// Busy state: `pending` holds admitted jobs not yet started; `running`
/// is true while a job executes on the main loop. The serializer is busy
/// iff either is non-empty/true.
struct QueueState {
    pending: VecDeque<ScheduledJob>,
    running: bool,
}

struct SchedulerShared {
    state: Mutex<QueueState>,
    /// Signaled when a queue slot frees up (after the completion signal).
    space: Condvar,
    queue_depth: usize,
    admission_timeout: Duration,
}

/// Worker-side handle: admits jobs and blocks for their results.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<SchedulerShared>,
}

/// Main-loop-side handle: the host drains this from its tick.
pub struct TickQueue {
    shared: Arc<SchedulerShared>,
}

impl Scheduler {
    /// Create a serializer with the given queue depth and admission wait.
    pub fn new(queue_depth: usize, admission_timeout: Duration) -> (Scheduler, TickQueue) {
        let shared = Arc::new(SchedulerShared {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                running: false,
            }),
            space: Condvar::new(),
            queue_depth,
            admission_timeout,
        });
        (
            Scheduler {
                shared: Arc::clone(&shared),
            },
            TickQueue { shared },
        )
    }

    /// Admit `job` and block until it completes or `deadline` elapses.
    ///
    /// Admission waits up to the configured admission timeout for queue
    /// space, then rejects with [`BrokerError::Busy`]. On deadline expiry
    /// the job is abandoned, not cancelled (see module docs).
    pub fn submit(&self, job: MainLoopJob, deadline: Duration) -> Result<Value, BrokerError> {
        let slot = Arc::new(CompletionSlot::default());

        {
            let mut state = self.lock_state();
            let admission_deadline = Instant::now() + self.shared.admission_timeout;
            while state.pending.len() >= self.shared.queue_depth {
                let now = Instant::now();
                if now >= admission_deadline {
                    return Err(BrokerError::Busy);
                }
                let (guard, _timeout) = self
                    .shared
                    .space
                    .wait_timeout(state, admission_deadline - now)
                    .expect("scheduler lock poisoned");
                state = guard;
            }
            state.pending.push_back(ScheduledJob {
                run: job,
                slot: Arc::clone(&slot),
            });
            debug!(pending = state.pending.len(), "job admitted");
        }

        let completion_deadline = Instant::now() + deadline;
        let mut result = slot.result.lock().expect("completion slot lock poisoned");
        loop {
            if let Some(outcome) = result.take() {
                return outcome;
            }
            let now = Instant::now();
            if now >= completion_deadline {
                warn!(
                    deadline_secs = deadline.as_secs_f64(),
                    "worker deadline elapsed; abandoning job (it will still run)"
                );
                return Err(BrokerError::Timeout);
            }
            let (guard, _timeout) = slot
                .done
                .wait_timeout(result, completion_deadline - now)
                .expect("completion slot lock poisoned");
            result = guard;
        }
    }

    /// True while a job is queued or mid-execution.
    pub fn is_busy(&self) -> bool {
        let state = self.lock_state();
        state.running || !state.pending.is_empty()
    }

    /// Number of admitted jobs not yet started.
    pub fn pending_len(&self) -> usize {
        self.lock_state().pending.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.shared.state.lock().expect("scheduler lock poisoned")
    }
}

impl TickQueue {
    /// Drain the jobs that were queued when the tick began, running each
    /// synchronously on the caller's thread. Jobs admitted mid-drain wait
    /// for the next tick, so a burst cannot starve the host.
    ///
    /// Returns the number of jobs executed.
    pub fn run_pending(&self, host: &mut dyn Host) -> usize {
        let batch = {
            let state = self.lock_state();
            state.pending.len()
        };

        let mut executed = 0;
        for _ in 0..batch {
            let job = {
                let mut state = self.lock_state();
                match state.pending.pop_front() {
                    Some(job) => {
                        state.running = true;
                        job
                    }
                    None => break,
                }
            };

            let outcome = (job.run)(host);

            // Completion signal fires before the slot is released so an
            // admitted-but-waiting worker cannot observe a free slot while
            // its predecessor's owner is still unsignaled.
            {
                let mut result = job
                    .slot
                    .result
                    .lock()
                    .expect("completion slot lock poisoned");
                *result = Some(outcome);
                job.slot.done.notify_all();
            }
            {
                let mut state = self.lock_state();
                state.running = false;
            }
            self.shared.space.notify_one();
            executed += 1;
        }
        executed
    }

    /// True while a job is queued or mid-execution.
    pub fn is_busy(&self) -> bool {
        let state = self.lock_state();
        state.running || !state.pending.is_empty()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.shared.state.lock().expect("scheduler lock poisoned")
    }
}
