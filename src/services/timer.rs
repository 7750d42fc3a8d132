//! Reminder timers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Handle for a scheduled reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(pub u64);

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Payload delivered when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub task: String,
    /// Action record the reminder belongs to
    pub record_id: Uuid,
}

/// Fire-and-forget delayed delivery of reminders.
pub trait ReminderTimer: Send + Sync {
    fn schedule(&self, at: NaiveDateTime, reminder: Reminder) -> ReminderId;
}

/// Callback invoked on the timer thread when a reminder is due.
pub type ReminderCallback = Box<dyn Fn(ReminderId, &Reminder) + Send + 'static>;

#[derive(Default)]
struct Queue {
    next_id: u64,
    /// Ordered by due time, then by id for reminders due together
    pending: BTreeMap<(NaiveDateTime, ReminderId), Reminder>,
    /// A callback is running outside the lock
    firing: bool,
    shutdown: bool,
}

impl Queue {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && !self.firing
    }
}

struct Shared {
    queue: Mutex<Queue>,
    wakeup: Condvar,
    /// Signalled when the queue drains
    idle: Condvar,
}

/// Timer backed by one background thread and a time-ordered queue.
///
/// Due times are local wall-clock times. Reminders whose time has already
/// passed fire immediately. Dropping the timer discards anything pending.
pub struct ThreadTimer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    /// Start the timer thread.
    pub fn new(callback: ReminderCallback) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            wakeup: Condvar::new(),
            idle: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("hearth-timer".to_string())
            .spawn(move || run(&worker_shared, callback))
            .map_err(|err| warn!(error = %err, "failed to start timer thread"))
            .ok();

        Self { shared, worker }
    }

    /// Cancel a pending reminder. Returns `false` if it already fired or is
    /// unknown.
    pub fn cancel(&self, id: ReminderId) -> bool {
        let mut queue = self.shared.queue.lock();
        let key = queue.pending.keys().find(|(_, key_id)| *key_id == id).copied();
        match key {
            Some(key) => {
                queue.pending.remove(&key);
                self.shared.wakeup.notify_one();
                if queue.is_idle() {
                    self.shared.idle.notify_all();
                }
                debug!(reminder = %id, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of reminders still waiting.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }

    /// Block until every pending reminder has fired or been cancelled.
    ///
    /// Returns immediately if the timer thread never started.
    pub fn wait_until_idle(&self) {
        let mut queue = self.shared.queue.lock();
        while !queue.is_idle() && !queue.shutdown && self.worker.is_some() {
            self.shared.idle.wait(&mut queue);
        }
    }
}

impl ReminderTimer for ThreadTimer {
    fn schedule(&self, at: NaiveDateTime, reminder: Reminder) -> ReminderId {
        let mut queue = self.shared.queue.lock();
        queue.next_id += 1;
        let id = ReminderId(queue.next_id);
        info!(reminder = %id, task = %reminder.task, %at, "reminder scheduled");
        queue.pending.insert((at, id), reminder);
        self.shared.wakeup.notify_one();
        id
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.shared.queue.lock().shutdown = true;
        self.shared.wakeup.notify_one();
        self.shared.idle.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl fmt::Debug for ThreadTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTimer")
            .field("pending", &self.pending())
            .finish()
    }
}

fn run(shared: &Shared, callback: ReminderCallback) {
    let mut queue = shared.queue.lock();
    loop {
        if queue.shutdown {
            return;
        }

        let now = Local::now().naive_local();
        let next = queue.pending.keys().next().copied();
        match next {
            Some(key @ (at, id)) if at <= now => {
                let due = queue.pending.remove(&key);
                if let Some(reminder) = due {
                    queue.firing = true;
                    // Fire without holding the lock so callbacks may schedule.
                    drop(queue);
                    info!(reminder = %id, task = %reminder.task, "reminder due");
                    callback(id, &reminder);
                    queue = shared.queue.lock();
                    queue.firing = false;
                    if queue.is_idle() {
                        shared.idle.notify_all();
                    }
                }
            }
            Some((at, _)) => {
                let wait = (at - now).to_std().unwrap_or(Duration::ZERO);
                shared.wakeup.wait_for(&mut queue, wait);
            }
            None => shared.wakeup.wait(&mut queue),
        }
    }
}

/// Timer that records what it was asked to schedule and never fires.
#[derive(Debug, Default)]
pub struct RecordingTimer {
    scheduled: Mutex<Vec<(ReminderId, NaiveDateTime, Reminder)>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<(ReminderId, NaiveDateTime, Reminder)> {
        self.scheduled.lock().clone()
    }
}

impl ReminderTimer for RecordingTimer {
    fn schedule(&self, at: NaiveDateTime, reminder: Reminder) -> ReminderId {
        let mut scheduled = self.scheduled.lock();
        let id = ReminderId(scheduled.len() as u64 + 1);
        scheduled.push((id, at, reminder));
        id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use chrono::TimeDelta;

    use super::*;

    fn reminder(task: &str) -> Reminder {
        Reminder {
            task: task.to_string(),
            record_id: Uuid::new_v4(),
        }
    }

    fn channel_timer() -> (ThreadTimer, mpsc::Receiver<(ReminderId, String)>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let timer = ThreadTimer::new(Box::new(move |id: ReminderId, reminder: &Reminder| {
            let _ = tx.lock().send((id, reminder.task.clone()));
        }));
        (timer, rx)
    }

    #[test]
    fn test_reminder_id_display() {
        assert_eq!(ReminderId(7).to_string(), "R7");
    }

    #[test]
    fn test_fires_in_due_order() {
        let (timer, rx) = channel_timer();
        let now = Local::now().naive_local();
        let later = timer.schedule(now + TimeDelta::milliseconds(80), reminder("second"));
        let sooner = timer.schedule(now - TimeDelta::seconds(1), reminder("first"));

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), (sooner, "first".to_string()));
        assert_eq!(rx.recv_timeout(timeout).unwrap(), (later, "second".to_string()));
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn test_cancel() {
        let (timer, rx) = channel_timer();
        let at = Local::now().naive_local() + TimeDelta::hours(1);
        let id = timer.schedule(at, reminder("water the plants"));
        assert_eq!(timer.pending(), 1);

        assert!(timer.cancel(id));
        assert!(!timer.cancel(id));
        assert_eq!(timer.pending(), 0);
        drop(timer);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_wait_until_idle() {
        let (timer, rx) = channel_timer();
        timer.wait_until_idle();

        let at = Local::now().naive_local() + TimeDelta::milliseconds(50);
        let id = timer.schedule(at, reminder("feed the cat"));
        timer.wait_until_idle();

        assert_eq!(timer.pending(), 0);
        assert_eq!(rx.try_recv().unwrap(), (id, "feed the cat".to_string()));
    }

    #[test]
    fn test_wait_until_idle_after_cancel() {
        let (timer, rx) = channel_timer();
        let at = Local::now().naive_local() + TimeDelta::hours(1);
        let id = timer.schedule(at, reminder("water the plants"));

        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(50));
                assert!(timer.cancel(id));
            });
            timer.wait_until_idle();
        });
        assert_eq!(timer.pending(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_recording_timer() {
        let timer = RecordingTimer::new();
        let at = Local::now().naive_local();
        assert_eq!(timer.schedule(at, reminder("a")), ReminderId(1));
        assert_eq!(timer.schedule(at, reminder("b")), ReminderId(2));
        assert_eq!(timer.scheduled().len(), 2);
    }
}
