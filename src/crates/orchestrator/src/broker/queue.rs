//! FIFO job queue with competing-consumer claims

use super::{BrokerError, Job};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// In-memory FIFO queue
///
/// `claim` hands each job to exactly one caller: the pop happens under the
/// queue lock, so concurrent claimers can never receive the same job. A job
/// claimed by a worker that then dies is lost; there is no re-queue or ack
/// protocol (a visibility-timeout scheme is the production extension).
#[derive(Clone)]
pub struct JobQueue {
    jobs: Arc<Mutex<VecDeque<Job>>>,
    notify: Arc<Notify>,
    open: Arc<AtomicBool>,
}

impl JobQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether the queue accepts new jobs
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Jobs currently waiting
    pub fn depth(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Append a job; fails fast when the queue is shut down
    pub fn enqueue(&self, job: Job) -> Result<(), BrokerError> {
        if !self.is_open() {
            return Err(BrokerError::Unavailable);
        }
        self.jobs.lock().push_back(job);
        self.notify.notify_one();
        Ok(())
    }

    /// Block up to `timeout` for the next job, FIFO order
    pub async fn claim(&self, timeout: Duration) -> Option<Job> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(job) = self.jobs.lock().pop_front() {
                return Some(job);
            }
            if !self.is_open() {
                return None;
            }

            let remaining = deadline.checked_duration_since(Instant::now())?;
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(remaining) => {
                    // Last chance: a job may have landed right at the deadline.
                    return self.jobs.lock().pop_front();
                }
            }
        }
    }

    /// Stop accepting jobs and wake blocked claimers
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = JobQueue::new();
        queue.enqueue(Job::new("r1", "s", "first")).unwrap();
        queue.enqueue(Job::new("r2", "s", "second")).unwrap();

        let a = queue.claim(Duration::from_millis(50)).await.unwrap();
        let b = queue.claim(Duration::from_millis(50)).await.unwrap();
        assert_eq!(a.request_id, "r1");
        assert_eq!(b.request_id, "r2");
    }

    #[tokio::test]
    async fn test_claim_times_out_when_empty() {
        let queue = JobQueue::new();
        let job = queue.claim(Duration::from_millis(20)).await;
        assert!(job.is_none());
    }

    #[tokio::test]
    async fn test_claim_wakes_on_enqueue() {
        let queue = JobQueue::new();
        let claimer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.claim(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.enqueue(Job::new("r1", "s", "q")).unwrap();

        let job = claimer.await.unwrap();
        assert_eq!(job.unwrap().request_id, "r1");
    }

    #[tokio::test]
    async fn test_contended_claims_are_exclusive() {
        let queue = JobQueue::new();
        for i in 0..20 {
            queue.enqueue(Job::new(format!("r{}", i), "s", "q")).unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(job) = queue.claim(Duration::from_millis(20)).await {
                    claimed.push(job.request_id);
                }
                claimed
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        // Every job claimed exactly once.
        assert_eq!(all.len(), 20);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_enqueue() {
        let queue = JobQueue::new();
        queue.close();
        let err = queue.enqueue(Job::new("r1", "s", "q")).unwrap_err();
        assert!(matches!(err, BrokerError::Unavailable));
    }
}
