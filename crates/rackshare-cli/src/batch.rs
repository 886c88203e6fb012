//! Batch decoding on a fixed worker pool.
//!
//! Jobs are queued on a channel and picked up by `jobs` worker threads. Each
//! decode runs on a thread of its own while the worker waits for it with a
//! deadline; a decode that misses the deadline is reported as failed and
//! left to finish in the background.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, unbounded, RecvTimeoutError};
use rackshare_adg::{RackAnalysis, RackFileDecoder};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// One file to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    /// Display name override; the file stem is used otherwise
    pub display_name: Option<String>,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            display_name: None,
        }
    }
}

/// Pool size and per-file budget.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub jobs: usize,
    pub timeout: Duration,
}

/// Result for one job.
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub path: PathBuf,
    pub elapsed: Duration,
    pub result: Result<T>,
}

impl<T> FileOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Decode every job with `decoder`. Outcomes come back in job order.
pub fn analyze_all(
    decoder: &RackFileDecoder,
    jobs: Vec<Job>,
    options: BatchOptions,
) -> Vec<FileOutcome<RackAnalysis>> {
    let decoder = decoder.clone();
    run_jobs(jobs, options, move |job: &Job| {
        decoder
            .analyze_file(&job.path, job.display_name.as_deref())
            .map_err(Error::from)
    })
}

/// Run `work` for every job on the pool. Outcomes come back in job order.
pub fn run_jobs<T, F>(jobs: Vec<Job>, options: BatchOptions, work: F) -> Vec<FileOutcome<T>>
where
    T: Send + 'static,
    F: Fn(&Job) -> Result<T> + Send + Sync + 'static,
{
    let total = jobs.len();
    if total == 0 {
        return Vec::new();
    }

    let work = Arc::new(work);
    let (job_tx, job_rx) = unbounded::<(usize, Job)>();
    let (result_tx, result_rx) = unbounded::<(usize, FileOutcome<T>)>();

    for entry in jobs.into_iter().enumerate() {
        // Receiver is still held here, so the send cannot fail
        let _ = job_tx.send(entry);
    }
    drop(job_tx);

    let workers = options.jobs.clamp(1, total);
    log::debug!("Decoding {} files on {} workers", total, workers);

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let work = Arc::clone(&work);
            let timeout = options.timeout;
            thread::spawn(move || {
                for (index, job) in job_rx.iter() {
                    let outcome = run_one(&work, job, timeout);
                    if result_tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    drop(result_tx);

    let mut slots: Vec<Option<FileOutcome<T>>> = (0..total).map(|_| None).collect();
    for (index, outcome) in result_rx.iter() {
        slots[index] = Some(outcome);
    }
    for handle in handles {
        if handle.join().is_err() {
            log::error!("Batch worker thread panicked");
        }
    }

    slots.into_iter().flatten().collect()
}

fn run_one<T, F>(work: &Arc<F>, job: Job, timeout: Duration) -> FileOutcome<T>
where
    T: Send + 'static,
    F: Fn(&Job) -> Result<T> + Send + Sync + 'static,
{
    let started = Instant::now();
    let (done_tx, done_rx) = bounded(1);

    let decode_job = job.clone();
    let work = Arc::clone(work);
    thread::spawn(move || {
        let _ = done_tx.send(work(&decode_job));
    });

    let result = match done_rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!(
                "{}: still decoding after {:?}, giving up",
                job.path.display(),
                timeout
            );
            Err(Error::TimedOut {
                path: job.path.clone(),
                secs: timeout.as_secs(),
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(Error::DecodePanicked(job.path.clone())),
    };

    FileOutcome {
        path: job.path,
        elapsed: started.elapsed(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(jobs: usize, timeout: Duration) -> BatchOptions {
        BatchOptions { jobs, timeout }
    }

    fn jobs(names: &[&str]) -> Vec<Job> {
        names.iter().map(|n| Job::new(*n)).collect()
    }

    #[test]
    fn test_keeps_job_order() {
        let names: Vec<String> = (0..20).map(|i| format!("rack{}.adg", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let outcomes = run_jobs(jobs(&refs), options(4, Duration::from_secs(5)), |job: &Job| {
            Ok(job.path.display().to_string())
        });

        let got: Vec<String> = outcomes.into_iter().map(|o| o.result.unwrap()).collect();
        assert_eq!(got, names);
    }

    #[test]
    fn test_slow_decode_times_out() {
        let outcomes = run_jobs(
            jobs(&["fast.adg", "slow.adg"]),
            options(2, Duration::from_millis(100)),
            |job: &Job| {
                if job.path.ends_with("slow.adg") {
                    thread::sleep(Duration::from_secs(2));
                }
                Ok(())
            },
        );

        assert!(outcomes[0].is_ok());
        let err = outcomes[1].result.as_ref().unwrap_err();
        assert!(matches!(err, Error::TimedOut { .. }));
        assert!(err.to_string().contains("exceeded time budget"));
    }

    #[test]
    fn test_panicking_decode_is_reported() {
        let outcomes = run_jobs(
            jobs(&["boom.adg", "fine.adg"]),
            options(1, Duration::from_secs(5)),
            |job: &Job| {
                if job.path.ends_with("boom.adg") {
                    panic!("decoder bug");
                }
                Ok(1)
            },
        );

        assert!(matches!(outcomes[0].result, Err(Error::DecodePanicked(_))));
        assert_eq!(*outcomes[1].result.as_ref().unwrap(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let outcomes = run_jobs(Vec::new(), options(4, Duration::from_secs(1)), |_: &Job| Ok(()));
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_missing_files_fail_individually() {
        let decoder = RackFileDecoder::default();
        let outcomes = analyze_all(
            &decoder,
            jobs(&["/nonexistent/a.adg", "/nonexistent/b.adg"]),
            options(2, Duration::from_secs(5)),
        );
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(o.result, Err(Error::Analyzer(_)))));
    }
}
