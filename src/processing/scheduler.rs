/*! Date range scheduling

Jobs are queued up front, then a fixed number of workers take them one at a time. Each worker sends
a [ProcessSummary] per job; the summary channel closes when the last worker is done, after which
the [Report] is complete.
!*/
use std::fmt;
use std::sync::Arc;

use log::{debug, error};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::processing::job::{ArchiveJob, JobDate, ProcessSummary};
use crate::processing::search::Searcher;

pub struct Scheduler {
    searcher: Arc<Searcher>,
    workers: usize,
}

impl Scheduler {
    /// Pool size is taken from the searcher's configuration.
    pub fn new(searcher: Arc<Searcher>) -> Self {
        let workers = searcher.config().workers();
        Self { searcher, workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job, returning once all of them have been processed.
    pub async fn run(&self, jobs: Vec<ArchiveJob>) -> Report {
        let capacity = jobs.len().max(1);
        let (job_tx, job_rx) = mpsc::channel::<ArchiveJob>(capacity);
        let (summary_tx, mut summary_rx) = mpsc::channel::<ProcessSummary>(capacity);

        for job in jobs {
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            let job_rx = job_rx.clone();
            let summary_tx = summary_tx.clone();
            let searcher = self.searcher.clone();

            workers.spawn(async move {
                loop {
                    let job = job_rx.lock().await.recv().await;
                    let job = match job {
                        Some(job) => job,
                        None => break,
                    };

                    debug!("worker {} processing {}", id, job.date());
                    let result = searcher.run(&job).await;
                    if summary_tx
                        .send(ProcessSummary::new(job.date(), result))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                debug!("worker {} done", id);
            });
        }
        drop(summary_tx);

        let mut report = Report::default();
        while let Some(summary) = summary_rx.recv().await {
            summary.log();
            report.push(summary);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("[ERROR]: worker failed: {}", e);
            }
        }

        report
    }
}

/// Outcome of a ranged run, in completion order.
#[derive(Debug, Default)]
pub struct Report {
    succeeded: Vec<JobDate>,
    failed: Vec<ProcessSummary>,
}

impl Report {
    pub fn push(&mut self, summary: ProcessSummary) {
        if summary.error.is_some() {
            self.failed.push(summary);
        } else {
            self.succeeded.push(summary.date);
        }
    }

    pub fn succeeded(&self) -> &[JobDate] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[ProcessSummary] {
        &self.failed
    }

    /// Number of processed jobs.
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Final Summary ===")?;
        writeln!(f, "Successfully processed dates: {}", self.succeeded.len())?;
        if !self.failed.is_empty() {
            writeln!(f, "Failed dates: {}", self.failed.len())?;
            writeln!(f, "\nFailed dates details:")?;
            for summary in &self.failed {
                match &summary.error {
                    Some(e) => writeln!(f, "- {}: {}", summary.date, e)?,
                    None => writeln!(f, "- {}", summary.date)?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::NaiveDate;

    #[test]
    fn report_display() {
        let day = JobDate::Day(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        let mut report = Report::default();
        report.push(ProcessSummary::new(JobDate::Latest, Ok(())));
        report.push(ProcessSummary::new(
            day,
            Err(Error::NotFound("2020-01-02".to_string())),
        ));

        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded(), &[JobDate::Latest]);
        let shown = report.to_string();
        assert!(shown.contains("Successfully processed dates: 1"));
        assert!(shown.contains("Failed dates: 1"));
        assert!(shown.contains("- 2020-01-02: no archive found for date 2020-01-02"));
    }
}
