use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bitrate::Bitrate;
use crate::error::Error;
use crate::job::JobBuilder;

/// What a batch does when one of its jobs fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    #[default]
    Abort,
    /// Record the failure and carry on with the remaining jobs.
    Continue,
}

/// One output of a compression ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rung {
    pub file_name: String,
    pub video_bitrate: Bitrate,
    pub audio_bitrate: Bitrate,
}

impl Rung {
    pub fn new(
        file_name: impl Into<String>,
        video_bitrate: Bitrate,
        audio_bitrate: Bitrate,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            video_bitrate,
            audio_bitrate,
        }
    }
}

// (output file name, video kbps, audio kbps)
const DEFAULT_RUNGS: [(&str, u64, u64); 3] = [
    ("output_50-percent.mp4", 5650, 96),
    ("output_40-percent.mp4", 4520, 80),
    ("output_30-percent.mp4", 3390, 64),
];

/// The three fixed rungs: 5650k/96k, 4520k/80k and 3390k/64k.
pub fn default_rungs() -> Vec<Rung> {
    DEFAULT_RUNGS
        .iter()
        .map(|&(name, video, audio)| {
            Rung::new(
                name,
                Bitrate::from_kbps_literal(video),
                Bitrate::from_kbps_literal(audio),
            )
        })
        .collect()
}

/// The outcome of a single job in a batch.
#[derive(Debug)]
pub struct JobOutcome {
    pub output: PathBuf,
    pub result: Result<(), Error>,
}

/// Per-job results of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.output.as_path())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// A list of jobs executed strictly one after another.
#[derive(Debug, Default)]
pub struct Batch {
    jobs: Vec<JobBuilder>,
    policy: FailurePolicy,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Appends a job. Jobs run in the order they were added.
    pub fn job(mut self, job: JobBuilder) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn jobs(&self) -> &[JobBuilder] {
        &self.jobs
    }

    /// Runs every job in order, each awaited before the next starts.
    ///
    /// # Errors
    ///
    /// With `FailurePolicy::Abort` the first job error is returned and no
    /// later job is started. With `FailurePolicy::Continue` this never
    /// fails; errors are recorded in the report instead.
    pub async fn run(self) -> Result<BatchReport, Error> {
        let total = self.jobs.len();
        let mut report = BatchReport::default();

        for (index, job) in self.jobs.into_iter().enumerate() {
            info!("Job {} of {}: {}", index + 1, total, job.output().display());
            let output = job.output().to_path_buf();

            match job.run().await {
                Ok(_) => report.outcomes.push(JobOutcome {
                    output,
                    result: Ok(()),
                }),
                Err(e) if self.policy == FailurePolicy::Abort => return Err(e),
                Err(e) => {
                    warn!("Job {} of {} failed, continuing: {}", index + 1, total, e);
                    report.outcomes.push(JobOutcome {
                        output,
                        result: Err(e),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rungs_match_fixed_ladder() {
        let rungs = default_rungs();
        let rendered: Vec<(String, String, String)> = rungs
            .iter()
            .map(|r| {
                (
                    r.file_name.clone(),
                    r.video_bitrate.to_string(),
                    r.audio_bitrate.to_string(),
                )
            })
            .collect();

        assert_eq!(
            rendered,
            vec![
                ("output_50-percent.mp4".into(), "5650k".into(), "96k".into()),
                ("output_40-percent.mp4".into(), "4520k".into(), "80k".into()),
                ("output_30-percent.mp4".into(), "3390k".into(), "64k".into()),
            ]
        );
    }

    #[test]
    fn test_default_policy_is_abort() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }

    #[test]
    fn test_jobs_keep_submission_order() {
        let batch = Batch::new()
            .job(JobBuilder::new("ffmpeg", "in.mp4", "b.mp4"))
            .job(JobBuilder::new("ffmpeg", "in.mp4", "a.mp4"));

        let outputs: Vec<&Path> = batch.jobs().iter().map(|j| j.output()).collect();
        assert_eq!(outputs, vec![Path::new("b.mp4"), Path::new("a.mp4")]);
    }

    #[tokio::test]
    async fn test_empty_batch_reports_nothing() {
        let report = Batch::new().run().await.unwrap();
        assert!(report.outcomes.is_empty());
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_continue_records_every_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.mp4");

        let report = Batch::new()
            .policy(FailurePolicy::Continue)
            .job(JobBuilder::new("ffmpeg", &missing, tmp.path().join("one.mp4")))
            .job(JobBuilder::new("ffmpeg", &missing, tmp.path().join("two.mp4")))
            .run()
            .await
            .unwrap();

        assert_eq!(report.failed().count(), 2);
        assert_eq!(report.succeeded().count(), 0);
        assert!(report
            .failed()
            .all(|o| matches!(o.result, Err(Error::InputNotFound { .. }))));
    }

    #[tokio::test]
    async fn test_abort_returns_first_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.mp4");

        let err = Batch::new()
            .job(JobBuilder::new("ffmpeg", &missing, tmp.path().join("one.mp4")))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InputNotFound { path } if path == missing));
    }
}
