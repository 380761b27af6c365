//! Job tracking for background forecasts.
//!
//! In-memory store of job status and progress logs. Handlers create a job,
//! spawn the work and return the id; clients poll the job or follow its logs
//! over SSE.
//!
//! Finished jobs are kept up to a fixed count; the oldest are evicted when a
//! new job is created. Running jobs are never evicted.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Finished jobs retained by default.
pub const DEFAULT_MAX_FINISHED_JOBS: usize = 100;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// Job metadata and logs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub job_id: String,
    /// What the job works on, e.g. the series id of a forecast.
    pub label: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Serialized output of a completed job.
    pub result: Option<serde_json::Value>,
}

impl Job {
    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Running
    }
}

#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    max_finished: usize,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_MAX_FINISHED_JOBS)
    }

    /// Tracker that keeps at most `max_finished` completed or failed jobs.
    pub fn with_retention(max_finished: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            max_finished,
        }
    }

    /// Register a running job and return its id.
    pub fn create_job(&self, label: impl Into<String>) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            label: label.into(),
            status: JobStatus::Running,
            logs: vec![],
            created_at: chrono::Utc::now(),
            completed_at: None,
            result: None,
        };
        let mut jobs = self.jobs.write();
        evict_finished(&mut jobs, self.max_finished);
        jobs.insert(job_id.clone(), job);
        job_id
    }

    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Mark a job as completed with optional result.
    pub fn complete_job(&self, job_id: &str, result: Option<serde_json::Value>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(chrono::Utc::now());
            job.result = result;
        }
    }

    /// Mark a job as failed; the message becomes its last log entry.
    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = JobStatus::Failed;
            job.completed_at = Some(chrono::Utc::now());
            job.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level: LogLevel::Error,
                message: error_message.into(),
            });
        }
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    pub fn get_logs(&self, job_id: &str) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }

    /// All jobs, newest first.
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}

/// Drop the oldest finished jobs beyond `keep`.
fn evict_finished(jobs: &mut HashMap<String, Job>, keep: usize) {
    let mut finished: Vec<(chrono::DateTime<chrono::Utc>, String)> = jobs
        .values()
        .filter(|job| job.is_finished())
        .map(|job| (job.completed_at.unwrap_or(job.created_at), job.job_id.clone()))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort();
    let excess = finished.len() - keep;
    for (_, job_id) in finished.into_iter().take(excess) {
        jobs.remove(&job_id);
    }
    log::debug!("Evicted {} finished jobs", excess);
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let tracker = JobTracker::new();
        let id = tracker.create_job("W01__Dengue");

        let job = tracker.get_job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.label, "W01__Dengue");
        assert!(!job.is_finished());

        tracker.log(&id, LogLevel::Info, "Fitting model...");
        tracker.complete_job(&id, Some(serde_json::json!({ "points": 12 })));

        let job = tracker.get_job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());
        assert_eq!(job.result.unwrap()["points"], 12);
        assert_eq!(tracker.get_logs(&id).len(), 1);
    }

    #[test]
    fn test_failed_job_logs_error() {
        let tracker = JobTracker::new();
        let id = tracker.create_job("x");
        tracker.fail_job(&id, "boom");

        let logs = tracker.get_logs(&id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Error);
        assert_eq!(tracker.get_job(&id).unwrap().status, JobStatus::Failed);
    }

    #[test]
    fn test_unknown_job() {
        let tracker = JobTracker::default();
        tracker.log("missing", LogLevel::Info, "ignored");
        assert!(tracker.get_job("missing").is_none());
        assert!(tracker.get_logs("missing").is_empty());
    }

    #[test]
    fn test_finished_jobs_are_evicted_oldest_first() {
        let tracker = JobTracker::with_retention(2);
        let running = tracker.create_job("running");

        let mut finished = Vec::new();
        for label in ["a", "b", "c"] {
            let id = tracker.create_job(label);
            tracker.complete_job(&id, Some(serde_json::json!({ "label": label })));
            finished.push(id);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        // Eviction runs on the next creation.
        let newest = tracker.create_job("d");

        assert!(tracker.get_job(&finished[0]).is_none());
        assert!(tracker.get_job(&finished[1]).is_some());
        assert!(tracker.get_job(&finished[2]).is_some());
        assert!(tracker.get_job(&running).is_some());
        assert!(tracker.get_job(&newest).is_some());
        assert_eq!(tracker.list_jobs().len(), 4);
    }

    #[test]
    fn test_running_jobs_are_kept() {
        let tracker = JobTracker::with_retention(0);
        let ids: Vec<String> = (0..5).map(|i| tracker.create_job(i.to_string())).collect();
        assert!(ids.iter().all(|id| tracker.get_job(id).is_some()));

        tracker.fail_job(&ids[0], "boom");
        tracker.create_job("next");
        assert!(tracker.get_job(&ids[0]).is_none());
        assert_eq!(tracker.list_jobs().len(), 5);
    }

    #[test]
    fn test_list_jobs() {
        let tracker = JobTracker::new();
        tracker.create_job("a");
        tracker.create_job("b");
        assert_eq!(tracker.list_jobs().len(), 2);
    }
}
