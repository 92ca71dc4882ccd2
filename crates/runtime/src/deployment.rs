//! Create-version, poll, deploy
//!
//! Uploading code creates an asynchronous task on the server. The orchestrator
//! polls the task until it leaves `processing` and, when it completed and the
//! caller asked for it, deploys the version the task produced.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::{COMPATIBILITY_DATE, DEFAULT_POLL_INTERVAL_SECS};
use crate::deps::{AsyncRuntime, FunctionsApi};
use crate::error::{GliaError, Result};
use crate::types::{
    DeploymentTask, EnvironmentVariables, Session, TaskStatus, VersionRequest, task_reference,
};

/// How often and how long to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between polls
    pub interval: Duration,
    /// Give up after this many polls; `None` polls until a terminal status
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Cap the number of polls
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Terminal classification of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Version built successfully
    Completed,
    /// Server reported a failure
    Failed,
    /// Any other terminal status
    Unknown(String),
}

impl From<&TaskStatus> for TaskOutcome {
    fn from(status: &TaskStatus) -> Self {
        match status {
            TaskStatus::Completed => Self::Completed,
            TaskStatus::Failed => Self::Failed,
            other => Self::Unknown(other.as_str().to_string()),
        }
    }
}

/// What to upload
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    /// Target function
    pub function_id: String,
    /// Bundled code
    pub code: String,
    /// Environment variables for the new version
    pub environment_variables: EnvironmentVariables,
    /// Deploy the version once it is built
    pub deploy: bool,
}

impl DeploymentRequest {
    fn version_request(&self) -> VersionRequest {
        VersionRequest {
            code: self.code.clone(),
            environment_variables: self.environment_variables.clone(),
            compatibility_date: COMPATIBILITY_DATE.to_string(),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentOutcome {
    /// Task reference that was polled
    pub task_reference: String,
    /// Final task document
    pub task: DeploymentTask,
    /// Version produced by the task
    pub version_id: String,
    /// Deployment response, when a deploy was requested
    pub deployment: Option<Value>,
    /// Number of polls performed
    pub polls: u32,
}

/// Progress notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentProgress {
    /// Version upload accepted
    Submitted {
        /// Task reference
        reference: String,
    },
    /// A poll returned
    Polled {
        /// 1-based poll number
        attempt: u32,
        /// Status reported by the poll
        status: String,
    },
    /// Deploying the built version
    Deploying {
        /// Version being deployed
        version_id: String,
    },
}

/// Receives progress notifications
pub trait DeploymentObserver: Send + Sync {
    /// Called for each progress step
    fn on_progress(&self, progress: &DeploymentProgress);
}

/// Observer that ignores everything
pub struct NoopObserver;

impl DeploymentObserver for NoopObserver {
    fn on_progress(&self, _progress: &DeploymentProgress) {}
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(GliaError::Cancelled),
        result = future => result,
    }
}

/// Drives version creation, task polling and deployment
pub struct DeploymentOrchestrator {
    api: Arc<dyn FunctionsApi>,
    runtime: Arc<dyn AsyncRuntime>,
    policy: PollPolicy,
}

impl DeploymentOrchestrator {
    /// New orchestrator
    pub fn new(
        api: Arc<dyn FunctionsApi>,
        runtime: Arc<dyn AsyncRuntime>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            api,
            runtime,
            policy,
        }
    }

    /// Upload the version and return the task reference
    pub async fn submit(&self, session: &Session, request: &DeploymentRequest) -> Result<String> {
        let body = request.version_request();
        let response = self
            .api
            .create_version(session, &request.function_id, &body)
            .await?;
        task_reference(&response).ok_or_else(|| GliaError::TaskFailed {
            status: "unknown".to_string(),
            detail: "create version response carries no task reference".to_string(),
        })
    }

    /// Poll until the task leaves `processing`.
    ///
    /// Returns the terminal task and the number of polls made.
    pub async fn wait_for_task(
        &self,
        session: &Session,
        reference: &str,
        cancel: &CancellationToken,
        observer: &dyn DeploymentObserver,
    ) -> Result<(DeploymentTask, u32)> {
        let mut attempts: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(GliaError::Cancelled);
            }

            let task = cancellable(cancel, self.api.get_task(session, reference)).await?;
            attempts += 1;
            tracing::debug!("Task {} poll {}: {}", reference, attempts, task.status);
            observer.on_progress(&DeploymentProgress::Polled {
                attempt: attempts,
                status: task.status.to_string(),
            });

            if !task.status.is_processing() {
                return Ok((task, attempts));
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(GliaError::PollTimeout { attempts });
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(GliaError::Cancelled),
                () = self.runtime.sleep(self.policy.interval) => {}
            }
        }
    }

    /// Full flow: submit, poll, then deploy when requested.
    pub async fn run(
        &self,
        session: &Session,
        request: &DeploymentRequest,
        cancel: &CancellationToken,
        observer: &dyn DeploymentObserver,
    ) -> Result<DeploymentOutcome> {
        let reference = cancellable(cancel, self.submit(session, request)).await?;
        tracing::info!("Version submitted for {}, task {}", request.function_id, reference);
        observer.on_progress(&DeploymentProgress::Submitted {
            reference: reference.clone(),
        });

        let (task, polls) = self
            .wait_for_task(session, &reference, cancel, observer)
            .await?;

        match TaskOutcome::from(&task.status) {
            TaskOutcome::Completed => {}
            TaskOutcome::Failed => {
                return Err(GliaError::TaskFailed {
                    status: "failed".to_string(),
                    detail: task.error_detail(),
                });
            }
            TaskOutcome::Unknown(status) => {
                return Err(GliaError::TaskFailed {
                    status,
                    detail: "unexpected terminal status".to_string(),
                });
            }
        }

        let version_id = task.version_id().ok_or_else(|| GliaError::TaskFailed {
            status: "completed".to_string(),
            detail: "task result carries no version id".to_string(),
        })?;

        let deployment = if request.deploy {
            observer.on_progress(&DeploymentProgress::Deploying {
                version_id: version_id.clone(),
            });
            let response = cancellable(
                cancel,
                self.api
                    .deploy_version(session, &request.function_id, &version_id),
            )
            .await?;
            tracing::info!("Deployed version {} of {}", version_id, request.function_id);
            Some(response)
        } else {
            None
        };

        Ok(DeploymentOutcome {
            task_reference: reference,
            task,
            version_id,
            deployment,
            polls,
        })
    }
}

#[cfg(test)]
#[path = "deployment_tests.rs"]
mod tests;
