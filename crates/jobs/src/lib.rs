use parking_lot::RwLock;
use sched_core::{ScheduleEnvelope, ScheduleError, ScheduleResult, Solver};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Solved { result: ScheduleResult },
    /// The input cannot be scheduled as given.
    Infeasible { message: String },
    Failed { message: String },
}

impl JobStatus {
    fn from_error(e: &anyhow::Error) -> Self {
        let message = e.to_string();
        match e.downcast_ref::<ScheduleError>() {
            Some(se) if se.is_infeasibility() => JobStatus::Infeasible { message },
            _ => JobStatus::Failed { message },
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

/// Finished jobs kept for readers before the oldest are dropped.
pub const DEFAULT_RETAINED_JOBS: usize = 1024;

#[derive(Default)]
struct Table {
    statuses: HashMap<String, JobStatus>,
    finished: VecDeque<String>,
}

impl Table {
    fn finish(&mut self, id: String, status: JobStatus, retain: usize) {
        self.statuses.insert(id.clone(), status);
        self.finished.push_back(id);
        while self.finished.len() > retain {
            if let Some(old) = self.finished.pop_front() {
                self.statuses.remove(&old);
            }
        }
    }
}

#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<Table>>,
    solver: Arc<S>,
    retain: usize,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self::with_retention(solver, DEFAULT_RETAINED_JOBS)
    }

    /// Keeps at most `retain` finished jobs; queued and running jobs are
    /// never dropped.
    pub fn with_retention(solver: S, retain: usize) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
            retain,
        }
    }

    pub fn enqueue(&self, env: ScheduleEnvelope) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner
            .write()
            .statuses
            .insert(id.clone(), JobStatus::Queued);

        let table = self.inner.clone();
        let solver = self.solver.clone();
        let retain = self.retain;
        let id_for_task = id.clone();

        tokio::spawn(async move {
            table
                .write()
                .statuses
                .insert(id_for_task.clone(), JobStatus::Running);

            // a panicking solver must still leave the job finished
            let status = match tokio::spawn(async move { solver.solve(env).await }).await {
                Ok(Ok(res)) => {
                    info!(job = %id_for_task, courses = res.assignments.len(), "job solved");
                    JobStatus::Solved { result: res }
                }
                Ok(Err(e)) => {
                    let status = JobStatus::from_error(&e);
                    if matches!(status, JobStatus::Infeasible { .. }) {
                        warn!(job = %id_for_task, error = %e, "job rejected");
                    } else {
                        error!(job = %id_for_task, ?e, "job failed");
                    }
                    status
                }
                Err(join) => {
                    error!(job = %id_for_task, error = %join, "solver task aborted");
                    JobStatus::Failed {
                        message: format!("solver task aborted: {join}"),
                    }
                }
            };
            table.write().finish(id_for_task, status, retain);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().statuses.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sched_core::CourseId;
    use std::time::Duration;
    use types::{
        AssignmentStatus, Instance, ScheduleParams, ScheduleSummary, StageTimings,
    };

    struct Scripted;

    #[async_trait]
    impl Solver for Scripted {
        async fn solve(&self, env: ScheduleEnvelope) -> anyhow::Result<ScheduleResult> {
            match env.instance.rooms.len() {
                3 => panic!("solver bug"),
                0 => Err(ScheduleError::DataInfeasibility {
                    course: CourseId::from("c1"),
                    size: 10,
                    largest_room: 0,
                }
                .into()),
                1 => Err(anyhow::anyhow!("solver crashed")),
                _ => Ok(ScheduleResult {
                    status: "solved".into(),
                    assignments: vec![],
                    declared: vec![],
                    summary: ScheduleSummary {
                        total_courses: 0,
                        candidates: 0,
                        kept_after_assignment: 0,
                        kept_declared: 0,
                        moved: 0,
                        repaired: 0,
                        assignment_status: AssignmentStatus::Optimal,
                        assignment_objective: 0.0,
                        assignment_unscheduled: 0,
                        timings: StageTimings::default(),
                    },
                }),
            }
        }
    }

    fn env_with_rooms(n: usize) -> ScheduleEnvelope {
        ScheduleEnvelope {
            instance: Instance {
                courses: vec![],
                lecturers: vec![],
                rooms: (0..n)
                    .map(|i| types::Room {
                        id: types::RoomId(format!("r{i}")),
                        capacity: 10,
                        kind: types::RoomKind::Classroom,
                    })
                    .collect(),
                timeslots: vec![],
            },
            params: ScheduleParams::default(),
        }
    }

    async fn wait(jobs: &InMemJobs<Scripted>, id: &JobId) -> JobStatus {
        for _ in 0..200 {
            if let Some(st) = jobs.get(&id.0) {
                if st.is_finished() {
                    return st;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} did not finish", id.0);
    }

    #[tokio::test]
    async fn classifies_job_outcomes() {
        let jobs = InMemJobs::new(Scripted);

        let ok = jobs.enqueue(env_with_rooms(2));
        assert!(matches!(wait(&jobs, &ok).await, JobStatus::Solved { .. }));

        let rejected = jobs.enqueue(env_with_rooms(0));
        match wait(&jobs, &rejected).await {
            JobStatus::Infeasible { message } => assert!(message.contains("c1")),
            other => panic!("unexpected status: {other:?}"),
        }

        let crashed = jobs.enqueue(env_with_rooms(1));
        assert!(matches!(wait(&jobs, &crashed).await, JobStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn panicking_solver_marks_job_failed() {
        let jobs = InMemJobs::new(Scripted);
        let id = jobs.enqueue(env_with_rooms(3));
        match wait(&jobs, &id).await {
            JobStatus::Failed { message } => assert!(message.contains("aborted")),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oldest_finished_jobs_are_dropped() {
        let jobs = InMemJobs::with_retention(Scripted, 2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let id = jobs.enqueue(env_with_rooms(2));
            wait(&jobs, &id).await;
            ids.push(id);
        }
        assert!(jobs.get(&ids[0].0).is_none());
        assert!(jobs.get(&ids[1].0).is_some());
        assert!(jobs.get(&ids[2].0).is_some());
    }

    #[test]
    fn unknown_job_is_none() {
        let jobs = InMemJobs::new(Scripted);
        assert!(jobs.get("nope").is_none());
    }
}
