//! The registry of jobs the shell is currently responsible for.
use std::{fmt, num::ParseIntError, str::FromStr};

use crate::common::MAX_JOBS;
use crate::system::interface::ProcessId;


/// Shell-local job number, always in `1..=capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u32);

impl JobId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[cfg(test)]
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(JobId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Foreground,
    Background,
    Stopped,
}

impl JobState {
    /// The `STAT` value written to the status mirror.
    pub fn status_code(&self) -> &'static str {
        match self {
            JobState::Foreground => "R+",
            JobState::Background => "R",
            JobState::Stopped => "T",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Foreground => "Foreground",
            JobState::Background => "Running",
            JobState::Stopped => "Stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Leader of the job, which is also its process group.
    pub pid: ProcessId,
    pub jid: JobId,
    pub state: JobState,
    pub command_line: String,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {} {}",
            self.jid, self.pid, self.state, self.command_line
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum JobTableError {
    Full,
    UnknownJob(ProcessId),
    DuplicatePid(ProcessId),
    /// Another job already runs in the foreground.
    ForegroundTaken(ProcessId),
}

impl fmt::Display for JobTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTableError::Full => f.write_str("Tried to create too many jobs"),
            JobTableError::UnknownJob(pid) => write!(f, "({pid}): No such process"),
            JobTableError::DuplicatePid(pid) => write!(f, "({pid}): job already exists"),
            JobTableError::ForegroundTaken(pid) => {
                write!(f, "({pid}) is already running in the foreground")
            }
        }
    }
}

/// Fixed-capacity job registry.
///
/// Jobs are kept ordered by job id. At most one job is in the [`JobState::Foreground`] state.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
    capacity: usize,
    next_jid: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::with_capacity(MAX_JOBS)
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::with_capacity(capacity),
            capacity,
            next_jid: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.capacity
    }

    /// Register a freshly launched process. Nothing changes when this fails.
    pub fn add(
        &mut self,
        pid: ProcessId,
        state: JobState,
        command_line: &str,
    ) -> Result<JobId, JobTableError> {
        if self.is_full() {
            return Err(JobTableError::Full);
        }
        if self.find_by_pid(pid).is_some() {
            return Err(JobTableError::DuplicatePid(pid));
        }
        if state == JobState::Foreground {
            if let Some(fg) = self.foreground_pid() {
                return Err(JobTableError::ForegroundTaken(fg));
            }
        }

        let jid = self.allocate_jid();
        let job = Job {
            pid,
            jid,
            state,
            command_line: command_line.to_string(),
        };
        let position = self.jobs.partition_point(|job| job.jid < jid);
        self.jobs.insert(position, job);

        Ok(jid)
    }

    fn allocate_jid(&mut self) -> JobId {
        // the table is not full, so one of `capacity` consecutive ids is free
        loop {
            if self.next_jid as usize > self.capacity {
                self.next_jid = 1;
            }
            let candidate = JobId(self.next_jid);
            self.next_jid += 1;
            if self.find_by_jid(candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Forget the job led by `pid`. Removing an unknown pid is a no-op that returns `false`.
    pub fn remove(&mut self, pid: ProcessId) -> bool {
        let Some(position) = self.jobs.iter().position(|job| job.pid == pid) else {
            return false;
        };
        self.jobs.remove(position);
        self.next_jid = self.jobs.last().map_or(0, |job| job.jid.0) + 1;
        true
    }

    pub fn find_by_pid(&self, pid: ProcessId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.pid == pid)
    }

    pub fn find_by_jid(&self, jid: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.jid == jid)
    }

    pub fn foreground_pid(&self) -> Option<ProcessId> {
        self.jobs
            .iter()
            .find(|job| job.state == JobState::Foreground)
            .map(|job| job.pid)
    }

    pub fn has_stopped_jobs(&self) -> bool {
        self.jobs.iter().any(|job| job.state == JobState::Stopped)
    }

    /// Move a job to a new state, refusing to put a second job in the foreground.
    pub fn set_state(&mut self, pid: ProcessId, state: JobState) -> Result<(), JobTableError> {
        if state == JobState::Foreground {
            if let Some(fg) = self.foreground_pid().filter(|&fg| fg != pid) {
                return Err(JobTableError::ForegroundTaken(fg));
            }
        }

        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.pid == pid)
            .ok_or(JobTableError::UnknownJob(pid))?;
        job.state = state;

        Ok(())
    }

    /// Live jobs in ascending job id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// An owned copy of [`JobTable::iter`].
    pub fn list(&self) -> Vec<Job> {
        self.jobs.clone()
    }
}
