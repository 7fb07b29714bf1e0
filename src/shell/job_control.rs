//! The job-control engine: what happens when a child changes state or the user asks to interrupt
//! or suspend the foreground job.
use std::io;

use crate::common::ShellContext;
use crate::jobs::{JobState, JobTable};
use crate::log::{dev_debug, dev_warn, trace_info, user_warn};
use crate::procfs::{ProcessStatus, StatusMirror};
use crate::system::{
    fatal_raw,
    interface::ProcessId,
    killpg,
    signal::{consts::*, signal_name, SignalNumber},
    wait::{Wait, WaitError, WaitOptions, WaitStatus},
};

/// What the control loop should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Delivers a signal to every process of a job.
pub trait GroupSignaller {
    fn signal_group(&mut self, pgid: ProcessId, signal: SignalNumber) -> io::Result<()>;
}

/// Signals process groups with `killpg(3)`.
pub struct Killpg;

impl GroupSignaller for Killpg {
    fn signal_group(&mut self, pgid: ProcessId, signal: SignalNumber) -> io::Result<()> {
        killpg(pgid, signal)
    }
}

pub struct JobControl<S: GroupSignaller = Killpg> {
    table: JobTable,
    signaller: S,
    mirror: StatusMirror,
    last_reaped: Option<ProcessId>,
}

impl<S: GroupSignaller> JobControl<S> {
    pub fn new(mirror: StatusMirror, signaller: S) -> Self {
        Self {
            table: JobTable::new(),
            signaller,
            mirror,
            last_reaped: None,
        }
    }

    pub fn table(&self) -> &JobTable {
        &self.table
    }

    pub(super) fn table_mut(&mut self) -> &mut JobTable {
        &mut self.table
    }

    pub(super) fn mirror(&self) -> &StatusMirror {
        &self.mirror
    }

    #[cfg(test)]
    pub(super) fn signaller(&self) -> &S {
        &self.signaller
    }

    /// The job that was reaped most recently.
    ///
    /// The foreground wait does not rely on this: it returns once the table has no foreground
    /// job, which also covers a job that was stopped rather than reaped.
    pub fn last_reaped(&self) -> Option<ProcessId> {
        self.last_reaped
    }

    pub(super) fn signal_group(&mut self, pgid: ProcessId, signal: SignalNumber) -> io::Result<()> {
        self.signaller.signal_group(pgid, signal)
    }

    /// Run the logical handler for a signal the shell received.
    pub fn handle_signal(&mut self, signal: SignalNumber) -> Flow {
        dev_debug!("received {}", signal_name(signal));
        match signal {
            SIGCHLD => self.reap_children(),
            SIGINT => self.on_interrupt(),
            SIGTSTP => self.on_stop(),
            SIGQUIT => {
                println_ignore_io_error!("Terminating after receipt of SIGQUIT signal");
                return Flow::Exit(1);
            }
            _ => dev_warn!("unexpected signal {}", signal_name(signal)),
        }
        Flow::Continue
    }

    /// Collect every child status change that is available right now.
    ///
    /// A single `SIGCHLD` may stand for several children, so this keeps going until the kernel
    /// has nothing left to report.
    pub fn reap_children(&mut self) {
        loop {
            let options = WaitOptions::new().no_hang().untraced().continued();
            match ProcessId::ANY_CHILD.wait(options) {
                Ok((pid, status)) => self.on_child_status(pid, status),
                Err(WaitError::NotReady) => break,
                Err(err) if err.is_no_children() => break,
                Err(WaitError::Io(err)) => {
                    fatal_raw(&format!("waitpid error: {err}"));
                }
            }
        }
    }

    /// Apply a single status change of `pid` to the job table.
    pub fn on_child_status(&mut self, pid: ProcessId, status: WaitStatus) {
        let Some(job) = self.table.find_by_pid(pid) else {
            dev_debug!("status of unknown child {pid}: {status:?}");
            return;
        };
        let (jid, state) = (job.jid, job.state);

        if status.did_terminate() {
            if let Some(signal) = status.term_signal() {
                println_ignore_io_error!("Job [{jid}] ({pid}) terminated by signal {signal}");
            } else {
                trace_info!("Job [{jid}] ({pid}) exited with status {status:?}");
            }
            self.table.remove(pid);
            self.last_reaped = Some(pid);
            if let Err(err) = self.mirror.remove_status(pid) {
                user_warn!("{err}");
            }
        } else if let Some(signal) = status.stop_signal() {
            println_ignore_io_error!("Job [{jid}] ({pid}) stopped by signal {signal}");
            self.set_state(pid, JobState::Stopped);
        } else if status.did_continue() && state == JobState::Stopped {
            // resumed by someone other than `fg` or `bg`
            self.set_state(pid, JobState::Background);
        }
    }

    /// Forward an interrupt to the foreground job. Its removal happens once it is reaped.
    pub fn on_interrupt(&mut self) {
        let Some(fg) = self.table.foreground_pid() else {
            return;
        };
        if let Err(err) = self.signaller.signal_group(fg, SIGINT) {
            dev_warn!("cannot interrupt job {fg}: {err}");
        }
    }

    /// Suspend the foreground job, which frees the foreground slot right away.
    pub fn on_stop(&mut self) {
        let Some(fg) = self.table.foreground_pid() else {
            return;
        };
        if let Err(err) = self.signaller.signal_group(fg, SIGTSTP) {
            dev_warn!("cannot stop job {fg}: {err}");
        }
        self.set_state(fg, JobState::Stopped);
    }

    /// Change the state of a job and mirror the new state. Failures are only logged.
    pub(super) fn set_state(&mut self, pid: ProcessId, state: JobState) {
        match self.table.set_state(pid, state) {
            Ok(()) => {
                if let Err(err) = self.mirror.update_state(pid, state.status_code()) {
                    user_warn!("{err}");
                }
            }
            Err(err) => dev_warn!("cannot change state of {pid}: {err}"),
        }
    }

    /// Write the status record of a job that was just registered.
    pub(super) fn record_job(&self, context: &ShellContext, pid: ProcessId, name: &str) {
        let Some(job) = self.table.find_by_pid(pid) else {
            return;
        };
        let status = ProcessStatus {
            name,
            pid,
            parent_pid: context.session_leader(),
            group_id: pid,
            session_id: context.session_leader(),
            state: job.state.status_code(),
            user: &context.user,
        };
        if let Err(err) = self.mirror.record_status(&status) {
            user_warn!("{err}");
        }
    }
}
