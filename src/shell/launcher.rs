use std::{io::Write, os::unix::process::CommandExt, process::Command};

use crate::common::{Error, ShellContext};
use crate::jobs::{JobId, JobState};
use crate::log::{dev_info, dev_warn, trace_info, user_error};
use crate::system::{
    _exit, fork, interface::ProcessId, killpg, setpgid, signal::consts::*,
    signal::SignalHandler, signal::SignalSet, ForkResult,
};

use super::job_control::{GroupSignaller, JobControl};
use super::parser::ParsedLine;
use super::signals::{BlockedJobSignals, HANDLED_SIGNALS};

/// Exit status of a child whose program could not be started.
const COMMAND_NOT_FOUND: libc::c_int = 127;

/// Start `line` as a new job in its own process group and register it.
///
/// Returns the pid and job id of the new job, or `None` when the job table has no room left. A
/// program that cannot be executed still becomes a job: the child reports the problem and exits.
pub fn launch<S: GroupSignaller>(
    control: &mut JobControl<S>,
    context: &ShellContext,
    line: &ParsedLine,
    command_line: &str,
) -> Result<Option<(ProcessId, JobId)>, Error> {
    if control.table().is_full() {
        user_error!("Tried to create too many jobs");
        return Ok(None);
    }

    // whatever is still buffered would otherwise be written by both processes
    std::io::stdout().flush().ok();

    // no status change of the child may be handled before it is in the table
    let blocked = BlockedJobSignals::block().map_err(Error::SignalSetup)?;

    let ForkResult::Parent(pid) = fork().map_err(Error::Fork)? else {
        exec_child(&line.argv, blocked.previous());
    };

    // the child does the same; whichever runs first wins and the other call may fail
    if let Err(err) = setpgid(pid, pid) {
        dev_info!("setpgid for {pid} from the parent: {err}");
    }

    let state = if line.background {
        JobState::Background
    } else {
        JobState::Foreground
    };

    let jid = match control.table_mut().add(pid, state, command_line) {
        Ok(jid) => jid,
        Err(err) => {
            user_error!("{err}");
            if let Err(err) = killpg(pid, SIGKILL) {
                dev_warn!("cannot kill unregistered job {pid}: {err}");
            }
            return Ok(None);
        }
    };
    control.record_job(context, pid, &line.argv[0]);
    trace_info!("Added job [{jid}] {pid} {command_line}");

    drop(blocked);

    if line.background {
        println_ignore_io_error!("[{jid}] ({pid}) {command_line}");
    }

    Ok(Some((pid, jid)))
}

/// Replace the forked child with the requested program. Never returns.
fn exec_child(argv: &[String], original_mask: &SignalSet) -> ! {
    if let Err(err) = setpgid(ProcessId::new(0), ProcessId::new(0)) {
        dev_warn!("cannot create process group: {err}");
    }
    if let Err(err) = SignalHandler::reset_to_default(&HANDLED_SIGNALS) {
        dev_warn!("cannot reset signal handlers: {err}");
    }
    if let Err(err) = original_mask.set_mask() {
        dev_warn!("cannot restore signal mask: {err}");
    }

    let err = Command::new(&argv[0]).args(&argv[1..]).exec();
    dev_info!("cannot execute {}: {err}", argv[0]);

    println_ignore_io_error!("{}: Command not found", argv[0]);
    _exit(COMMAND_NOT_FOUND)
}
