use std::os::fd::{AsFd, AsRawFd};

use crate::auth::{self, PasswdFile};
use crate::cli::{
    help::{long_help_message, USAGE_MSG},
    TshAction, TshRunOptions,
};
use crate::common::{Error, Paths, ShellContext, PROMPT};
use crate::cutils::was_interrupted;
use crate::history::History;
use crate::jobs::JobState;
use crate::log::{dev_warn, trace_info, user_error, user_warn, TshLogger};
use crate::procfs::{ProcessStatus, StatusMirror};
use crate::system::{
    input::LineReader,
    poll::{PollEvent, PollSet},
    signal::consts::*,
};

use self::builtins::{Builtin, BuiltinError, JobSpec};
use self::foreground::wait_for_foreground_clear;
use self::job_control::{Flow, GroupSignaller, JobControl, Killpg};
use self::parser::{parse_line, ParsedLine};
use self::signals::SignalSource;

mod builtins;
mod foreground;
mod job_control;
mod launcher;
mod parser;
mod signals;


const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ShellEvent {
    Signal,
    Input,
}

/// A logged-in shell session.
pub struct Shell<S: GroupSignaller = Killpg> {
    context: ShellContext,
    control: JobControl<S>,
    history: History,
    emit_prompt: bool,
}

impl<S: GroupSignaller> Shell<S> {
    pub fn new(
        context: ShellContext,
        control: JobControl<S>,
        history: History,
        emit_prompt: bool,
    ) -> Self {
        Self {
            context,
            control,
            history,
            emit_prompt,
        }
    }

    /// Publish the status record of the shell itself.
    fn record_self(&self) {
        let process = &self.context.process;
        let status = ProcessStatus {
            name: "Shell",
            pid: process.pid,
            parent_pid: process.parent_pid.unwrap_or(process.pid),
            group_id: process.group_id,
            session_id: self.context.session_leader(),
            state: "Ss",
            user: &self.context.user,
        };
        if let Err(err) = self.control.mirror().record_status(&status) {
            user_warn!("{err}");
        }
    }

    /// Retire the status record of the shell. Jobs that are still alive are left alone.
    fn finish(&self) {
        if let Err(err) = self.control.mirror().remove_status(self.context.process.pid) {
            user_warn!("{err}");
        }
    }

    /// Read and evaluate lines until the input ends or the user quits.
    pub fn run<F, Sig>(&mut self, input: &mut LineReader<F>, signals: &Sig) -> Result<i32, Error>
    where
        F: AsFd,
        Sig: SignalSource + AsRawFd,
    {
        let mut poll_set = PollSet::new();
        poll_set.add_fd(ShellEvent::Signal, signals, PollEvent::Readable);
        poll_set.add_fd(ShellEvent::Input, &input.fd(), PollEvent::Readable);

        loop {
            if self.emit_prompt {
                print_flush_ignore_io_error!("{PROMPT}");
            }

            let line = loop {
                if let Some(line) = input.next_line() {
                    break line;
                }
                if input.at_eof() {
                    trace_info!("end of input");
                    return Ok(0);
                }

                let events = match poll_set.poll() {
                    Ok(events) => events,
                    Err(err) if was_interrupted(&err) => continue,
                    Err(err) => return Err(err.into()),
                };
                for event in events {
                    match event {
                        ShellEvent::Signal => {
                            let signal = signals.next_signal().map_err(Error::SignalStream)?;
                            if let Flow::Exit(code) = self.control.handle_signal(signal) {
                                return Ok(code);
                            }
                        }
                        ShellEvent::Input => {
                            input.fill()?;
                        }
                    }
                }
            };

            if let Flow::Exit(code) = self.eval(&line, signals)? {
                return Ok(code);
            }
        }
    }

    /// Evaluate one input line.
    pub fn eval(&mut self, line: &str, signals: &impl SignalSource) -> Result<Flow, Error> {
        let Some(parsed) = parse_line(line) else {
            return Ok(Flow::Continue);
        };

        let builtin = match Builtin::parse(&parsed.argv) {
            Some(Ok(Builtin::Recall(n))) => return self.recall(n, signals),
            Some(Ok(builtin)) => Some(builtin),
            Some(Err(err)) => {
                self.remember(line);
                user_error!("{err}");
                return Ok(Flow::Continue);
            }
            None => None,
        };

        self.remember(line);

        match builtin {
            Some(builtin) => self.run_builtin(builtin, signals),
            None => self.run_external(&parsed, line.trim(), signals),
        }
    }

    /// `!N`: evaluate history entry `N` as if it had been typed again.
    fn recall(&mut self, n: usize, signals: &impl SignalSource) -> Result<Flow, Error> {
        match self.history.get(n) {
            Some(line) if !line.trim_start().starts_with('!') => {
                let line = line.to_string();
                self.eval(&line, signals)
            }
            _ => {
                user_error!("{}", BuiltinError::EventNotFound(n.to_string()));
                Ok(Flow::Continue)
            }
        }
    }

    fn remember(&mut self, line: &str) {
        if let Err(err) = self.history.append(line.trim()) {
            user_warn!("cannot save history: {err}");
        }
    }

    fn run_builtin(&mut self, builtin: Builtin, signals: &impl SignalSource) -> Result<Flow, Error> {
        let result = match builtin {
            Builtin::Jobs => {
                for job in self.control.table().list() {
                    println_ignore_io_error!("{job}");
                }
                Ok(())
            }
            Builtin::Fg(spec) => match self.resume(spec, JobState::Foreground) {
                Ok(()) => return wait_for_foreground_clear(&mut self.control, signals),
                Err(err) => Err(err),
            },
            Builtin::Bg(spec) => self.resume(spec, JobState::Background),
            Builtin::Quit { force } => {
                if force || !self.control.table().has_stopped_jobs() {
                    return Ok(Flow::Exit(0));
                }
                Err(BuiltinError::SuspendedJobs)
            }
            Builtin::History => {
                for (n, line) in self.history.iter() {
                    println_ignore_io_error!("{n} {line}");
                }
                Ok(())
            }
            Builtin::AddUser { name, password } => {
                if self.context.is_root() {
                    if let Err(err) = auth::add_user(&self.context.paths, &name, &password) {
                        user_error!("adduser: {err}");
                    }
                    Ok(())
                } else {
                    Err(BuiltinError::NotRoot)
                }
            }
            Builtin::Recall(n) => return self.recall(n, signals),
        };

        if let Err(err) = result {
            user_error!("{err}");
        }
        Ok(Flow::Continue)
    }

    /// Continue a job and move it to `state`. The job receives `SIGCONT` before its state changes.
    fn resume(&mut self, spec: JobSpec, state: JobState) -> Result<(), BuiltinError> {
        let job = spec.resolve(self.control.table())?;
        let (pid, jid) = (job.pid, job.jid);
        let command_line = job.command_line.clone();

        if let Err(err) = self.control.signal_group(pid, SIGCONT) {
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Err(BuiltinError::NoSuchProcess(pid.get() as u32));
            }
            dev_warn!("cannot continue job {pid}: {err}");
        }
        self.control.set_state(pid, state);

        if state == JobState::Background {
            println_ignore_io_error!("[{jid}] ({pid}) {command_line}");
        }
        Ok(())
    }

    fn run_external(
        &mut self,
        line: &ParsedLine,
        command_line: &str,
        signals: &impl SignalSource,
    ) -> Result<Flow, Error> {
        let launched = launcher::launch(&mut self.control, &self.context, line, command_line)?;
        match launched {
            Some(_) if !line.background => wait_for_foreground_clear(&mut self.control, signals),
            _ => Ok(Flow::Continue),
        }
    }
}

fn run(options: TshRunOptions) -> Result<i32, Error> {
    let paths = Paths::new(&options.root);
    let passwd = PasswdFile::new(paths.passwd_file());
    let mut input = LineReader::new(std::io::stdin());

    let Some(user) = auth::login(&mut input, &passwd)? else {
        return Ok(0);
    };
    trace_info!("logged in as {user}");

    let history = History::load(paths.history_file(&user))?;
    let context = ShellContext::new(user, paths.clone());

    let (stream, _handlers) = signals::install()?;

    let control = JobControl::new(StatusMirror::new(paths), Killpg);
    let mut shell = Shell::new(context, control, history, options.emit_prompt);
    shell.record_self();

    let result = shell.run(&mut input, stream);
    shell.finish();
    result
}

pub fn main() {
    let action = match TshAction::from_env() {
        Ok(action) => action,
        Err(error) => {
            eprintln_ignore_io_error!("tsh: {error}\n{USAGE_MSG}");
            std::process::exit(1);
        }
    };

    match action {
        TshAction::Help => {
            println_ignore_io_error!("{}", long_help_message());
            std::process::exit(0);
        }
        TshAction::Version => {
            println_ignore_io_error!("tsh-rs {VERSION}");
            std::process::exit(0);
        }
        TshAction::Run(options) => {
            TshLogger::new("tsh: ", options.verbose).into_global_logger();

            match run(options) {
                Ok(code) => std::process::exit(code),
                Err(error) => {
                    user_error!("{error}");
                    std::process::exit(1);
                }
            }
        }
    }
}
