use std::fmt;

use crate::jobs::{Job, JobId, JobTable};
use crate::system::interface::ProcessId;

/// How `fg` and `bg` name a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSpec {
    /// `%N`
    Jid(JobId),
    /// A bare number, looked up as a job id first and as a process id second.
    Number(u32),
}

impl JobSpec {
    fn parse(arg: &str) -> Option<Self> {
        match arg.strip_prefix('%') {
            Some(jid) => jid.parse().ok().map(JobSpec::Jid),
            None => arg.parse().ok().map(JobSpec::Number),
        }
    }

    pub fn resolve<'a>(&self, table: &'a JobTable) -> Result<&'a Job, BuiltinError> {
        match *self {
            JobSpec::Jid(jid) => table.find_by_jid(jid).ok_or(BuiltinError::NoSuchJob(jid)),
            JobSpec::Number(n) => table
                .find_by_jid(JobId::new(n))
                .or_else(|| {
                    libc::pid_t::try_from(n)
                        .ok()
                        .and_then(|pid| table.find_by_pid(ProcessId::new(pid)))
                })
                .ok_or(BuiltinError::NoSuchProcess(n)),
        }
    }
}

/// The commands the shell runs itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Jobs,
    Fg(JobSpec),
    Bg(JobSpec),
    /// `quit`, `logout` and `quit -f`
    Quit { force: bool },
    History,
    /// `!N`
    Recall(usize),
    AddUser { name: String, password: String },
}

impl Builtin {
    /// Recognize a builtin. Returns `None` when `argv` names an external program.
    pub fn parse(argv: &[String]) -> Option<Result<Builtin, BuiltinError>> {
        let (command, args) = argv.split_first()?;

        let builtin = match command.as_str() {
            "jobs" => Ok(Builtin::Jobs),
            "fg" => job_spec("fg", args).map(Builtin::Fg),
            "bg" => job_spec("bg", args).map(Builtin::Bg),
            "quit" | "logout" => match args {
                [] => Ok(Builtin::Quit { force: false }),
                [flag] if command == "quit" && (flag == "-f" || flag == "--force") => {
                    Ok(Builtin::Quit { force: true })
                }
                _ => Err(BuiltinError::Usage("quit [-f]")),
            },
            "history" => Ok(Builtin::History),
            "adduser" => match args {
                [name, password] => Ok(Builtin::AddUser {
                    name: name.clone(),
                    password: password.clone(),
                }),
                _ => Err(BuiltinError::Usage("adduser <user> <password>")),
            },
            recall if recall.starts_with('!') => {
                let number = &recall[1..];
                match number.parse() {
                    Ok(n) if args.is_empty() => Ok(Builtin::Recall(n)),
                    _ => Err(BuiltinError::EventNotFound(number.to_string())),
                }
            }
            _ => return None,
        };

        Some(builtin)
    }
}

fn job_spec(command: &'static str, args: &[String]) -> Result<JobSpec, BuiltinError> {
    match args {
        [] => Err(BuiltinError::MissingJob(command)),
        [arg] => JobSpec::parse(arg).ok_or(BuiltinError::InvalidJob(command)),
        _ => Err(BuiltinError::Usage(if command == "fg" {
            "fg <%jid|pid>"
        } else {
            "bg <%jid|pid>"
        })),
    }
}

/// Mistakes in the use of a builtin. They are reported and the shell carries on.
#[derive(Debug, PartialEq, Eq)]
pub enum BuiltinError {
    MissingJob(&'static str),
    InvalidJob(&'static str),
    NoSuchJob(JobId),
    NoSuchProcess(u32),
    SuspendedJobs,
    EventNotFound(String),
    NotRoot,
    Usage(&'static str),
}

impl fmt::Display for BuiltinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinError::MissingJob(command) => {
                write!(f, "{command} command requires PID or %jobid argument")
            }
            BuiltinError::InvalidJob(command) => {
                write!(f, "{command}: argument must be a PID or %jobid")
            }
            BuiltinError::NoSuchJob(jid) => write!(f, "%{jid}: No such job"),
            BuiltinError::NoSuchProcess(pid) => write!(f, "({pid}): No such process"),
            BuiltinError::SuspendedJobs => f.write_str("There are suspended jobs."),
            BuiltinError::EventNotFound(event) => write!(f, "!{event}: event not found"),
            BuiltinError::NotRoot => f.write_str("root privileges required to run adduser."),
            BuiltinError::Usage(usage) => write!(f, "usage: {usage}"),
        }
    }
}
