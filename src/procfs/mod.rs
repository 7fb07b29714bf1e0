//! A `/proc`-like mirror of the processes the shell owns, written for outside inspection.
//!
//! Nothing in the shell reads these files back.
use std::{fmt, fs, io};

use crate::common::{Error, Paths};
use crate::system::interface::ProcessId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStatus<'a> {
    pub name: &'a str,
    pub pid: ProcessId,
    pub parent_pid: ProcessId,
    pub group_id: ProcessId,
    pub session_id: ProcessId,
    pub state: &'a str,
    pub user: &'a str,
}

impl fmt::Display for ProcessStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Pid: {}", self.pid)?;
        writeln!(f, "PPid: {}", self.parent_pid)?;
        writeln!(f, "PGid: {}", self.group_id)?;
        writeln!(f, "Sid: {}", self.session_id)?;
        writeln!(f, "STAT: {}", self.state)?;
        writeln!(f, "Username: {}", self.user)
    }
}

pub struct StatusMirror {
    paths: Paths,
}

impl StatusMirror {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Write (or overwrite) the record of `status.pid`.
    pub fn record_status(&self, status: &ProcessStatus) -> Result<(), Error> {
        let dir = self.paths.status_dir(status.pid);
        fs::create_dir_all(&dir).map_err(Error::io_at(&dir))?;
        let file = self.paths.status_file(status.pid);
        fs::write(&file, status.to_string()).map_err(Error::io_at(&file))
    }

    /// Replace the `STAT` field of an existing record.
    pub fn update_state(&self, pid: ProcessId, state: &str) -> Result<(), Error> {
        let file = self.paths.status_file(pid);
        let contents = fs::read_to_string(&file).map_err(Error::io_at(&file))?;
        let updated: String = contents
            .lines()
            .map(|line| {
                if line.starts_with("STAT:") {
                    format!("STAT: {state}\n")
                } else {
                    format!("{line}\n")
                }
            })
            .collect();
        fs::write(&file, updated).map_err(Error::io_at(&file))
    }

    /// Retire the record of `pid`. Retiring a record that does not exist is not an error.
    pub fn remove_status(&self, pid: ProcessId) -> Result<(), Error> {
        let dir = self.paths.status_dir(pid);
        match fs::remove_dir_all(&dir) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(Error::Io(Some(dir), err)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::{ProcessStatus, StatusMirror};
    use crate::common::Paths;
    use crate::system::interface::ProcessId;

    fn status(pid: i32, state: &'static str) -> ProcessStatus<'static> {
        ProcessStatus {
            name: "sleep",
            pid: ProcessId::new(pid),
            parent_pid: ProcessId::new(10),
            group_id: ProcessId::new(pid),
            session_id: ProcessId::new(10),
            state,
            user: "alice",
        }
    }

    #[test]
    fn record_update_remove() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let mirror = StatusMirror::new(paths.clone());
        let pid = ProcessId::new(321);

        mirror.record_status(&status(321, "R+")).unwrap();
        assert_eq!(
            fs::read_to_string(paths.status_file(pid)).unwrap(),
            "Name: sleep\nPid: 321\nPPid: 10\nPGid: 321\nSid: 10\nSTAT: R+\nUsername: alice\n"
        );

        mirror.update_state(pid, "T").unwrap();
        let contents = fs::read_to_string(paths.status_file(pid)).unwrap();
        assert!(contents.contains("\nSTAT: T\n"));
        assert!(contents.contains("\nUsername: alice\n"));

        mirror.remove_status(pid).unwrap();
        assert!(!paths.status_dir(pid).exists());
        // a second removal is harmless
        mirror.remove_status(pid).unwrap();
    }

    #[test]
    fn updating_a_missing_record_fails() {
        let dir = TempDir::new().unwrap();
        let mirror = StatusMirror::new(Paths::new(dir.path()));
        assert!(mirror.update_state(ProcessId::new(77), "R").is_err());
    }
}
