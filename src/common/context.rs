use std::path::PathBuf;

use crate::system::{interface::ProcessId, Process};

/// Locations of the files the shell reads and writes, all relative to one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `etc/passwd.txt`, one `user:password:home` entry per line.
    pub fn passwd_file(&self) -> PathBuf {
        self.root.join("etc").join("passwd.txt")
    }

    pub fn home_dir(&self, user: &str) -> PathBuf {
        self.root.join("home").join(user)
    }

    pub fn history_file(&self, user: &str) -> PathBuf {
        self.home_dir(user).join(".tsh_history")
    }

    pub fn status_dir(&self, pid: ProcessId) -> PathBuf {
        self.root.join("proc").join(pid.to_string())
    }

    pub fn status_file(&self, pid: ProcessId) -> PathBuf {
        self.status_dir(pid).join("status")
    }
}

/// Everything that identifies the current login session.
///
/// Created once the user has authenticated and lives until the shell exits.
#[derive(Debug)]
pub struct ShellContext {
    pub user: String,
    pub process: Process,
    pub paths: Paths,
}

impl ShellContext {
    pub fn new(user: String, paths: Paths) -> Self {
        Self {
            user,
            process: Process::new(),
            paths,
        }
    }

    /// The shell is the session leader for every job it starts.
    pub fn session_leader(&self) -> ProcessId {
        self.process.pid
    }

    pub fn is_root(&self) -> bool {
        self.user == "root"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Paths, ShellContext};
    use crate::system::interface::ProcessId;

    #[test]
    fn paths_are_below_root() {
        let paths = Paths::new("/srv/tsh");
        assert_eq!(paths.passwd_file(), PathBuf::from("/srv/tsh/etc/passwd.txt"));
        assert_eq!(
            paths.history_file("alice"),
            PathBuf::from("/srv/tsh/home/alice/.tsh_history")
        );
        assert_eq!(
            paths.status_file(ProcessId::new(4242)),
            PathBuf::from("/srv/tsh/proc/4242/status")
        );
    }

    #[test]
    fn context_belongs_to_current_process() {
        let context = ShellContext::new("root".to_string(), Paths::new("."));
        assert_eq!(
            context.session_leader(),
            ProcessId::new(std::process::id() as i32)
        );
        assert!(context.is_root());
    }
}
