use std::{fmt::Display, num::ParseIntError, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(libc::pid_t);

impl ProcessId {
    /// Matches any child process when passed to `waitpid`.
    pub const ANY_CHILD: Self = Self(-1);

    pub fn new(id: libc::pid_t) -> Self {
        Self(id)
    }

    pub fn get(&self) -> libc::pid_t {
        self.0
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<libc::pid_t>().map(ProcessId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessId;

    #[test]
    fn test_parse_and_display() {
        let pid: ProcessId = "4242".parse().unwrap();
        assert_eq!(pid.get(), 4242);
        assert_eq!(pid.to_string(), "4242");
        assert_eq!(ProcessId::ANY_CHILD.get(), -1);

        assert!("-x".parse::<ProcessId>().is_err());
    }
}
