use std::{fmt, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    /// A signal disposition could not be installed.
    SignalSetup(std::io::Error),
    /// Signals could no longer be received.
    SignalStream(std::io::Error),
    /// A child process could not be created.
    Fork(std::io::Error),
    Io(Option<PathBuf>, std::io::Error),
    UserExists(String),
    InvalidUserName(String),
    InvalidPassword,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SignalSetup(e) => write!(f, "cannot install signal handlers: {e}"),
            Error::SignalStream(e) => write!(f, "cannot receive signals: {e}"),
            Error::Fork(e) => write!(f, "fork error: {e}"),
            Error::Io(location, e) => {
                if let Some(path) = location {
                    write!(f, "'{}': {e}", path.display())
                } else {
                    write!(f, "IO error: {e}")
                }
            }
            Error::UserExists(name) => write!(f, "user '{name}' already exists"),
            Error::InvalidUserName(name) => write!(f, "invalid user name: {name:?}"),
            Error::InvalidPassword => f.write_str("password may not contain ':', '/' or blanks"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(None, err)
    }
}

impl Error {
    pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Error::Io(Some(path), err)
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn io_errors_name_the_file() {
        let err = Error::io_at("etc/passwd.txt")(std::io::Error::from_raw_os_error(libc::ENOENT));
        assert!(err.to_string().starts_with("'etc/passwd.txt': "));
        assert_eq!(
            Error::UserExists("root".into()).to_string(),
            "user 'root' already exists"
        );
    }
}
