use std::{fmt, io::Write};

#[cfg(feature = "dev")]
use std::{fs::File, path::Path};

use super::{Level, Log};

/// Writes every record on its own line, behind a fixed prefix.
pub struct SimpleLogger<W: Send + Sync>
where
    for<'a> &'a W: Write,
{
    target: W,
    prefix: &'static str,
}

impl<W: Send + Sync> Log for SimpleLogger<W>
where
    for<'a> &'a W: Write,
{
    fn log(&self, level: Level, args: &fmt::Arguments<'_>) {
        let _ = match level {
            Level::Warn => writeln!(&self.target, "{}warning: {}", self.prefix, args),
            _ => writeln!(&self.target, "{}{}", self.prefix, args),
        };
    }

    fn flush(&self) {
        let _ = (&self.target).flush();
    }
}

impl SimpleLogger<std::io::Stderr> {
    pub fn to_stderr(prefix: &'static str) -> SimpleLogger<std::io::Stderr> {
        SimpleLogger {
            target: std::io::stderr(),
            prefix,
        }
    }
}

impl SimpleLogger<std::io::Stdout> {
    pub fn to_stdout(prefix: &'static str) -> SimpleLogger<std::io::Stdout> {
        SimpleLogger {
            target: std::io::stdout(),
            prefix,
        }
    }
}

#[cfg(feature = "dev")]
impl SimpleLogger<File> {
    pub fn to_file<P: AsRef<Path>>(name: P, prefix: &'static str) -> Result<Self, std::io::Error> {
        let target = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(name)?;
        Ok(Self { target, prefix })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, RwLock},
    };

    use super::{Level, Log, SimpleLogger};

    #[derive(Clone, Default)]
    struct MyString {
        inner: Arc<RwLock<String>>,
    }

    impl MyString {
        fn read(&self) -> String {
            self.inner.read().unwrap().clone()
        }
    }

    impl io::Write for &'_ MyString {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner
                .write()
                .unwrap()
                .push_str(std::str::from_utf8(buf).unwrap());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.write(b"flushed").map(drop)
        }
    }

    #[test]
    fn test_write_and_flush() {
        let target = MyString::default();
        let logger = SimpleLogger {
            target: target.clone(),
            prefix: "tsh: ",
        };

        logger.log(Level::Error, &format_args!("fg: No such job"));
        assert_eq!(target.read(), "tsh: fg: No such job\n");

        logger.flush();
        assert_eq!(target.read(), "tsh: fg: No such job\nflushed");
    }

    #[test]
    fn warnings_are_marked() {
        let target = MyString::default();
        let logger = SimpleLogger {
            target: target.clone(),
            prefix: "tsh: ",
        };

        logger.log(Level::Warn, &format_args!("cannot write status"));
        assert_eq!(target.read(), "tsh: warning: cannot write status\n");
    }
}
