//! Flat-file credentials and the login prompt.
use std::{
    fs,
    io::Write,
    os::fd::AsFd,
    path::PathBuf,
};

use crate::common::{Error, Paths};
use crate::log::{dev_info, user_warn};
use crate::system::{input::LineReader, term::HiddenInput};

#[cfg(test)]
mod tests;

/// Typing this at either login prompt leaves the shell.
const QUIT: &str = "quit";

#[derive(Debug, PartialEq, Eq)]
struct PasswdEntry<'a> {
    name: &'a str,
    password: &'a str,
}

impl<'a> PasswdEntry<'a> {
    /// `name:password:home`; the home field is informational only.
    fn parse(line: &'a str) -> Option<Self> {
        let mut fields = line.trim_end().splitn(3, ':');
        let name = fields.next().filter(|name| !name.is_empty())?;
        let password = fields.next()?;
        Some(PasswdEntry { name, password })
    }
}

pub struct PasswdFile {
    path: PathBuf,
}

impl PasswdFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<String, Error> {
        fs::read_to_string(&self.path).map_err(Error::io_at(&self.path))
    }

    /// Check that `user` exists and `password` belongs to that same entry.
    pub fn authenticate(&self, user: &str, password: &str) -> Result<bool, Error> {
        let contents = self.read()?;
        Ok(contents
            .lines()
            .filter_map(PasswdEntry::parse)
            .any(|entry| entry.name == user && entry.password == password))
    }

    pub fn contains_user(&self, user: &str) -> Result<bool, Error> {
        let contents = self.read()?;
        Ok(contents
            .lines()
            .filter_map(PasswdEntry::parse)
            .any(|entry| entry.name == user))
    }

    fn append_entry(&self, name: &str, password: &str) -> Result<(), Error> {
        let contents = self.read()?;
        let separator = if contents.is_empty() || contents.ends_with('\n') {
            ""
        } else {
            "\n"
        };

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(Error::io_at(&self.path))?;
        writeln!(file, "{separator}{name}:{password}:/home/{name}")
            .map_err(Error::io_at(&self.path))
    }
}

fn validate_field(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c == ':' || c == '/' || c.is_whitespace() || c.is_control())
}

/// Register a new account and give it an empty home directory and history file.
pub fn add_user(paths: &Paths, name: &str, password: &str) -> Result<(), Error> {
    if !validate_field(name) || name == QUIT {
        return Err(Error::InvalidUserName(name.to_string()));
    }
    if !validate_field(password) {
        return Err(Error::InvalidPassword);
    }

    let passwd = PasswdFile::new(paths.passwd_file());
    if passwd.contains_user(name)? {
        return Err(Error::UserExists(name.to_string()));
    }
    passwd.append_entry(name, password)?;

    let home = paths.home_dir(name);
    fs::create_dir_all(&home).map_err(Error::io_at(&home))?;
    let history = paths.history_file(name);
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&history)
        .map_err(Error::io_at(&history))?;

    dev_info!("added user {name}");
    Ok(())
}

/// Prompt for credentials until they match an entry of `passwd`.
///
/// Returns `None` when the user asks to quit or the input is exhausted.
pub fn login<F: AsFd>(
    input: &mut LineReader<F>,
    passwd: &PasswdFile,
) -> Result<Option<String>, Error> {
    loop {
        print_flush_ignore_io_error!("username: ");
        let Some(user) = read_word(input)? else {
            return Ok(None);
        };
        if user == QUIT {
            return Ok(None);
        }

        print_flush_ignore_io_error!("password: ");
        let password = {
            let _hidden = HiddenInput::new(&input.fd()).unwrap_or_else(|err| {
                user_warn!("cannot disable echo: {err}");
                None
            });
            read_word(input)?
        };
        let Some(password) = password else {
            return Ok(None);
        };
        if password == QUIT {
            return Ok(None);
        }

        if passwd.authenticate(&user, &password)? {
            return Ok(Some(user));
        }
        println_ignore_io_error!("User Authentication failed. Please try again.");
    }
}

fn read_word<F: AsFd>(input: &mut LineReader<F>) -> Result<Option<String>, Error> {
    Ok(input.read_line()?.map(|line| line.trim().to_string()))
}
