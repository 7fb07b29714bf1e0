//! The per-user command history, persisted after every accepted line.
use std::{
    collections::VecDeque,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use crate::common::{Error, HISTORY_LEN};

#[derive(Debug)]
pub struct History {
    path: PathBuf,
    entries: VecDeque<String>,
}

impl History {
    /// Load the history stored at `path`. A missing file is an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(Error::Io(Some(path), err)),
        };

        let mut history = History {
            path,
            entries: VecDeque::with_capacity(HISTORY_LEN),
        };
        for line in contents.lines().filter(|line| !line.is_empty()) {
            history.push(line);
        }

        Ok(history)
    }

    fn push(&mut self, line: &str) {
        if self.entries.len() == HISTORY_LEN {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    /// Record `line` and rewrite the history file.
    pub fn append(&mut self, line: &str) -> Result<(), Error> {
        self.push(line);
        self.save()
    }

    fn save(&self) -> Result<(), Error> {
        let mut file = fs::File::create(&self.path).map_err(Error::io_at(&self.path))?;
        for entry in &self.entries {
            writeln!(file, "{entry}").map_err(Error::io_at(&self.path))?;
        }
        Ok(())
    }

    /// Entry `n`, counting from 1 for the oldest one kept.
    pub fn get(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(number, line)` pairs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line.as_str()))
    }
}
