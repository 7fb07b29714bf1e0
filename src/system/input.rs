use std::{
    io,
    os::fd::{AsFd, AsRawFd, BorrowedFd},
};

use crate::cutils::{cerr, was_interrupted};

const CHUNK: usize = 4096;

/// Splits the bytes arriving on a file descriptor into lines.
///
/// Reads go straight to `read(2)` so nothing is buffered behind the back of a [`super::poll::PollSet`]
/// watching the same descriptor.
pub struct LineReader<F> {
    source: F,
    buffer: Vec<u8>,
    eof: bool,
}

impl<F: AsFd> LineReader<F> {
    pub fn new(source: F) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            eof: false,
        }
    }

    pub fn fd(&self) -> BorrowedFd<'_> {
        self.source.as_fd()
    }

    /// Whether the other end is closed. Buffered lines may still be pending.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Perform a single read. Returns the number of bytes read, `0` meaning end of file.
    ///
    /// `EINTR` is reported as `Ok(None)` so the caller can handle whatever arrived in the meantime.
    pub fn fill(&mut self) -> io::Result<Option<usize>> {
        let mut chunk = [0u8; CHUNK];
        // SAFETY: `chunk` is valid for writes of `CHUNK` bytes
        let read = unsafe {
            libc::read(
                self.source.as_fd().as_raw_fd(),
                chunk.as_mut_ptr().cast(),
                CHUNK,
            )
        };
        match cerr(read) {
            Ok(0) => {
                self.eof = true;
                Ok(Some(0))
            }
            Ok(n) => {
                self.buffer.extend_from_slice(&chunk[..n as usize]);
                Ok(Some(n as usize))
            }
            Err(err) if was_interrupted(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Take the next complete line out of the buffer, without its line terminator.
    ///
    /// Once the input is closed a trailing unterminated line is returned as well.
    pub fn next_line(&mut self) -> Option<String> {
        let line = match self.buffer.iter().position(|&b| b == b'\n') {
            Some(newline) => {
                let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
                line.pop();
                line
            }
            None if self.eof && !self.buffer.is_empty() => std::mem::take(&mut self.buffer),
            None => return None,
        };

        let mut line = String::from_utf8_lossy(&line).into_owned();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Block until a full line is available. Returns `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.next_line() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }
            self.fill()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, os::unix::net::UnixStream};

    use super::LineReader;

    #[test]
    fn splits_lines() {
        let (rx, mut tx) = UnixStream::pair().unwrap();
        tx.write_all(b"jobs\nfg %1\r\nsleep 1 &").unwrap();
        drop(tx);

        let mut reader = LineReader::new(rx);
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("jobs"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("fg %1"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("sleep 1 &"));
        assert_eq!(reader.read_line().unwrap(), None);
        assert!(reader.at_eof());
    }

    #[test]
    fn partial_lines_wait_for_more_input() {
        let (rx, mut tx) = UnixStream::pair().unwrap();
        let mut reader = LineReader::new(rx);

        tx.write_all(b"sle").unwrap();
        assert_eq!(reader.fill().unwrap(), Some(3));
        assert_eq!(reader.next_line(), None);

        tx.write_all(b"ep 2\n").unwrap();
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("sleep 2"));
        assert!(!reader.at_eof());
    }

    #[test]
    fn empty_lines_are_kept() {
        let (rx, mut tx) = UnixStream::pair().unwrap();
        tx.write_all(b"\n\njobs\n").unwrap();
        drop(tx);

        let mut reader = LineReader::new(rx);
        assert_eq!(reader.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("jobs"));
        assert_eq!(reader.read_line().unwrap(), None);
    }
}
