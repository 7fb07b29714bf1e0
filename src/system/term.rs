use std::{
    io, mem,
    os::fd::{AsRawFd, RawFd},
};

use libc::{tcsetattr, termios, ECHO, ECHONL, TCSANOW};

use crate::cutils::{cerr, safe_isatty};

/// Keeps echo disabled on a terminal for as long as the value is alive.
///
/// The terminal settings that were active before are restored on drop. The descriptor itself is
/// not owned and has to stay open until then.
pub(crate) struct HiddenInput {
    tty: RawFd,
    term_orig: termios,
}

impl HiddenInput {
    /// Disable echo on `tty`. Returns `None` when `tty` is not a terminal, in which case there is
    /// nothing to hide.
    pub(crate) fn new(tty: &impl AsRawFd) -> io::Result<Option<HiddenInput>> {
        let tty = tty.as_raw_fd();
        if !safe_isatty(tty) {
            return Ok(None);
        }

        // Make two copies of the terminal settings. The first one will be modified
        // and the second one will act as a backup for when we want to set the
        // terminal back to its original state.
        let mut term = safe_tcgetattr(tty)?;
        let term_orig = safe_tcgetattr(tty)?;

        // Hide the password.
        term.c_lflag &= !ECHO;

        // But don't hide the NL character when the user hits ENTER.
        term.c_lflag |= ECHONL;

        // SAFETY: we are passing tcsetattr a valid file descriptor and pointer-to-struct
        cerr(unsafe { tcsetattr(tty, TCSANOW, &term) })?;

        Ok(Some(HiddenInput { tty, term_orig }))
    }
}

impl Drop for HiddenInput {
    fn drop(&mut self) {
        // SAFETY: we are passing tcsetattr a valid file descriptor and pointer-to-struct
        unsafe {
            tcsetattr(self.tty, TCSANOW, &self.term_orig);
        }
    }
}

fn safe_tcgetattr(tty: RawFd) -> io::Result<termios> {
    let mut term = mem::MaybeUninit::<termios>::uninit();
    // SAFETY: we are passing tcgetattr a pointer to valid memory
    cerr(unsafe { ::libc::tcgetattr(tty, term.as_mut_ptr()) })?;
    // SAFETY: if the previous call was a success, `tcgetattr` has initialized `term`
    Ok(unsafe { term.assume_init() })
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;

    use super::HiddenInput;

    #[test]
    fn nothing_to_hide_on_a_socket() {
        let (rx, _tx) = UnixStream::pair().unwrap();
        assert!(HiddenInput::new(&rx).unwrap().is_none());
    }
}
