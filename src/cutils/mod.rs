use std::io;

pub fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(io::Error::last_os_error()),
        _ => Ok(res),
    }
}

/// Whether an IO operation failed only because a signal arrived while it was blocked.
pub fn was_interrupted(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}

/// Rust's standard library IsTerminal just directly calls isatty, which
/// we don't want since this performs IOCTL calls on them and file descriptors are under
/// the control of the user; so this checks if they are a character device first.
pub fn safe_isatty(fildes: libc::c_int) -> bool {
    let mut maybe_stat = std::mem::MaybeUninit::<libc::stat>::uninit();
    if unsafe { libc::fstat(fildes, maybe_stat.as_mut_ptr()) } == 0 {
        let mode = unsafe { maybe_stat.assume_init() }.st_mode;

        // the S_ISCHR macro isn't in libc
        let is_char_device = (mode & libc::S_IFMT) == libc::S_IFCHR;

        if is_char_device {
            unsafe { libc::isatty(fildes) != 0 }
        } else {
            false
        }
    } else {
        false
    }
}

#[cfg(test)]
mod test {
    use super::{cerr, safe_isatty, was_interrupted};

    #[test]
    fn cerr_maps_minus_one_to_os_error() {
        assert_eq!(cerr(3).unwrap(), 3);
        assert_eq!(cerr(0i64).unwrap(), 0);
        // `close` on an invalid descriptor sets EBADF
        let err = cerr(unsafe { libc::close(-837492) }).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn interrupted_errors() {
        let err = std::io::Error::from_raw_os_error(libc::EINTR);
        assert!(was_interrupted(&err));
        let err = std::io::Error::from_raw_os_error(libc::EBADF);
        assert!(!was_interrupted(&err));
    }

    #[test]
    fn test_tty() {
        use std::fs::File;
        use std::os::fd::AsRawFd;
        assert!(!safe_isatty(File::open("/bin/sh").unwrap().as_raw_fd()));
        assert!(!safe_isatty(-837492));
        let (rx, _tx) = std::os::unix::net::UnixStream::pair().unwrap();
        assert!(!safe_isatty(rx.as_raw_fd()));
    }
}
