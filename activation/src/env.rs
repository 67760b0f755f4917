// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `systemd` socket activation environment.
//! <http://0pointer.de/blog/projects/socket-activation.html>

use std::{env, io, os::unix::io::RawFd, process};

use nix::fcntl::{fcntl, FcntlArg::F_SETFD, FdFlag};

use crate::Error;

/// Environment variable which, when present, should match the PID of the
/// current process.
pub const LISTEN_PID: &str = "LISTEN_PID";
/// Environment variable which carries the number of file descriptors passed
/// down.
pub const LISTEN_FDS: &str = "LISTEN_FDS";
/// Environment variable containing a colon-separated list of names
/// corresponding to the `FileDescriptorName` option in the socket unit.
pub const LISTEN_FDNAMES: &str = "LISTEN_FDNAMES";

/// Number of the first passed file descriptor. 0, 1 and 2 are stdin, stdout
/// and stderr respectively.
pub const LISTEN_FDS_START: RawFd = 3;

/// A file descriptor inherited from the process supervisor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inherited {
    pub fd: RawFd,
    pub name: String,
}

impl Inherited {
    pub fn new(fd: RawFd, name: impl Into<String>) -> Self {
        Self {
            fd,
            name: name.into(),
        }
    }

    /// An inherited descriptor without a configured name is called
    /// `LISTEN_FD_<fd>`.
    pub fn unnamed(fd: RawFd) -> Self {
        Self::new(fd, format!("LISTEN_FD_{}", fd))
    }
}

/// Whether the process looks like it was socket activated, ie. either
/// `LISTEN_PID` or `LISTEN_FDS` is set.
///
/// This does not validate the variables, see [`listen_fds`] for that.
pub fn is_activated() -> bool {
    [LISTEN_PID, LISTEN_FDS]
        .iter()
        .any(|var| env::var_os(var).is_some())
}

/// Checks for file descriptors passed by the service manager for socket
/// activation.
///
/// Behaves like [`sd_listen_fds_with_names`][1]: descriptors start at
/// [`LISTEN_FDS_START`] and their number is read from `LISTEN_FDS`. Names are
/// taken from `LISTEN_FDNAMES` if it is set, otherwise every descriptor is
/// named `LISTEN_FD_<fd>`.
///
/// If `LISTEN_PID` is not set, or not equal to the id of the current process,
/// no descriptors are returned.
///
/// Before returning, the descriptors are set as `O_CLOEXEC`. If
/// `unset_environment` is `true`, the `LISTEN_*` variables are removed from
/// the environment (whether or not this function succeeds), so child
/// processes don't attempt to obtain the same descriptors.
///
/// # Errors
///
/// * `LISTEN_PID` is not an integer
/// * `LISTEN_FDS` is not an integer
/// * The number of names in `LISTEN_FDNAMES` does not match `LISTEN_FDS`
/// * Setting `O_CLOEXEC` fails, eg. because the descriptor is not open
///
/// [1]: https://www.freedesktop.org/software/systemd/man/sd_listen_fds.html
pub fn listen_fds(unset_environment: bool) -> Result<Vec<Inherited>, Error> {
    struct Guard(bool);

    impl Drop for Guard {
        fn drop(&mut self) {
            if self.0 {
                env::remove_var(LISTEN_PID);
                env::remove_var(LISTEN_FDS);
                env::remove_var(LISTEN_FDNAMES);
            }
        }
    }

    let _guard = Guard(unset_environment);

    let listen_pid = if let Ok(pid) = env::var(LISTEN_PID) {
        pid
    } else {
        return Ok(Vec::new());
    }
    .parse::<u32>()
    .map_err(|_| invalid("invalid LISTEN_PID"))?;

    if listen_pid != process::id() {
        return Ok(Vec::new());
    }

    let listen_fds = if let Ok(fds) = env::var(LISTEN_FDS) {
        fds
    } else {
        return Ok(Vec::new());
    }
    .parse::<u32>()
    .map_err(|_| invalid("invalid LISTEN_FDS"))?;

    if listen_fds == 0 {
        return Ok(Vec::new());
    }

    let overflow = || invalid("fd count overflowed");
    let count = RawFd::try_from(listen_fds).map_err(|_| overflow())?;
    let last = LISTEN_FDS_START.checked_add(count).ok_or_else(overflow)?;

    let names = match env::var(LISTEN_FDNAMES) {
        Ok(names) => {
            let names = names.split(':').map(String::from).collect::<Vec<_>>();
            if names.len() != listen_fds as usize {
                return Err(invalid("LISTEN_FDNAMES and LISTEN_FDS do not match"));
            }
            Some(names)
        },
        Err(_) => None,
    };

    (LISTEN_FDS_START..last)
        .enumerate()
        .map(|(i, fd)| {
            // Set FD_CLOEXEC to avoid further inheritance to children.
            fcntl(fd, F_SETFD(FdFlag::FD_CLOEXEC)).map_err(io::Error::from)?;
            let inherited = match names.as_ref().map(|names| names[i].as_str()) {
                Some(name) if !name.is_empty() => Inherited::new(fd, name),
                _ => Inherited::unnamed(fd),
            };
            Ok(inherited)
        })
        .collect()
}

fn invalid(msg: &'static str) -> Error {
    Error::Env(io::Error::new(io::ErrorKind::InvalidInput, msg))
}
