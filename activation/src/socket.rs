// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    io,
    mem::ManuallyDrop,
    net::{TcpListener, UdpSocket},
    os::unix::io::{FromRawFd as _, RawFd},
};

use nix::sys::socket::{getsockopt, sockopt::AcceptConn};
use socket2::Type;

use crate::env::Inherited;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Tcp,
    Udp,
}

/// What an inherited descriptor turned out to be.
#[derive(Debug)]
pub enum Socket {
    Tcp(TcpListener),
    Udp(UdpSocket),
    /// The descriptor could not be interpreted as either. It is left open and
    /// untouched.
    Error(io::Error),
}

impl Socket {
    /// `None` for [`Socket::Error`].
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::Tcp(_) => Some(Kind::Tcp),
            Self::Udp(_) => Some(Kind::Udp),
            Self::Error(_) => None,
        }
    }
}

/// A classified inherited descriptor.
#[derive(Debug)]
pub struct Activated {
    pub name: String,
    pub socket: Socket,
}

impl Activated {
    pub fn kind(&self) -> Option<Kind> {
        self.socket.kind()
    }
}

/// Classify every inherited descriptor, preserving order.
///
/// The result has the same length as the input and the `n`th [`Activated`]
/// corresponds to the `n`th descriptor. Failures are recorded per position as
/// [`Socket::Error`], it is up to [`crate::partition()`] to decide what to do
/// about them.
pub fn wrap<I>(fds: I) -> Vec<Activated>
where
    I: IntoIterator<Item = Inherited>,
{
    fds.into_iter()
        .map(|Inherited { fd, name }| {
            let socket = classify(fd);
            match &socket {
                Socket::Error(err) => {
                    tracing::debug!(%name, fd, %err, "unusable inherited socket")
                },
                socket => tracing::trace!(%name, fd, kind = ?socket.kind(), "inherited socket"),
            }
            Activated { name, socket }
        })
        .collect()
}

/// Classify a single descriptor.
///
/// The UDP probe runs first: an `AF_INET` / `AF_INET6` datagram socket is a
/// [`Socket::Udp`]. Otherwise an `AF_INET` / `AF_INET6` stream socket in
/// listening state is a [`Socket::Tcp`]. If neither matches, the error of the
/// TCP probe is returned.
///
/// On success, ownership of `fd` moves into the returned socket. The
/// descriptor is never duplicated, and never closed on failure.
pub fn classify(fd: RawFd) -> Socket {
    match probe_udp(fd) {
        Ok(udp) => Socket::Udp(udp),
        Err(_) => match probe_tcp(fd) {
            Ok(tcp) => Socket::Tcp(tcp),
            Err(e) => Socket::Error(e),
        },
    }
}

/// Find the first socket of `kind` at or after `start`.
pub fn find(sockets: &[Activated], start: usize, kind: Kind) -> Option<usize> {
    sockets
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, s)| s.kind() == Some(kind))
        .map(|(i, _)| i)
}

fn probe_udp(fd: RawFd) -> io::Result<UdpSocket> {
    let sock = borrow(fd);
    is_inet(&sock)?;
    is_type(&sock, Type::DGRAM)?;
    Ok(ManuallyDrop::into_inner(sock).into())
}

fn probe_tcp(fd: RawFd) -> io::Result<TcpListener> {
    let sock = borrow(fd);
    is_inet(&sock)?;
    is_type(&sock, Type::STREAM)?;
    if !getsockopt(fd, AcceptConn).map_err(io::Error::from)? {
        return Err(invalid(format!("stream socket {} is not listening", fd)));
    }
    Ok(ManuallyDrop::into_inner(sock).into())
}

/// View `fd` as a socket without taking ownership. Dropping the returned
/// value does not close `fd`.
fn borrow(fd: RawFd) -> ManuallyDrop<socket2::Socket> {
    ManuallyDrop::new(unsafe { socket2::Socket::from_raw_fd(fd) })
}

fn is_inet(sock: &socket2::Socket) -> io::Result<()> {
    match sock.local_addr()?.as_socket() {
        Some(_) => Ok(()),
        None => Err(invalid("not an internet socket")),
    }
}

fn is_type(sock: &socket2::Socket, expected: Type) -> io::Result<()> {
    let actual = sock.r#type()?;
    if actual == expected {
        Ok(())
    } else {
        Err(invalid(format!(
            "expected socket type {:?}, found {:?}",
            expected, actual
        )))
    }
}

fn invalid<E>(error: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidInput, error)
}
