// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    net::{SocketAddr, TcpListener, UdpSocket},
    os::unix::io::{IntoRawFd as _, RawFd},
};

use link_activation::{env::Inherited, Kind};
use nix::{
    sys::socket::{socket, AddressFamily, SockFlag, SockType},
    unistd::close,
};
use proptest::prelude::*;

/// The kind of descriptor a supervisor might hand down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fd {
    /// A listening TCP socket.
    Tcp,
    /// A bound UDP socket.
    Udp,
    /// An internet stream socket which is not listening.
    Invalid,
}

impl Fd {
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::Tcp => Some(Kind::Tcp),
            Self::Udp => Some(Kind::Udp),
            Self::Invalid => None,
        }
    }
}

pub fn fd() -> impl Strategy<Value = Fd> {
    prop_oneof![Just(Fd::Tcp), Just(Fd::Udp), Just(Fd::Invalid)]
}

pub fn valid_fd() -> impl Strategy<Value = Fd> {
    prop_oneof![Just(Fd::Tcp), Just(Fd::Udp)]
}

pub fn fds() -> impl Strategy<Value = Vec<Fd>> {
    prop::collection::vec(fd(), 0..8)
}

pub fn valid_fds() -> impl Strategy<Value = Vec<Fd>> {
    prop::collection::vec(valid_fd(), 0..8)
}

/// An open descriptor, and what it was opened as.
#[derive(Clone, Debug)]
pub struct Opened {
    pub fd: Fd,
    pub inherited: Inherited,
    /// Local address of valid sockets.
    pub addr: Option<SocketAddr>,
}

/// Open a descriptor of every given kind, named `sock-<index>`.
pub fn open_all(fds: &[Fd]) -> Vec<Opened> {
    fds.iter()
        .enumerate()
        .map(|(i, fd)| open(*fd, format!("sock-{}", i)))
        .collect()
}

pub fn open(fd: Fd, name: String) -> Opened {
    let (raw, addr) = match fd {
        Fd::Tcp => {
            let (raw, addr) = tcp_listener();
            (raw, Some(addr))
        },
        Fd::Udp => {
            let (raw, addr) = udp_socket();
            (raw, Some(addr))
        },
        Fd::Invalid => (unlistened_stream(), None),
    };
    Opened {
        fd,
        inherited: Inherited::new(raw, name),
        addr,
    }
}

pub fn inherited(opened: &[Opened]) -> Vec<Inherited> {
    opened.iter().map(|o| o.inherited.clone()).collect()
}

/// Close the descriptors which were not adopted by classification.
pub fn close_invalid(opened: &[Opened]) {
    for o in opened.iter().filter(|o| o.fd == Fd::Invalid) {
        close(o.inherited.fd).unwrap()
    }
}

/// Addresses of the TCP listeners, in order.
pub fn tcp_addrs(opened: &[Opened]) -> Vec<SocketAddr> {
    opened
        .iter()
        .filter(|o| o.fd == Fd::Tcp)
        .filter_map(|o| o.addr)
        .collect()
}

/// Addresses of the UDP sockets, in order.
pub fn udp_addrs(opened: &[Opened]) -> Vec<SocketAddr> {
    opened
        .iter()
        .filter(|o| o.fd == Fd::Udp)
        .filter_map(|o| o.addr)
        .collect()
}

pub fn tcp_listener() -> (RawFd, SocketAddr) {
    let l = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = l.local_addr().unwrap();
    (l.into_raw_fd(), addr)
}

pub fn udp_socket() -> (RawFd, SocketAddr) {
    let s = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = s.local_addr().unwrap();
    (s.into_raw_fd(), addr)
}

pub fn unlistened_stream() -> RawFd {
    socket(
        AddressFamily::Inet,
        SockType::Stream,
        SockFlag::empty(),
        None,
    )
    .unwrap()
}
