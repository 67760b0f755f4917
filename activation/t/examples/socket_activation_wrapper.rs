// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Plays the supervisor for itself: opens sockets, moves them to the
//! descriptors a supervisor would pass them on, sets the `LISTEN_*`
//! environment and loads them back. Exits with a non-zero status if the
//! sockets don't come back as expected.

use std::{
    env,
    net::{SocketAddr, TcpListener, UdpSocket},
    os::unix::io::{IntoRawFd as _, RawFd},
};

use anyhow::{ensure, Result};
use nix::{
    fcntl::{fcntl, FcntlArg::F_DUPFD},
    unistd::{close, dup2, Pid},
};

use link_activation::{
    args::Args,
    env::{is_activated, LISTEN_FDNAMES, LISTEN_FDS, LISTEN_FDS_START, LISTEN_PID},
    sockets::{self, OpenMode},
};

fn main() -> Result<()> {
    let http = TcpListener::bind("127.0.0.1:0")?;
    let dns = UdpSocket::bind("127.0.0.1:0")?;
    let grpc = TcpListener::bind("127.0.0.1:0")?;
    let admin = TcpListener::bind("127.0.0.1:0")?;

    let http_addr = http.local_addr()?;
    let dns_addr = dns.local_addr()?;
    let grpc_addr = grpc.local_addr()?;
    let admin_addr = admin.local_addr()?;

    pass_down(vec![
        http.into_raw_fd(),
        dns.into_raw_fd(),
        grpc.into_raw_fd(),
        admin.into_raw_fd(),
    ])?;
    env::set_var(LISTEN_FDS, "4");
    env::set_var(LISTEN_FDNAMES, "http:dns:grpc:admin");
    env::set_var(LISTEN_PID, Pid::this().to_string());

    let loaded = sockets::load(&Args::default())?;
    ensure!(
        loaded.open_mode == OpenMode::SocketActivated,
        "sockets were not activated"
    );
    ensure!(!is_activated(), "activation environment was not cleared");

    let groups = loaded.groups;
    ensure!(
        tcp_addrs(&groups.plain)? == vec![http_addr, admin_addr],
        "unexpected plain listeners"
    );
    ensure!(
        tcp_addrs(&groups.rpc)? == vec![grpc_addr],
        "unexpected rpc listeners"
    );
    ensure!(
        groups
            .udp
            .iter()
            .map(|s| s.local_addr())
            .collect::<Result<Vec<_>, _>>()?
            == vec![dns_addr],
        "unexpected UDP sockets"
    );

    Ok(())
}

/// Move `fds` to `LISTEN_FDS_START`, `LISTEN_FDS_START + 1`, ...
fn pass_down(fds: Vec<RawFd>) -> Result<()> {
    let mut parked = Vec::with_capacity(fds.len());
    for fd in fds {
        parked.push(fcntl(fd, F_DUPFD(64))?);
        close(fd)?;
    }
    for (target, fd) in (LISTEN_FDS_START..).zip(parked) {
        dup2(fd, target)?;
        close(fd)?;
    }
    Ok(())
}

fn tcp_addrs(listeners: &[TcpListener]) -> Result<Vec<SocketAddr>> {
    Ok(listeners
        .iter()
        .map(|l| l.local_addr())
        .collect::<Result<_, _>>()?)
}
