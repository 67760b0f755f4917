// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Binding sockets from explicit addresses, for processes which were not
//! socket activated.

use std::{
    net::{TcpListener, UdpSocket},
    process,
};

use crate::Error;

/// Bind one TCP listener per `host:port` address, in order.
pub fn bind_tcp<S: AsRef<str>>(addrs: &[S]) -> Result<Vec<TcpListener>, Error> {
    bind(addrs, |addr| TcpListener::bind(addr))
}

/// Bind one UDP socket per `host:port` address, in order.
pub fn bind_udp<S: AsRef<str>>(addrs: &[S]) -> Result<Vec<UdpSocket>, Error> {
    bind(addrs, |addr| UdpSocket::bind(addr))
}

/// Like [`bind_tcp`], but exits the process if any address can't be bound.
///
/// The addresses are static configuration, so failing to bind one of them is
/// not something the process can recover from.
pub fn must_bind_tcp<S: AsRef<str>>(addrs: &[S]) -> Vec<TcpListener> {
    bind_tcp(addrs).unwrap_or_else(|e| fatal(e))
}

/// Like [`bind_udp`], but exits the process if any address can't be bound.
pub fn must_bind_udp<S: AsRef<str>>(addrs: &[S]) -> Vec<UdpSocket> {
    bind_udp(addrs).unwrap_or_else(|e| fatal(e))
}

/// Split a comma-separated list of addresses. The empty string is the empty
/// list.
pub fn split_listen(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(String::from).collect()
}

fn bind<S, T, F>(addrs: &[S], bind: F) -> Result<Vec<T>, Error>
where
    S: AsRef<str>,
    F: Fn(&str) -> std::io::Result<T>,
{
    addrs
        .iter()
        .map(|addr| {
            let addr = addr.as_ref();
            let sock = bind(addr).map_err(|source| Error::Bind {
                addr: addr.to_owned(),
                source,
            })?;
            tracing::info!(%addr, "bound");
            Ok(sock)
        })
        .collect()
}

fn fatal(err: Error) -> ! {
    match std::error::Error::source(&err) {
        Some(source) => tracing::error!(%err, %source, "exiting"),
        None => tracing::error!(%err, "exiting"),
    }
    process::exit(1)
}
