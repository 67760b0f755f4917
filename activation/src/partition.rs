// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    collections::BTreeSet,
    net::{TcpListener, UdpSocket},
};

use crate::{
    socket::{Activated, Socket},
    Error,
};

/// Inherited sockets, grouped by purpose.
#[derive(Debug, Default)]
pub struct Groups {
    pub udp: Vec<UdpSocket>,
    /// Listeners for conventional HTTP traffic.
    pub plain: Vec<TcpListener>,
    /// Listeners for gRPC traffic.
    pub rpc: Vec<TcpListener>,
    /// Errors of descriptors skipped under [`Policy::Degrade`]. Always empty
    /// under [`Policy::FailFast`].
    pub rejected: Vec<Error>,
}

/// Inherited sockets without any partitioning of the TCP listeners.
#[derive(Debug, Default)]
pub struct Merged {
    pub udp: Vec<UdpSocket>,
    pub tcp: Vec<TcpListener>,
}

/// What to do about a descriptor which is neither TCP nor UDP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Abort with the first error. Inherited descriptors are expected to be
    /// well-formed, so anything else is a supervisor misconfiguration.
    FailFast,
    /// Skip the descriptor and record its error in [`Groups::rejected`].
    Degrade,
}

impl Default for Policy {
    fn default() -> Self {
        Self::FailFast
    }
}

/// How TCP listeners are assigned to the plain and rpc groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Roles {
    /// The second TCP listener is the rpc listener, all others are plain. See
    /// [`partition`].
    Positional,
    /// A TCP listener is an rpc listener iff its descriptor name (ie. its
    /// `FileDescriptorName=`) is one of these.
    Named(BTreeSet<String>),
}

impl Default for Roles {
    fn default() -> Self {
        Self::Positional
    }
}

impl Roles {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Named(names.into_iter().map(Into::into).collect())
    }
}

/// Split classified sockets into UDP sockets, plain and rpc TCP listeners.
///
/// # Errors
///
/// The first [`Socket::Error`] aborts the whole partition, no sockets are
/// returned.
///
/// # Ordering
///
/// **The rpc listener is chosen by position**: among the TCP listeners, in
/// descriptor order, the first one is plain, the second one (if any) is rpc,
/// and the third and any further ones are plain again. Precisely, a TCP
/// listener is rpc iff there already is a plain listener and there is no rpc
/// listener yet. UDP sockets do not count.
///
/// The supervisor therefore has to pass the descriptors in exactly that
/// order. Use [`partition_with`] and [`Roles::Named`] to assign roles by
/// descriptor name instead.
pub fn partition(sockets: Vec<Activated>) -> Result<Groups, Error> {
    partition_with(sockets, Policy::FailFast, &Roles::Positional)
}

/// [`partition`] with an explicit [`Policy`] and [`Roles`].
pub fn partition_with(
    sockets: Vec<Activated>,
    policy: Policy,
    roles: &Roles,
) -> Result<Groups, Error> {
    let mut groups = Groups::default();
    for Activated { name, socket } in sockets {
        match socket {
            Socket::Error(source) => {
                let err = Error::Socket { name, source };
                match policy {
                    Policy::FailFast => return Err(err),
                    Policy::Degrade => {
                        tracing::warn!(%err, "skipping inherited socket");
                        groups.rejected.push(err)
                    },
                }
            },
            Socket::Udp(udp) => groups.udp.push(udp),
            Socket::Tcp(tcp) => {
                let is_rpc = match roles {
                    Roles::Positional => !groups.plain.is_empty() && groups.rpc.is_empty(),
                    Roles::Named(names) => names.contains(&name),
                };
                tracing::debug!(%name, rpc = is_rpc, "inherited TCP listener");
                if is_rpc {
                    groups.rpc.push(tcp)
                } else {
                    groups.plain.push(tcp)
                }
            },
        }
    }

    Ok(groups)
}

/// Split classified sockets into UDP sockets and TCP listeners, for serving
/// with [`crate::dispatch::serve_h2c`] where every request is routed on its
/// own.
///
/// # Errors
///
/// The first [`Socket::Error`] aborts, as in [`partition`].
pub fn merge(sockets: Vec<Activated>) -> Result<Merged, Error> {
    let mut merged = Merged::default();
    for Activated { name, socket } in sockets {
        match socket {
            Socket::Error(source) => return Err(Error::Socket { name, source }),
            Socket::Udp(udp) => merged.udp.push(udp),
            Socket::Tcp(tcp) => merged.tcp.push(tcp),
        }
    }

    Ok(merged)
}
