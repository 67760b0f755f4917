// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{
    args::{Args, Listen},
    env,
    listen,
    partition_with,
    socket,
    Error,
    Groups,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// File descriptors were provided by socket activation
    SocketActivated,
    /// File descriptors were created by this process
    InProcess,
}

/// Sockets the process serves on
#[derive(Debug)]
pub struct Sockets {
    pub groups: Groups,
    pub open_mode: OpenMode,
}

/// Load the sockets to serve on.
///
/// If descriptors were passed via socket activation, they are classified and
/// partitioned according to [`Args::policy`] and [`Args::roles`]. Otherwise
/// the addresses given in `args` are bound: `http_listen` as plain listeners,
/// `grpc_listen` as rpc listeners and `udp_listen` as UDP sockets.
///
/// The `LISTEN_*` environment variables are removed in either case.
pub fn load(args: &Args) -> Result<Sockets, Error> {
    let inherited = env::listen_fds(true)?;
    if !inherited.is_empty() {
        tracing::info!(sockets = inherited.len(), "using socket activation");
        let groups = partition_with(socket::wrap(inherited), args.policy(), &args.roles())?;
        return Ok(Sockets {
            groups,
            open_mode: OpenMode::SocketActivated,
        });
    }

    tracing::info!("binding sockets from configured addresses");
    let groups = Groups {
        udp: listen::bind_udp(addrs(&args.udp_listen))?,
        plain: listen::bind_tcp(addrs(&args.http_listen))?,
        rpc: listen::bind_tcp(addrs(&args.grpc_listen))?,
        rejected: Vec::new(),
    };
    Ok(Sockets {
        groups,
        open_mode: OpenMode::InProcess,
    })
}

fn addrs(listen: &Option<Listen>) -> &[String] {
    listen.as_ref().map(Listen::as_slice).unwrap_or(&[])
}
