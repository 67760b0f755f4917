// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An inherited descriptor is neither a UDP socket nor a listening TCP
    /// socket.
    #[error("inherited socket `{name}` is neither a UDP socket nor a TCP listener")]
    Socket {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to bind `{addr}`")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// The socket activation environment variables are malformed.
    #[error("invalid socket activation environment")]
    Env(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
