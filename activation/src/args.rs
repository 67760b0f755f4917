// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fmt, str::FromStr};

use clap::Parser;

use crate::{listen::split_listen, Policy, Roles};

#[derive(Debug, Default, Eq, PartialEq, Parser)]
pub struct Args {
    /// Comma-separated `host:port` addresses to serve plain HTTP on, used if
    /// the process was not socket activated.
    #[clap(long, env = "HTTP_LISTEN")]
    pub http_listen: Option<Listen>,

    /// Comma-separated `host:port` addresses to serve gRPC on, used if the
    /// process was not socket activated.
    #[clap(long, env = "GRPC_LISTEN")]
    pub grpc_listen: Option<Listen>,

    /// Comma-separated `host:port` addresses to bind UDP sockets on, used if
    /// the process was not socket activated.
    #[clap(long, env = "UDP_LISTEN")]
    pub udp_listen: Option<Listen>,

    /// How the plain listeners are served: "split" serves them with the plain
    /// handler only, "h2c" routes gRPC requests on them to the gRPC server.
    #[clap(long, default_value_t)]
    pub mode: Mode,

    /// Comma-separated socket names (`FileDescriptorName=`) of inherited
    /// listeners which serve gRPC. If not given, the second inherited TCP
    /// listener serves gRPC.
    #[clap(long)]
    pub rpc_names: Option<Listen>,

    /// Skip inherited sockets which are neither TCP listeners nor UDP sockets,
    /// instead of refusing to start.
    #[clap(long)]
    pub degrade: bool,
}

impl Args {
    pub fn roles(&self) -> Roles {
        match &self.rpc_names {
            Some(names) => Roles::named(names.0.iter().cloned()),
            None => Roles::Positional,
        }
    }

    pub fn policy(&self) -> Policy {
        if self.degrade {
            Policy::Degrade
        } else {
            Policy::FailFast
        }
    }
}

/// A list of addresses (or names), given comma-separated.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Listen(pub Vec<String>);

impl Listen {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for Listen {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(split_listen(s)))
    }
}

impl fmt::Display for Listen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Split,
    H2c,
}

impl Default for Mode {
    fn default() -> Self {
        Self::H2c
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Split => "split",
            Self::H2c => "h2c",
        };
        f.write_str(s)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(Self::Split),
            "h2c" => Ok(Self::H2c),
            _ => Err(format!("unsupported mode `{}`", s)),
        }
    }
}
