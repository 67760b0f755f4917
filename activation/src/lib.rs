// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Socket activation for network services.
//!
//! A process supervisor (`systemd`, `systemfd`, ...) may open the sockets a
//! service listens on and hand the descriptors down at launch. This crate
//! turns those descriptors into TCP listeners and UDP sockets
//! ([`socket::wrap`]), splits the TCP listeners into a "plain" HTTP group and
//! an "rpc" group ([`partition()`]), and serves both groups, either with
//! separate accept loops ([`dispatch::serve_all`]) or with a single h2c
//! pipeline which routes gRPC requests by content type
//! ([`dispatch::serve_h2c`]).
//!
//! When no descriptors were passed, the same groups are bound from explicit
//! addresses instead ([`listen`]). [`sockets::load`] picks between the two.

pub mod args;
pub mod dispatch;
pub mod env;
pub mod listen;
pub mod logging;
pub mod partition;
pub mod signals;
pub mod socket;
pub mod sockets;

mod error;
pub use error::Error;

pub use partition::{merge, partition, partition_with, Groups, Merged, Policy, Roles};
pub use socket::{Activated, Kind, Socket};
