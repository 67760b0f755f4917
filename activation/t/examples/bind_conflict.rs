// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Binds an address which is already in use. Expected to exit with status 1.

use std::net::TcpListener;

use anyhow::Result;

use link_activation::{listen, logging};

fn main() -> Result<()> {
    logging::init()?;

    let taken = TcpListener::bind("127.0.0.1:0")?;
    let addr = taken.local_addr()?.to_string();
    let _listeners = listen::must_bind_tcp(&[addr]);

    Ok(())
}
