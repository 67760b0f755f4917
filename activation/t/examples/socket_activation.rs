// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! # Using systemd:
//!
//! `example.socket`:
//! ```text
//! [Socket]
//! ListenStream=8080
//! ListenStream=50051
//!
//! [Install]
//! WantedBy=sockets.target
//! ```
//!
//! The second `ListenStream=` is the gRPC listener.
//!
//! # Alternately, using `systemfd`
//!
//! ```text
//! systemfd -s 8080 -s 50051 -- cargo run -p link-activation-test --example socket_activation
//! ```
//!
//! # Without socket activation
//!
//! ```text
//! cargo run -p link-activation-test --example socket_activation -- \
//!     --http-listen 127.0.0.1:8080 --grpc-listen 127.0.0.1:50051
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser as _;
use futures::future::BoxFuture;
use hyper::{Body, Request, Response};

use link_activation::{
    args::{Args, Mode},
    dispatch::{self, Handler, RpcServer},
    logging,
    signals,
    sockets,
};

/// Answers every gRPC call with an empty, successful response.
struct Echo;

impl Handler for Echo {
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response<Body>> {
        Box::pin(async move {
            tracing::info!(path = %req.uri().path(), "rpc");
            Response::builder()
                .header("content-type", "application/grpc")
                .header("grpc-status", "0")
                .body(Body::empty())
                .unwrap_or_else(|_| Response::new(Body::empty()))
        })
    }
}

impl RpcServer for Echo {}

async fn hello(req: Request<Body>) -> Response<Body> {
    Response::new(Body::from(format!("hello from {}\n", req.uri().path())))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let args = Args::parse();

    let sockets = sockets::load(&args)?;
    let groups = sockets.groups;
    tracing::info!(
        open_mode = ?sockets.open_mode,
        plain = groups.plain.len(),
        rpc = groups.rpc.len(),
        udp = groups.udp.len(),
        "loaded sockets"
    );

    let rpc = Arc::new(Echo);
    let plain = Arc::new(hello);
    let _tasks = match args.mode {
        Mode::Split => dispatch::serve_all(rpc, plain, groups.plain, groups.rpc),
        Mode::H2c => dispatch::serve_h2c(rpc, plain, groups.plain, groups.rpc),
    };

    signals::wait_interrupt().await?;
    Ok(())
}
