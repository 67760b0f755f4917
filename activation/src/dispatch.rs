// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Serving the plain and rpc listener groups.
//!
//! Every listener gets its own accept loop, spawned onto the ambient tokio
//! runtime. The functions in here return as soon as the loops are spawned.
//! A loop which fails (eg. because its listener was closed) is logged and
//! ends, the other loops are unaffected.
//!
//! # Panics
//!
//! [`serve_all`] and [`serve_h2c`] panic when called outside of a tokio
//! runtime.

use std::{convert::Infallible, future::Future, net::TcpListener, sync::Arc};

use futures::future::BoxFuture;
use hyper::{
    header::{HeaderMap, CONTENT_TYPE},
    server::conn::AddrStream,
    service::{make_service_fn, service_fn},
    Body,
    Request,
    Response,
    Server,
    StatusCode,
    Version,
};
use tokio::task::JoinHandle;
use tracing::Instrument as _;

use crate::Error;

/// Content type prefix of gRPC requests, eg. `application/grpc+proto`.
pub const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// A plain HTTP handler.
///
/// Implemented for closures `Fn(Request<Body>) -> impl Future<Output =
/// Response<Body>>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response<Body>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<Body>> + Send + 'static,
{
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response<Body>> {
        Box::pin((self)(req))
    }
}

/// A gRPC server.
///
/// [`Handler::call`] answers a single gRPC request routed to it by
/// [`serve_h2c`]. [`RpcServer::serve`] runs the server on a listener of its
/// own.
pub trait RpcServer: Handler {
    /// Serve the rpc listener.
    ///
    /// The default accepts HTTP/2 with prior knowledge only, as gRPC clients
    /// speak it, and answers every request with [`Handler::call`].
    fn serve(self: Arc<Self>, listener: TcpListener) -> BoxFuture<'static, Result<(), Error>>
    where
        Self: Sized,
    {
        Box::pin(serve_on(listener, self, true))
    }
}

/// Where [`serve_h2c`] sends a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Rpc,
    Plain,
}

/// A request is for the [`RpcServer`] iff it is an HTTP/2 request and its
/// content type starts with [`GRPC_CONTENT_TYPE`]. The protocol version is
/// checked first, a gRPC content type over HTTP/1.x is plain.
pub fn route(version: Version, headers: &HeaderMap) -> Route {
    let is_grpc = || {
        headers
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.starts_with(GRPC_CONTENT_TYPE))
            .unwrap_or(false)
    };
    if version == Version::HTTP_2 && is_grpc() {
        Route::Rpc
    } else {
        Route::Plain
    }
}

/// Default plain handler: every request is answered with `404 Not Found`.
pub async fn not_found(_: Request<Body>) -> Response<Body> {
    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp
}

/// Serve the `plain` listeners with `handler` and the `rpc` listeners with
/// `rpc`.
///
/// Plain listeners accept HTTP/1.1 as well as cleartext HTTP/2.
pub fn serve_all<R, H>(
    rpc: Arc<R>,
    handler: Arc<H>,
    plain: Vec<TcpListener>,
    rpcs: Vec<TcpListener>,
) -> Vec<JoinHandle<()>>
where
    R: RpcServer,
    H: Handler,
{
    let mut tasks = Vec::with_capacity(plain.len() + rpcs.len());
    for listener in plain {
        let handler = Arc::clone(&handler);
        tasks.push(spawn_loop("plain", listener, move |listener| {
            serve_on(listener, handler, false)
        }));
    }
    tasks.extend(spawn_rpc(rpc, rpcs));
    tasks
}

/// Serve `listeners` with both `rpc` and `handler` on a single h2c pipeline,
/// and the `rpcs` listeners with `rpc` alone.
///
/// Connections on `listeners` may speak HTTP/1.1 or HTTP/2 with prior
/// knowledge, without TLS. Every request is dispatched on its own according
/// to [`route`], so a single HTTP/2 connection can carry both gRPC and plain
/// requests.
pub fn serve_h2c<R, H>(
    rpc: Arc<R>,
    handler: Arc<H>,
    listeners: Vec<TcpListener>,
    rpcs: Vec<TcpListener>,
) -> Vec<JoinHandle<()>>
where
    R: RpcServer,
    H: Handler,
{
    let mux = Arc::new(Mux {
        rpc: Arc::clone(&rpc),
        plain: handler,
    });
    let mut tasks = Vec::with_capacity(listeners.len() + rpcs.len());
    for listener in listeners {
        let mux = Arc::clone(&mux);
        tasks.push(spawn_loop("h2c", listener, move |listener| {
            serve_on(listener, mux, false)
        }));
    }
    tasks.extend(spawn_rpc(rpc, rpcs));
    tasks
}

struct Mux<R, H> {
    rpc: Arc<R>,
    plain: Arc<H>,
}

impl<R, H> Handler for Mux<R, H>
where
    R: RpcServer,
    H: Handler,
{
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response<Body>> {
        let to = route(req.version(), req.headers());
        match to {
            Route::Rpc => self.rpc.call(req),
            Route::Plain => self.plain.call(req),
        }
    }
}

fn spawn_rpc<R>(rpc: Arc<R>, listeners: Vec<TcpListener>) -> Vec<JoinHandle<()>>
where
    R: RpcServer,
{
    listeners
        .into_iter()
        .map(|listener| {
            let rpc = Arc::clone(&rpc);
            spawn_loop("rpc", listener, move |listener| rpc.serve(listener))
        })
        .collect()
}

fn spawn_loop<F, Fut>(group: &'static str, listener: TcpListener, serve: F) -> JoinHandle<()>
where
    F: FnOnce(TcpListener) -> Fut,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unknown>".to_owned());
    let span = tracing::info_span!("accept loop", group, %addr);
    let serve = serve(listener);
    tokio::spawn(
        async move {
            tracing::info!("serving");
            if let Err(err) = serve.await {
                tracing::error!(%err, "accept loop terminated")
            }
        }
        .instrument(span),
    )
}

async fn serve_on<H>(listener: TcpListener, handler: Arc<H>, http2_only: bool) -> Result<(), Error>
where
    H: Handler,
{
    let make = make_service_fn(move |_: &AddrStream| {
        let handler = Arc::clone(&handler);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let resp = handler.call(req);
                async move { Ok::<_, Infallible>(resp.await) }
            }))
        }
    });
    Server::from_tcp(listener)
        .map_err(io_other)?
        .http2_only(http2_only)
        .serve(make)
        .await
        .map_err(io_other)
}

fn io_other(err: hyper::Error) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}
