// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP listener with graceful shutdown.

use std::{future::Future, io, net::SocketAddr, time::Duration};

use axum::Router;
use axum_server::Handle;
use tracing::info;

/// In-flight requests get this long to finish once shutdown starts.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve `app` on `addr` until `shutdown` resolves, then drain connections.
pub async fn serve_until<F>(addr: SocketAddr, app: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(drain_on(handle.clone(), shutdown));

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

async fn drain_on<F>(handle: Handle<SocketAddr>, shutdown: F)
where
    F: Future<Output = ()>,
{
    shutdown.await;
    info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
}
