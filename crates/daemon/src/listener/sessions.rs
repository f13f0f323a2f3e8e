// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug session handlers.

use mirage_adapters::{Cluster, TunnelDialer};
use mirage_storage::AppRegistry;

use super::{orchestrator_error, ListenCtx};
use crate::protocol::Response;

pub(super) async fn status<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.status(name).await {
        Ok(status) => Response::Status { status },
        Err(e) => orchestrator_error(e),
    }
}

pub(super) async fn init_remote<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.init_remote(name).await {
        Ok(status) => Response::Status { status },
        Err(e) => orchestrator_error(e),
    }
}

pub(super) async fn start_debugging<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.start_debugging(name).await {
        Ok(status) => Response::Status { status },
        Err(e) => orchestrator_error(e),
    }
}

pub(super) async fn rollback<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.rollback(name).await {
        Ok(status) => Response::Status { status },
        Err(e) => orchestrator_error(e),
    }
}

pub(super) async fn stop<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    let existed = ctx.orchestrator.stop_session(name).await;
    Response::Stopped { name: name.to_string(), existed }
}
