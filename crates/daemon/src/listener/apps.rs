// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App registry handlers.

use mirage_adapters::{Cluster, TunnelDialer};
use mirage_core::App;
use mirage_storage::AppRegistry;
use tracing::info;

use super::{registry_error, ListenCtx};
use crate::protocol::Response;

pub(super) fn create<C, D, R>(ctx: &ListenCtx<C, D, R>, app: App) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.registry().create(&app) {
        Ok(()) => {
            info!(app = %app.name, program = %app.program_type, "app created");
            Response::App { app: Box::new(app) }
        }
        Err(e) => registry_error(e),
    }
}

pub(super) fn get<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.registry().get(name) {
        Ok(app) => Response::App { app: Box::new(app) },
        Err(e) => registry_error(e),
    }
}

pub(super) fn update<C, D, R>(ctx: &ListenCtx<C, D, R>, app: App) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.registry().update(&app) {
        Ok(()) => {
            info!(app = %app.name, "app updated");
            Response::App { app: Box::new(app) }
        }
        Err(e) => registry_error(e),
    }
}

/// Delete the record, then release the app's local port.
///
/// The remote process and the workload are left as they are.
pub(super) async fn delete<C, D, R>(ctx: &ListenCtx<C, D, R>, name: &str) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.registry().delete(name) {
        Ok(app) => {
            let stopped = ctx.orchestrator.stop_session(name).await;
            info!(app = %name, tunnel_stopped = stopped, "app deleted");
            Response::App { app: Box::new(app) }
        }
        Err(e) => registry_error(e),
    }
}

pub(super) fn list<C, D, R>(ctx: &ListenCtx<C, D, R>) -> Response
where
    C: Cluster,
    D: TunnelDialer,
    R: AppRegistry,
{
    match ctx.orchestrator.registry().list() {
        Ok(apps) => Response::Apps { apps },
        Err(e) => registry_error(e),
    }
}
