//! Command executors

mod attach;
mod logs;
mod sync;

pub use attach::attach_command;
pub use logs::{logs_command, LogsRequest};
pub use sync::sync_command;

use anyhow::{anyhow, Result};

use crate::context::AppContext;
use tether_client::ControlPlaneApi;

/// Resolve a target name to its backend uuid.
pub(crate) async fn resolve_target(
    ctx: &AppContext,
    target: &str,
    agent: bool,
) -> Result<String> {
    if agent {
        return ctx
            .agents
            .agent_by_name(&ctx.namespace, target)
            .await?
            .map(|a| a.uuid)
            .ok_or_else(|| anyhow!("Agent not found: {}", target));
    }

    let session = ctx.clients.session(&ctx.namespace).await?;
    let microservice = ctx.api.lookup_microservice(&session, target).await?;
    Ok(microservice.uuid)
}
