//! Logs command implementation

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::commands::resolve_target;
use crate::context::AppContext;
use crate::urls::{self, LogQuery, LogTarget};
use tether_session::{classify, LogStreamController, WsTransport};

/// Parsed logs invocation
pub struct LogsRequest {
    pub target: String,
    pub agent: bool,
    pub system: bool,
    pub tail: u32,
    pub follow: bool,
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Stream a target's logs to stdout until the stream ends or the user
/// interrupts.
pub async fn logs_command(ctx: &AppContext, request: LogsRequest) -> Result<()> {
    let session = ctx.clients.session(&ctx.namespace).await?;
    let uuid = resolve_target(ctx, &request.target, request.agent).await?;

    let kind = if request.agent {
        LogTarget::Agent
    } else if request.system {
        LogTarget::SystemMicroservice
    } else {
        LogTarget::Microservice
    };

    let query = LogQuery {
        tail: request.tail,
        follow: request.follow,
        since: request.since.as_deref().map(urls::parse_rfc3339).transpose()?,
        until: request.until.as_deref().map(urls::parse_rfc3339).transpose()?,
    };
    let url = urls::logs_url(session.base_url(), kind, &uuid, &query)?;

    let transport = Arc::new(WsTransport::new(uuid.clone()));
    if let Err(err) = transport
        .connect(url.as_str(), Some(&session.access_token()))
        .await
    {
        return Err(anyhow!(classify(Some(&err))));
    }

    ctx.registry.register(transport.session_id(), &uuid);
    let result = LogStreamController::stdio(Arc::clone(&transport)).run().await;
    ctx.registry.remove(transport.session_id());

    result.map_err(|err| anyhow!(classify(Some(&err))))
}
