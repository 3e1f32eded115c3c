//! Attach command implementation

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::commands::resolve_target;
use crate::context::AppContext;
use crate::output::{print_info, print_success};
use crate::urls;
use tether_session::{classify, TerminalController, WsTransport};

/// Open an interactive exec session against a microservice or agent and
/// drive it to completion.
pub async fn attach_command(ctx: &AppContext, target: &str, agent: bool) -> Result<()> {
    let session = ctx.clients.session(&ctx.namespace).await?;
    let uuid = resolve_target(ctx, target, agent).await?;
    let url = urls::exec_url(session.base_url(), &uuid)?;

    print_info(&format!(
        "Attaching to '{}'... (Ctrl+C twice or Ctrl+D to exit)",
        target
    ));

    let transport = Arc::new(WsTransport::new(uuid.clone()));
    if let Err(err) = transport
        .connect(url.as_str(), Some(&session.access_token()))
        .await
    {
        return Err(anyhow!(classify(Some(&err))));
    }

    ctx.registry.register(transport.session_id(), &uuid);
    let result = TerminalController::stdio(Arc::clone(&transport)).run().await;
    ctx.registry.remove(transport.session_id());

    match result {
        Ok(()) => {
            print_success("Session closed");
            Ok(())
        }
        Err(err) => Err(anyhow!(classify(Some(&err)))),
    }
}
