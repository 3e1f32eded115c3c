//! Sync command implementation

use anyhow::{Context, Result};

use crate::context::AppContext;
use crate::output::print_success;

/// Reconcile local agent records with the controller's inventory.
pub async fn sync_command(ctx: &AppContext) -> Result<()> {
    ctx.sync
        .run(&ctx.namespace)
        .await
        .context("Inventory sync failed")?;
    print_success(&format!("Namespace '{}' synchronized", ctx.namespace));
    Ok(())
}
