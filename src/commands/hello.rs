use tracing::info;

use super::Context;

pub(crate) fn cmd_hello(ctx: &Context) -> anyhow::Result<()> {
    ctx.console.success("Hello from prompthound CLI!");
    info!("CLI command executed successfully.");
    Ok(())
}
