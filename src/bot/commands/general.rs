//! General Discord commands - ping and help.
//! This module contains simple commands that don't require database operations.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**StockBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Employee Commands**\n\
        • `/products [search]` - Lists the catalog with stock levels.\n\
        • `/stock_in <product> <quantity> [note]` - Requests adding stock.\n\
        • `/stock_out <product> <quantity> [note]` - Requests removing stock.\n\
        • `/request_new_product <name> <quantity> [note]` - Asks for a product that is not in the catalog.\n\
        • `/edit_request <id> <quantity> [note]` - Changes one of your pending requests.\n\
        • `/my_requests` - Shows your requests and their status.\n\n\
        **Admin Commands**\n\
        • `/pending` - Lists requests awaiting a decision.\n\
        • `/approve <id>` / `/reject <id>` - Resolves a request.\n\
        • `/adjust <product> <in|out> <amount> [note]` - Changes stock directly (audited).\n\
        • `/product <add|set_stock|delete|low>` - Manages the catalog.\n\
        • `/stats` - Shows stock movement and top sellers.\n\
        • `/history` - Shows recently resolved requests.\n\
        • `/cleanup` - Purges old resolved requests now.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
