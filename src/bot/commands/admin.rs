//! Admin Discord commands - the review queue, direct adjustments, statistics and
//! housekeeping. Every command here is gated by [`crate::bot::admin_only`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, actor, admin_only,
            format::{format_request, format_stats, join_lines},
            handlers::autocomplete::{autocomplete_product, resolve_product},
            watchers::cached_stats,
        },
        core::{
            ledger::{self, Direction},
            product, request, retention,
        },
        errors::Result,
    };

    /// How many resolved requests `/history` shows.
    const HISTORY_LIMIT: usize = 25;

    /// Direction choice for `/adjust`.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum AdjustDirection {
        #[name = "in"]
        In,
        #[name = "out"]
        Out,
    }

    impl From<AdjustDirection> for Direction {
        fn from(value: AdjustDirection) -> Self {
            match value {
                AdjustDirection::In => Self::In,
                AdjustDirection::Out => Self::Out,
            }
        }
    }

    /// Lists requests awaiting a decision, oldest first.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn pending(ctx: Context<'_>) -> Result<()> {
        let queue = request::list_pending_requests(ctx.data().store.db()).await?;
        if queue.is_empty() {
            ctx.say("✨ Clear! Nothing is waiting.").await?;
            return Ok(());
        }

        let lines: Vec<String> = queue.iter().map(format_request).collect();
        ctx.say(join_lines("⏳ **Pending requests**", &lines))
            .await?;
        Ok(())
    }

    /// Approves a pending request and applies its stock change.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn approve(
        ctx: Context<'_>,
        #[description = "Request number"] id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let approved =
            request::approve(&data.store, id, data.settings.negative_stock_policy).await?;

        let mut reply = format!("✅ Approved {}", format_request(&approved));
        if let Some(product_id) = approved.product_id {
            if let Some(p) = product::get_product_by_id(data.store.db(), product_id).await? {
                reply.push_str(&format!("\nNew stock for **{}**: {}", p.name, p.stock));
            }
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Rejects a pending request.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn reject(
        ctx: Context<'_>,
        #[description = "Request number"] id: i64,
    ) -> Result<()> {
        let rejected = request::reject(&ctx.data().store, id).await?;
        ctx.say(format!("❌ Rejected {}", format_request(&rejected)))
            .await?;
        Ok(())
    }

    /// Changes a product's stock directly. The change is recorded as an approved request.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn adjust(
        ctx: Context<'_>,
        #[description = "Product"]
        #[autocomplete = "autocomplete_product"]
        product: String,
        #[description = "Add or remove stock"] direction: AdjustDirection,
        #[description = "Number of units"]
        #[min = 1]
        amount: i64,
        #[description = "Reason for the adjustment"] note: Option<String>,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let target = resolve_product(store.db(), &product).await?;
        let audit = ledger::direct_adjust(
            store,
            target.id,
            direction.into(),
            amount,
            note,
            &actor(ctx),
        )
        .await?;

        let current = product::get_product_by_id(store.db(), target.id)
            .await?
            .map_or(0, |p| p.stock);
        ctx.say(format!(
            "🔧 {}\nNew stock for **{}**: {current}",
            format_request(&audit),
            target.name
        ))
        .await?;
        Ok(())
    }

    /// Shows stock movement totals and the top sellers.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn stats(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let stats = cached_stats(&data.store, &data.stats).await?;
        ctx.say(format_stats(&stats)).await?;
        Ok(())
    }

    /// Shows the most recently resolved requests.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn history(ctx: Context<'_>) -> Result<()> {
        let resolved = request::list_resolved_requests(ctx.data().store.db()).await?;
        if resolved.is_empty() {
            ctx.say("No resolved requests yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = resolved
            .iter()
            .take(HISTORY_LIMIT)
            .map(format_request)
            .collect();
        ctx.say(join_lines("📜 **History**", &lines)).await?;
        Ok(())
    }

    /// Purges resolved requests older than the retention horizon right away.
    #[poise::command(slash_command, check = "admin_only")]
    pub async fn cleanup(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let deleted = retention::sweep(&data.store, data.settings.retention_days).await?;
        ctx.say(format!(
            "🧹 Removed {deleted} resolved request(s) older than {} days.",
            data.settings.retention_days
        ))
        .await?;
        Ok(())
    }
}

pub use inner::*;
