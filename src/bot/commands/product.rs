//! Product Discord commands - catalog listing for everyone and `product` management
//! for admins.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, admin_only,
            format::{format_product, join_lines},
            handlers::autocomplete::{autocomplete_product, resolve_product},
        },
        core::product,
        errors::Result,
    };

    /// Lists the product catalog with stock levels, optionally filtered.
    #[poise::command(slash_command)]
    pub async fn products(
        ctx: Context<'_>,
        #[description = "Filter by name or size"] search: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let found =
            product::search_products(data.store.db(), search.as_deref().unwrap_or("")).await?;

        if found.is_empty() {
            ctx.say("No products match.").await?;
            return Ok(());
        }

        let threshold = data.settings.low_stock_threshold;
        let lines: Vec<String> = found
            .iter()
            .map(|p| format_product(p, threshold))
            .collect();
        ctx.say(join_lines("📦 **Products**", &lines)).await?;
        Ok(())
    }

    /// Parent command for catalog management.
    #[poise::command(
        slash_command,
        subcommands("product_add", "product_set_stock", "product_delete", "product_low"),
        check = "admin_only"
    )]
    pub async fn product(ctx: Context<'_>) -> Result<()> {
        ctx.say(
            "Product management. Available subcommands:\n\
            `/product add` - Add a product\n\
            `/product set_stock` - Overwrite a product's stock\n\
            `/product delete` - Delete a product\n\
            `/product low` - List low-stock products",
        )
        .await?;
        Ok(())
    }

    /// Adds a product to the catalog.
    #[poise::command(slash_command, rename = "add", check = "admin_only")]
    pub async fn product_add(
        ctx: Context<'_>,
        #[description = "Product name"] name: String,
        #[description = "Initial stock"]
        #[min = 0]
        stock: i64,
        #[description = "Size descriptor (e.g. XL)"] size: Option<String>,
    ) -> Result<()> {
        let created = product::create_product(&ctx.data().store, name, size, stock).await?;
        ctx.say(format!(
            "✅ Added {}",
            format_product(&created, ctx.data().settings.low_stock_threshold)
        ))
        .await?;
        Ok(())
    }

    /// Overwrites a product's stock with a counted value.
    #[poise::command(slash_command, rename = "set_stock", check = "admin_only")]
    pub async fn product_set_stock(
        ctx: Context<'_>,
        #[description = "Product"]
        #[autocomplete = "autocomplete_product"]
        product: String,
        #[description = "New stock level"]
        #[min = 0]
        stock: i64,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let target = resolve_product(store.db(), &product).await?;
        let updated = product::set_stock(store, target.id, stock).await?;
        ctx.say(format!(
            "✅ Stock set: {}",
            format_product(&updated, ctx.data().settings.low_stock_threshold)
        ))
        .await?;
        Ok(())
    }

    /// Permanently deletes a product. Its request history is kept.
    #[poise::command(slash_command, rename = "delete", check = "admin_only")]
    pub async fn product_delete(
        ctx: Context<'_>,
        #[description = "Product"]
        #[autocomplete = "autocomplete_product"]
        product: String,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let target = resolve_product(store.db(), &product).await?;
        let deleted = product::delete_product(store, target.id).await?;
        ctx.say(format!("🗑️ Deleted **{}**.", deleted.name)).await?;
        Ok(())
    }

    /// Lists products below the low-stock threshold.
    #[poise::command(slash_command, rename = "low", check = "admin_only")]
    pub async fn product_low(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let threshold = data.settings.low_stock_threshold;
        let low = product::list_low_stock(data.store.db(), threshold).await?;

        if low.is_empty() {
            ctx.say(format!("👍 Nothing is below {threshold} units."))
                .await?;
            return Ok(());
        }

        let lines: Vec<String> = low.iter().map(|p| format_product(p, threshold)).collect();
        ctx.say(join_lines("⚠️ **Low stock**", &lines)).await?;
        Ok(())
    }
}

pub use inner::*;
