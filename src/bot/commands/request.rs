//! Employee Discord commands - submitting, editing and tracking stock requests.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, actor,
            format::{format_request, join_lines},
            handlers::autocomplete::{autocomplete_product, resolve_product},
        },
        core::request::{self, NewRequest},
        entities::RequestAction,
        errors::{Error, Result},
    };

    /// How many of a user's requests `/my_requests` shows.
    const MY_REQUESTS_LIMIT: usize = 20;

    fn positive(quantity: i64) -> Result<i64> {
        if quantity <= 0 {
            return Err(Error::validation("Quantity must be a positive number"));
        }
        Ok(quantity)
    }

    async fn submit_stock_request(
        ctx: Context<'_>,
        product_ref: &str,
        quantity: i64,
        note: Option<String>,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let target = resolve_product(store.db(), product_ref).await?;
        let created = request::submit(
            store,
            &actor(ctx),
            NewRequest {
                product_id: Some(target.id),
                product_name: target.name,
                quantity,
                note,
                action: None,
            },
        )
        .await?;
        ctx.say(format!("📨 Request sent: {}", format_request(&created)))
            .await?;
        Ok(())
    }

    /// Requests adding stock to a product.
    #[poise::command(slash_command)]
    pub async fn stock_in(
        ctx: Context<'_>,
        #[description = "Product"]
        #[autocomplete = "autocomplete_product"]
        product: String,
        #[description = "Units to add"]
        #[min = 1]
        quantity: i64,
        #[description = "Optional note for the admin"] note: Option<String>,
    ) -> Result<()> {
        let quantity = positive(quantity)?;
        submit_stock_request(ctx, &product, quantity, note).await
    }

    /// Requests removing stock from a product.
    #[poise::command(slash_command)]
    pub async fn stock_out(
        ctx: Context<'_>,
        #[description = "Product"]
        #[autocomplete = "autocomplete_product"]
        product: String,
        #[description = "Units to remove"]
        #[min = 1]
        quantity: i64,
        #[description = "Optional note for the admin"] note: Option<String>,
    ) -> Result<()> {
        let quantity = positive(quantity)?;
        submit_stock_request(ctx, &product, -quantity, note).await
    }

    /// Asks for a product that is not in the catalog yet.
    #[poise::command(slash_command)]
    pub async fn request_new_product(
        ctx: Context<'_>,
        #[description = "Name of the product"] name: String,
        #[description = "Units wanted"]
        #[min = 1]
        quantity: i64,
        #[description = "Optional note (size, supplier, ...)"] note: Option<String>,
    ) -> Result<()> {
        let quantity = positive(quantity)?;
        let created = request::submit(
            &ctx.data().store,
            &actor(ctx),
            NewRequest {
                product_id: None,
                product_name: name,
                quantity,
                note,
                action: Some(RequestAction::NewProduct),
            },
        )
        .await?;
        ctx.say(format!("📨 Request sent: {}", format_request(&created)))
            .await?;
        Ok(())
    }

    /// Changes the quantity and note of one of your pending requests.
    ///
    /// The direction (in or out) stays as submitted.
    #[poise::command(slash_command)]
    pub async fn edit_request(
        ctx: Context<'_>,
        #[description = "Request number"] id: i64,
        #[description = "New number of units"]
        #[min = 1]
        quantity: i64,
        #[description = "New note (leave empty to clear)"] note: Option<String>,
    ) -> Result<()> {
        let quantity = positive(quantity)?;
        let store = &ctx.data().store;

        let existing = request::get_request_by_id(store.db(), id)
            .await?
            .ok_or(Error::RequestNotFound { id })?;
        if existing.created_by != ctx.author().id.to_string() {
            return Err(Error::validation("You can only edit your own requests"));
        }

        let signed = if existing.is_stock_in() {
            quantity
        } else {
            -quantity
        };
        let edited = request::edit(store, id, signed, note).await?;
        ctx.say(format!("✏️ Request updated: {}", format_request(&edited)))
            .await?;
        Ok(())
    }

    /// Shows your most recent requests and their status.
    #[poise::command(slash_command)]
    pub async fn my_requests(ctx: Context<'_>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        let mine = request::list_requests_by_creator(ctx.data().store.db(), &user_id).await?;

        if mine.is_empty() {
            ctx.say("You have not submitted any requests yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = mine
            .iter()
            .take(MY_REQUESTS_LIMIT)
            .map(format_request)
            .collect();
        ctx.say(join_lines("🗂️ **Your requests**", &lines)).await?;
        Ok(())
    }
}

pub use inner::*;
