//! Admin product management: the creation wizard and in-place edits.
//!
//! The wizard asks one field per message in the order of
//! [`WIZARD_STEPS`](crate::core::state::WIZARD_STEPS). A bad answer repeats
//! the same question. Editing reuses the wizard states for a single field.

use crate::{
    bot::{
        messenger::{Messenger, Outbound},
        router::Turn,
        views,
    },
    core::{
        catalog::{self, NewProduct},
        price_table::{self, PriceTable},
        scratch::{AdminTask, ProductDraft},
        state::ConversationState,
        token::{Action, ProductField},
    },
    errors::{Error, Result},
};
use tracing::info;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::AdminProducts | Action::AdminEditProducts => list(turn).await,
        Action::AdminAddProduct => {
            turn.data.scratch.start_draft(turn.user.id);
            ask(turn, ConversationState::AdminWaitingForProductName).await
        }
        Action::EditProduct(product_id) => {
            let product = catalog::require_product(turn.db(), product_id).await?;
            turn.reply(views::admin_product_card(&product, turn.currency()))
                .await
        }
        Action::EditField { field, product_id } => {
            catalog::require_product(turn.db(), product_id).await?;
            turn.data.scratch.start_edit(turn.user.id, product_id, field);
            ask(turn, views::field_state(field)).await
        }
        Action::ToggleProduct(product_id) => {
            let product = catalog::toggle_product(turn.db(), product_id).await?;
            turn.audit(
                "toggle_product",
                &format!("product {product_id} active={}", product.is_active),
            )
            .await?;
            turn.reply(views::admin_product_card(&product, turn.currency()))
                .await
        }
        Action::DeleteProduct(product_id) => {
            let product = catalog::delete_product(turn.db(), product_id).await?;
            turn.audit("delete_product", &format!("product {product_id} {}", product.name))
                .await?;
            turn.toast(&format!("🗑 {} deleted", product.name)).await?;
            list(turn).await
        }
        other => super::misrouted("admin_products", &other),
    }
}

async fn list<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let products = catalog::all_products(turn.db()).await?;
    turn.set_state(ConversationState::AdminPanel).await?;
    turn.reply(views::admin_products(&products, turn.currency()))
        .await
}

async fn ask<M: Messenger>(turn: &mut Turn<'_, M>, state: ConversationState) -> Result<()> {
    turn.set_state(state).await?;
    turn.reply(views::admin_prompt(state)).await
}

/// Repeats the current question under the validation error.
async fn ask_again<M: Messenger>(turn: &Turn<'_, M>, error: &Error) -> Result<()> {
    let prompt = views::admin_prompt(turn.user.state);
    turn.reply(Outbound {
        text: format!("⚠️ {error}\n\n{}", prompt.text),
        ..prompt
    })
    .await
}

/// Text typed in a wizard or edit state.
pub async fn on_text<M: Messenger>(turn: &mut Turn<'_, M>, text: &str) -> Result<()> {
    let outcome = match turn.data.scratch.admin_task(turn.user.id) {
        Some(AdminTask::Edit { product_id, field }) => {
            apply_edit(turn, product_id, field, text).await
        }
        Some(AdminTask::Create(_)) => wizard_step(turn, text).await,
        None => {
            return super::admin::panel_with(turn, "⚠️ No product is being edited.").await;
        }
    };

    match outcome {
        Err(e) if matches!(e, Error::InvalidInput { .. } | Error::InvalidAmount { .. }) => {
            ask_again(turn, &e).await
        }
        other => other,
    }
}

async fn apply_edit<M: Messenger>(
    turn: &mut Turn<'_, M>,
    product_id: i64,
    field: ProductField,
    text: &str,
) -> Result<()> {
    let product = catalog::update_product_field(turn.db(), product_id, field, text).await?;
    turn.data.scratch.take_admin_task(turn.user.id);
    turn.audit(
        "edit_product",
        &format!("product {product_id} field {}", field.slug()),
    )
    .await?;
    turn.set_state(ConversationState::AdminPanel).await?;
    turn.reply(views::admin_product_card(&product, turn.currency()))
        .await
}

fn required(text: &str, what: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::invalid_input(format!("{what} cannot be empty")));
    }
    Ok(text.to_string())
}

fn parse_stock(text: &str) -> Result<i32> {
    match text.trim().parse::<i32>() {
        Ok(stock) if stock >= 0 => Ok(stock),
        _ => Err(Error::invalid_input("Stock must be a whole number, 0 or more")),
    }
}

async fn wizard_step<M: Messenger>(turn: &mut Turn<'_, M>, text: &str) -> Result<()> {
    let state = turn.user.state;
    if state == ConversationState::AdminWaitingForGramPrices {
        return commit(turn, text).await;
    }

    let scratch = &turn.data.scratch;
    let admin_id = turn.user.id;
    let stored = match state {
        ConversationState::AdminWaitingForProductName => {
            let name = required(text, "Product name")?;
            scratch.update_draft(admin_id, |draft| draft.name = Some(name))
        }
        ConversationState::AdminWaitingForProductPrice => {
            let price = price_table::parse_positive(text)?;
            scratch.update_draft(admin_id, |draft| draft.price = Some(price))
        }
        ConversationState::AdminWaitingForProductDescription => {
            let description = text.trim().to_string();
            scratch.update_draft(admin_id, |draft| draft.description = Some(description))
        }
        ConversationState::AdminWaitingForProductStock => {
            let stock = parse_stock(text)?;
            scratch.update_draft(admin_id, |draft| draft.stock = Some(stock))
        }
        ConversationState::AdminWaitingForProductCategory => {
            let category = required(text, "Category")?;
            scratch.update_draft(admin_id, |draft| draft.category = Some(category))
        }
        ConversationState::AdminWaitingForProductCity => {
            let city = required(text, "City")?;
            scratch.update_draft(admin_id, |draft| draft.city = Some(city))
        }
        _ => None,
    };

    if stored.is_none() {
        return super::admin::panel_with(turn, "⚠️ No product is being created.").await;
    }
    match state.wizard_next() {
        Some(next) => ask(turn, next).await,
        None => super::admin::panel_with(turn, "⚠️ No product is being created.").await,
    }
}

fn draft_into_product(draft: ProductDraft, prices: PriceTable) -> Result<NewProduct> {
    let incomplete = || Error::invalid_input("The draft is incomplete; start again");
    let price = draft.price.ok_or_else(incomplete)?;
    Ok(NewProduct {
        name: draft.name.ok_or_else(incomplete)?,
        description: draft.description.unwrap_or_default(),
        stock: draft.stock.ok_or_else(incomplete)?,
        category: draft.category.ok_or_else(incomplete)?,
        city: draft.city.ok_or_else(incomplete)?,
        prices: prices.or_base_price(price),
        image_url: None,
    })
}

async fn commit<M: Messenger>(turn: &mut Turn<'_, M>, text: &str) -> Result<()> {
    let prices = PriceTable::parse_list(text)?;
    let Some(AdminTask::Create(draft)) = turn.data.scratch.admin_task(turn.user.id) else {
        return super::admin::panel_with(turn, "⚠️ No product is being created.").await;
    };
    let new = match draft_into_product(draft, prices) {
        Ok(new) => new,
        Err(e) => {
            turn.data.scratch.take_admin_task(turn.user.id);
            return super::admin::panel_with(turn, &format!("⚠️ {e}")).await;
        }
    };

    let product = catalog::create_product(turn.db(), new).await?;
    turn.data.scratch.take_admin_task(turn.user.id);
    turn.audit("create_product", &format!("product {} {}", product.id, product.name))
        .await?;
    info!(product_id = product.id, admin_id = turn.user.id, "Product created");

    turn.set_state(ConversationState::AdminPanel).await?;
    let card = views::admin_product_card(&product, turn.currency());
    turn.reply(Outbound {
        text: format!("✅ Product created.\n\n{}", card.text),
        ..card
    })
    .await
}
