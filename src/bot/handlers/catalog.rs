//! Catalog browsing: categories, products, unit sizes and add-to-cart.

use crate::{
    bot::{messenger::Messenger, router::Turn, views},
    core::{cart, catalog, state::ConversationState, token::Action},
    entities::product,
    errors::{Error, Result},
};
use rust_decimal::Decimal;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    let Some(city) = turn.user.city.clone() else {
        return super::menu::prompt_city(turn).await;
    };

    match action {
        Action::ShowCatalog | Action::BackToCategories => show_categories(turn, &city).await,
        Action::BackToProducts => match turn.data.scratch.get(turn.user.id).last_category {
            Some(category) => show_products(turn, &city, &category).await,
            None => show_categories(turn, &city).await,
        },
        Action::Category(category) => show_products(turn, &city, &category).await,
        Action::Product(product_id) => show_product(turn, &city, product_id).await,
        Action::SelectUnit { product_id, size } => {
            select_unit(turn, &city, product_id, size).await
        }
        Action::AddToCart {
            product_id,
            size,
            quantity,
        } => add(turn, &city, product_id, size, quantity).await,
        other => super::misrouted("catalog", &other),
    }
}

async fn show_categories<M: Messenger>(turn: &mut Turn<'_, M>, city: &str) -> Result<()> {
    let categories = catalog::categories_for_city(turn.db(), city).await?;
    turn.set_state(ConversationState::Catalog).await?;
    turn.reply(views::categories(city, &categories)).await
}

async fn show_products<M: Messenger>(
    turn: &mut Turn<'_, M>,
    city: &str,
    category: &str,
) -> Result<()> {
    let products = catalog::products_in_category(turn.db(), city, category).await?;
    turn.data.scratch.update(turn.user.id, |scratch| {
        scratch.last_category = Some(category.to_string());
    });
    turn.set_state(ConversationState::Catalog).await?;
    turn.reply(views::products(category, &products, turn.currency()))
        .await
}

/// A product the user may see: active and sold in their city.
async fn visible_product<M: Messenger>(
    turn: &Turn<'_, M>,
    city: &str,
    product_id: i64,
) -> Result<product::Model> {
    let product = catalog::require_product(turn.db(), product_id).await?;
    if !product.is_active || !product.is_sold_in(city) {
        return Err(Error::ProductNotFound { id: product_id });
    }
    Ok(product)
}

async fn show_product<M: Messenger>(
    turn: &mut Turn<'_, M>,
    city: &str,
    product_id: i64,
) -> Result<()> {
    let product = visible_product(turn, city, product_id).await?;
    turn.set_state(ConversationState::Catalog).await?;
    turn.reply(views::product_card(&product, turn.currency()))
        .await
}

async fn select_unit<M: Messenger>(
    turn: &mut Turn<'_, M>,
    city: &str,
    product_id: i64,
    size: Decimal,
) -> Result<()> {
    let product = visible_product(turn, city, product_id).await?;
    let Some(price) = product.prices()?.price_for(size) else {
        let error = Error::UnknownUnitSize { product_id, size };
        return turn.toast(&format!("⚠️ {error}")).await;
    };
    turn.reply(views::quantity_menu(&product, size, price, turn.currency()))
        .await
}

async fn add<M: Messenger>(
    turn: &mut Turn<'_, M>,
    city: &str,
    product_id: i64,
    size: Decimal,
    quantity: i32,
) -> Result<()> {
    visible_product(turn, city, product_id).await?;
    cart::add_to_cart(turn.db(), turn.user.id, product_id, size, quantity).await?;
    turn.toast("✅ Added to cart").await?;

    // Show the same size again with the stock that is left.
    let product = catalog::require_product(turn.db(), product_id).await?;
    let price = product.prices()?.price_for(size).unwrap_or(product.price);
    turn.reply(views::quantity_menu(&product, size, price, turn.currency()))
        .await
}
