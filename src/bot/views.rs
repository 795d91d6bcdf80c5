//! Message texts and keyboards.
//!
//! Pure functions from models to [`Outbound`] messages. Handlers decide what
//! to show; this module decides how it looks.

use crate::{
    bot::messenger::{Button, Outbound},
    core::{
        cart::{self, CartLine},
        order::OrderDetails,
        price_table::{PriceTable, format_decimal},
        stats::ShopStats,
        state::ConversationState,
        support::UnreadThread,
        token::{Action, ProductField},
    },
    entities::{OrderStatus, order, product, user},
};
use rust_decimal::Decimal;

/// Quantities offered after picking a unit size.
pub const QUANTITY_CHOICES: [i32; 4] = [1, 2, 3, 5];

/// Formats an amount with the shop currency.
#[must_use]
pub fn money(amount: Decimal, currency: &str) -> String {
    format!("{} {currency}", format_decimal(amount.round_dp(2)))
}

fn size_label(size: Decimal) -> String {
    format!("{} g", format_decimal(size))
}

fn price_table_of(product: &product::Model) -> PriceTable {
    product
        .prices()
        .unwrap_or_else(|_| PriceTable::single(product.price))
}

fn pairs(buttons: Vec<Button>) -> Vec<Vec<Button>> {
    buttons.chunks(2).map(<[Button]>::to_vec).collect()
}

fn with_rows(mut message: Outbound, rows: Vec<Vec<Button>>) -> Outbound {
    for row in rows {
        message = message.row(row);
    }
    message
}

fn back_to_menu() -> Button {
    Button::new("🏠 Main menu", &Action::MainMenu)
}

fn back_to_admin() -> Button {
    Button::new("🛠 Admin panel", &Action::AdminPanel)
}

// Navigation

/// The main menu; admins get an extra row.
#[must_use]
pub fn main_menu(user: &user::Model, is_admin: bool) -> Outbound {
    let city = user.city.as_deref().unwrap_or("not selected");
    let message = Outbound::text(format!("🏠 Main menu\n📍 City: {city}"))
        .row(vec![
            Button::new("🛍 Catalog", &Action::ShowCatalog),
            Button::new("🛒 Cart", &Action::ShowCart),
        ])
        .row(vec![
            Button::new("📦 My orders", &Action::MyOrders),
            Button::new("👤 Profile", &Action::ShowProfile),
        ])
        .row(vec![
            Button::new("💬 Support", &Action::SupportStart),
            Button::new("📍 Change city", &Action::ChangeCity),
        ]);
    if is_admin {
        message.row(vec![back_to_admin()])
    } else {
        message
    }
}

/// Asks the user to pick a city.
#[must_use]
pub fn city_prompt(cities: &[String]) -> Outbound {
    let buttons = cities
        .iter()
        .map(|city| Button::new(city.clone(), &Action::SelectCity(city.clone())))
        .collect();
    with_rows(Outbound::text("📍 Choose your city:"), pairs(buttons))
}

/// Profile summary.
#[must_use]
pub fn profile(user: &user::Model, orders: usize) -> Outbound {
    let username = user
        .username
        .as_deref()
        .map_or_else(String::new, |name| format!(" (@{name})"));
    Outbound::text(format!(
        "👤 {}{username}\n📍 City: {}\n📦 Orders: {orders}\n🗓 Since: {}",
        user.display_name,
        user.city.as_deref().unwrap_or("not selected"),
        user.created_at.format("%d.%m.%Y"),
    ))
    .row(vec![
        Button::new("📍 Change city", &Action::ChangeCity),
        back_to_menu(),
    ])
}

/// Reply to a message the router could not place.
#[must_use]
pub fn not_recognized(user: &user::Model, is_admin: bool) -> Outbound {
    let menu = main_menu(user, is_admin);
    Outbound {
        text: format!("🤔 Command not recognized.\n\n{}", menu.text),
        ..menu
    }
}

// Catalog

/// Category list for a city.
#[must_use]
pub fn categories(city: &str, categories: &[String]) -> Outbound {
    if categories.is_empty() {
        return Outbound::text(format!("😔 There are no products in {city} yet."))
            .row(vec![
                Button::new("📍 Change city", &Action::ChangeCity),
                back_to_menu(),
            ]);
    }
    let buttons = categories
        .iter()
        .map(|category| Button::new(category.clone(), &Action::Category(category.clone())))
        .collect();
    with_rows(
        Outbound::text(format!("🛍 Catalog for {city}\nChoose a category:")),
        pairs(buttons),
    )
    .row(vec![back_to_menu()])
}

/// Products of one category.
#[must_use]
pub fn products(category: &str, products: &[product::Model], currency: &str) -> Outbound {
    if products.is_empty() {
        return Outbound::text(format!("😔 Nothing left in {category}."))
            .row(vec![Button::new("⬅️ Categories", &Action::BackToCategories)]);
    }
    let mut message = Outbound::text(format!("📂 {category}"));
    for product in products {
        message = message.button(
            format!("{} · from {}", product.name, money(product.price, currency)),
            &Action::Product(product.id),
        );
    }
    message.row(vec![
        Button::new("⬅️ Categories", &Action::BackToCategories),
        back_to_menu(),
    ])
}

/// Product card with one button per unit size.
#[must_use]
pub fn product_card(product: &product::Model, currency: &str) -> Outbound {
    let mut text = format!("🏷 {}\n\n", product.name);
    if !product.description.is_empty() {
        text.push_str(&product.description);
        text.push_str("\n\n");
    }
    text.push_str(&format!("📦 In stock: {}\n\nChoose a size:", product.stock));

    let buttons = price_table_of(product)
        .iter()
        .map(|(size, price)| {
            Button::new(
                format!("{} · {}", size_label(size), money(price, currency)),
                &Action::SelectUnit {
                    product_id: product.id,
                    size,
                },
            )
        })
        .collect();
    with_rows(Outbound::text(text), pairs(buttons))
        .row(vec![
            Button::new("⬅️ Back", &Action::BackToProducts),
            Button::new("🛒 Cart", &Action::ShowCart),
        ])
        .with_photo(product.image_url.clone())
}

/// Quantity choices for one unit size, limited by stock.
#[must_use]
pub fn quantity_menu(product: &product::Model, size: Decimal, price: Decimal, currency: &str) -> Outbound {
    let choices: Vec<Button> = QUANTITY_CHOICES
        .into_iter()
        .filter(|quantity| *quantity <= product.stock)
        .map(|quantity| {
            Button::new(
                format!("{quantity} × {}", size_label(size)),
                &Action::AddToCart {
                    product_id: product.id,
                    size,
                    quantity,
                },
            )
        })
        .collect();

    let text = if choices.is_empty() {
        format!("😔 {} is out of stock.", product.name)
    } else {
        format!(
            "🏷 {} · {} for {}\n📦 In stock: {}\n\nHow many?",
            product.name,
            size_label(size),
            money(price, currency),
            product.stock
        )
    };
    with_rows(Outbound::text(text), pairs(choices)).row(vec![
        Button::new("⬅️ Back", &Action::Product(product.id)),
        Button::new("🛒 Cart", &Action::ShowCart),
    ])
}

// Cart and checkout

/// Cart contents with per-line remove buttons.
#[must_use]
pub fn cart(lines: &[CartLine], currency: &str) -> Outbound {
    if lines.is_empty() {
        return Outbound::text("🛒 Your cart is empty.").row(vec![
            Button::new("🛍 Catalog", &Action::ShowCatalog),
            back_to_menu(),
        ]);
    }

    let mut text = String::from("🛒 Your cart:\n\n");
    for line in lines {
        text.push_str(&format!(
            "• {}, {} × {} = {}\n",
            line.product.name,
            size_label(line.item.unit_size),
            line.item.quantity,
            money(line.total(), currency)
        ));
    }
    text.push_str(&format!(
        "\nItems: {}\n💰 Total: {}",
        cart::item_count(lines),
        money(cart::cart_total(lines), currency)
    ));

    let mut message = Outbound::text(text);
    for line in lines {
        message = message.button(
            format!("❌ {} {}", line.product.name, size_label(line.item.unit_size)),
            &Action::RemoveCartItem(line.item.id),
        );
    }
    message
        .row(vec![Button::new("✅ Checkout", &Action::Checkout)])
        .row(vec![
            Button::new("🗑 Clear cart", &Action::ClearCart),
            back_to_menu(),
        ])
}

/// Asks for the delivery address.
#[must_use]
pub fn address_prompt() -> Outbound {
    Outbound::text("📍 Send your district and delivery address in one message.")
        .row(vec![Button::new("⬅️ Back to cart", &Action::ShowCart)])
}

fn order_lines(details: &OrderDetails, currency: &str) -> String {
    details
        .items
        .iter()
        .map(|item| {
            format!(
                "• {}, {} × {} = {}",
                item.product_name,
                size_label(item.unit_size),
                item.quantity,
                money(item.line_total(), currency)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Order contents, address and total.
#[must_use]
pub fn order_summary(details: &OrderDetails, currency: &str) -> String {
    let order = &details.order;
    format!(
        "📦 Order #{} {} {}\n{}\n📍 {}\n💰 Total: {}",
        order.id,
        order.status.glyph(),
        order.status,
        order_lines(details, currency),
        order.delivery_address,
        money(order.total_amount, currency)
    )
}

/// Payment instructions shown right after checkout.
#[must_use]
pub fn payment_prompt(details: &OrderDetails, payment_details: &str, currency: &str) -> Outbound {
    let order_id = details.order.id;
    Outbound::text(format!(
        "{}\n\n💳 {payment_details}",
        order_summary(details, currency)
    ))
    .row(vec![Button::new("✅ I've paid", &Action::ConfirmPayment(order_id))])
    .row(vec![Button::new("❌ Cancel order", &Action::CancelOrder(order_id))])
}

/// Confirmation for the client once payment is reported.
#[must_use]
pub fn payment_received(order: &order::Model) -> Outbound {
    Outbound::text(format!(
        "🙏 Thank you! Payment for order #{} is being checked. We will let you know when it ships.",
        order.id
    ))
    .row(vec![
        Button::new("📦 My orders", &Action::MyOrders),
        back_to_menu(),
    ])
}

/// Alert sent to every admin after a client reports payment.
#[must_use]
pub fn admin_payment_alert(details: &OrderDetails, client: &user::Model, currency: &str) -> Outbound {
    let order_id = details.order.id;
    Outbound::text(format!(
        "💰 Payment reported by {}{}\n\n{}",
        client.display_name,
        client
            .username
            .as_deref()
            .map_or_else(String::new, |name| format!(" (@{name})")),
        order_summary(details, currency)
    ))
    .row(vec![
        Button::new("✅ Confirm", &Action::AdminSetStatus {
            order_id,
            status: OrderStatus::Confirmed,
        }),
        Button::new("🚚 Ship", &Action::AdminSetStatus {
            order_id,
            status: OrderStatus::Shipped,
        }),
        Button::new("📬 Delivered", &Action::AdminSetStatus {
            order_id,
            status: OrderStatus::Delivered,
        }),
    ])
    .row(vec![
        Button::new("📷 Send photo", &Action::AdminSendPhoto(order_id)),
        Button::new("🔎 View", &Action::AdminOrderView(order_id)),
    ])
    .row(vec![Button::new("❌ Cancel", &Action::AdminSetStatus {
        order_id,
        status: OrderStatus::Cancelled,
    })])
}

// Client orders

fn order_label(order: &order::Model, currency: &str) -> String {
    format!(
        "#{} {} {} · {}",
        order.id,
        order.status.glyph(),
        order.created_at.format("%d.%m"),
        money(order.total_amount, currency)
    )
}

/// The client's recent orders.
#[must_use]
pub fn order_list(orders: &[order::Model], currency: &str) -> Outbound {
    if orders.is_empty() {
        return Outbound::text("📦 You have no orders yet.").row(vec![
            Button::new("🛍 Catalog", &Action::ShowCatalog),
            back_to_menu(),
        ]);
    }
    let mut message = Outbound::text("📦 Your orders:");
    for order in orders {
        message = message.button(order_label(order, currency), &Action::OrderDetails(order.id));
    }
    message.row(vec![back_to_menu()])
}

/// One order as the client sees it.
#[must_use]
pub fn order_details(details: &OrderDetails, currency: &str, unread_support: bool) -> Outbound {
    let order = &details.order;
    let mut text = order_summary(details, currency);
    if let Some(comment) = &order.delivery_comment {
        text.push_str(&format!("\n💬 Courier: {comment}"));
    }

    let support_label = if unread_support {
        "💬 Support 🆕"
    } else {
        "💬 Support"
    };
    let mut message = Outbound::text(text).row(vec![
        Button::new(support_label, &Action::SupportOrder(order.id)),
        Button::new("📜 History", &Action::SupportHistory(order.id)),
    ]);
    if order.status == OrderStatus::Pending {
        message = message.row(vec![
            Button::new("✅ I've paid", &Action::ConfirmPayment(order.id)),
            Button::new("❌ Cancel order", &Action::CancelOrder(order.id)),
        ]);
    }
    message.row(vec![
        Button::new("⬅️ My orders", &Action::MyOrders),
        back_to_menu(),
    ])
}

/// Status change notice for the client.
#[must_use]
pub fn status_notice(order: &order::Model) -> Outbound {
    let text = match order.status {
        OrderStatus::Pending => format!("⏳ Order #{} is awaiting payment.", order.id),
        OrderStatus::Confirmed => format!("✅ Payment for order #{} is confirmed.", order.id),
        OrderStatus::Shipped => format!("🚚 Order #{} is on its way.", order.id),
        OrderStatus::Delivered => format!("📬 Order #{} has been delivered.", order.id),
        OrderStatus::Completed => format!("🏁 Order #{} is complete. Thank you!", order.id),
        OrderStatus::Cancelled => format!("❌ Order #{} was cancelled.", order.id),
    };
    Outbound::text(text).button("🔎 Details", &Action::OrderDetails(order.id))
}

// Support

/// Threads a client can write into.
#[must_use]
pub fn support_targets(orders: &[order::Model], currency: &str) -> Outbound {
    let mut message = Outbound::text("💬 What is your question about?");
    for order in orders {
        message = message.button(order_label(order, currency), &Action::SupportOrder(order.id));
    }
    message
        .button("❓ General question", &Action::SupportOrder(0))
        .row(vec![back_to_menu()])
}

/// Invitation to write into a thread.
#[must_use]
pub fn support_prompt(order_id: i64) -> Outbound {
    let about = if order_id == 0 {
        "your question".to_string()
    } else {
        format!("order #{order_id}")
    };
    Outbound::text(format!(
        "✍️ Write your message about {about}. You can attach a photo."
    ))
    .row(vec![
        Button::new("📜 History", &Action::SupportHistory(order_id)),
        back_to_menu(),
    ])
}

/// New client message, as shown to admins.
#[must_use]
pub fn admin_support_alert(
    client: &user::Model,
    order_id: i64,
    text: Option<&str>,
    photo: Option<String>,
) -> Outbound {
    let about = if order_id == 0 {
        "general question".to_string()
    } else {
        format!("order #{order_id}")
    };
    Outbound::text(format!(
        "💬 {} about {about}:\n{}",
        client.display_name,
        text.unwrap_or("[photo]")
    ))
    .row(vec![
        Button::new("↩️ Reply", &Action::AdminReplySupport {
            order_id,
            client_id: client.id,
        }),
        Button::new("📜 History", &Action::AdminSupportHistory(order_id)),
    ])
    .with_photo(photo)
}

/// Admin reply, as shown to the client.
#[must_use]
pub fn support_reply(order_id: i64, text: Option<&str>, photo: Option<String>) -> Outbound {
    Outbound::text(format!("🛠 Support: {}", text.unwrap_or("[photo]")))
        .row(vec![
            Button::new("↩️ Answer", &Action::SupportOrder(order_id)),
            Button::new("📜 History", &Action::SupportHistory(order_id)),
        ])
        .with_photo(photo)
}

/// Threads waiting for an admin.
#[must_use]
pub fn support_requests(threads: &[UnreadThread]) -> Outbound {
    if threads.is_empty() {
        return Outbound::text("📭 No unread support messages.").row(vec![back_to_admin()]);
    }
    let mut message = Outbound::text("📬 Unread support threads:");
    for unread in threads {
        let thread = unread.thread;
        message = message.row(vec![
            Button::new(
                format!("#{} · client {} ({})", thread.order_id, thread.client_id, unread.unread),
                &Action::AdminSupportHistory(thread.order_id),
            ),
            Button::new("↩️", &Action::AdminReplySupport {
                order_id: thread.order_id,
                client_id: thread.client_id,
            }),
        ]);
    }
    message.row(vec![back_to_admin()])
}

// Admin

/// Admin panel entry screen.
#[must_use]
pub fn admin_panel() -> Outbound {
    Outbound::text("🛠 Admin panel")
        .row(vec![
            Button::new("📦 Orders", &Action::AdminOrders),
            Button::new("🏷 Products", &Action::AdminProducts),
        ])
        .row(vec![
            Button::new("📬 Support", &Action::AdminSupportRequests),
            Button::new("📊 Stats", &Action::AdminStats),
        ])
        .row(vec![
            Button::new("👥 Users", &Action::AdminUsers),
            back_to_menu(),
        ])
}

/// Dashboard figures.
#[must_use]
pub fn stats(stats: &ShopStats, currency: &str) -> Outbound {
    Outbound::text(format!(
        "📊 Statistics\n\n👥 Users: {}\n📦 Orders: {} ({} pending)\n🏷 Products: {} ({} active)\n💰 Revenue: {}",
        stats.users,
        stats.orders,
        stats.pending_orders,
        stats.products,
        stats.active_products,
        money(stats.revenue, currency)
    ))
    .row(vec![back_to_admin()])
}

/// Most recently active users.
#[must_use]
pub fn users(users: &[user::Model]) -> Outbound {
    let mut text = String::from("👥 Recent users:\n");
    for user in users {
        text.push_str(&format!(
            "\n• {} ({}) · {} · {}",
            user.display_name,
            user.id,
            user.city.as_deref().unwrap_or("no city"),
            user.last_activity.format("%d.%m %H:%M")
        ));
    }
    Outbound::text(text).row(vec![back_to_admin()])
}

/// Order list with status filters.
#[must_use]
pub fn admin_orders(orders: &[order::Model], filter: Option<OrderStatus>, currency: &str) -> Outbound {
    let heading = filter.map_or_else(
        || "📦 Latest orders".to_string(),
        |status| format!("📦 {} orders", status),
    );
    let text = if orders.is_empty() {
        format!("{heading}\n\nNothing here.")
    } else {
        heading
    };

    let filters = OrderStatus::ALL
        .into_iter()
        .map(|status| {
            Button::new(
                format!("{} {}", status.glyph(), status),
                &Action::AdminOrdersFilter(status),
            )
        })
        .collect::<Vec<_>>();

    let mut message = Outbound::text(text);
    for order in orders {
        message = message.button(order_label(order, currency), &Action::AdminOrderView(order.id));
    }
    with_rows(message, filters.chunks(3).map(<[Button]>::to_vec).collect())
        .row(vec![Button::new("🔄 All", &Action::AdminOrders), back_to_admin()])
}

/// One order with the status moves still open to it.
#[must_use]
pub fn admin_order_view(details: &OrderDetails, client: Option<&user::Model>, currency: &str) -> Outbound {
    let order = &details.order;
    let mut text = order_summary(details, currency);
    if let Some(client) = client {
        text.push_str(&format!("\n👤 {} ({})", client.display_name, client.id));
    }
    if let Some(comment) = &order.delivery_comment {
        text.push_str(&format!("\n💬 Delivery: {comment}"));
    }

    let moves = OrderStatus::ALL
        .into_iter()
        .filter(|status| order.status.can_become(*status))
        .map(|status| {
            Button::new(
                format!("{} {}", status.glyph(), status),
                &Action::AdminSetStatus {
                    order_id: order.id,
                    status,
                },
            )
        })
        .collect::<Vec<_>>();

    with_rows(Outbound::text(text), moves.chunks(3).map(<[Button]>::to_vec).collect())
        .row(vec![
            Button::new("📷 Send photo", &Action::AdminSendPhoto(order.id)),
            Button::new("⏰ Delivery time", &Action::AdminDeliveryTime(order.id)),
        ])
        .row(vec![
            Button::new("📜 Support", &Action::AdminSupportHistory(order.id)),
            Button::new("⬅️ Orders", &Action::AdminOrders),
        ])
        .with_photo(order.delivery_photo.clone())
}

/// Delivery report for the client.
#[must_use]
pub fn delivery_report(order: &order::Model, photo: &str, comment: &str) -> Outbound {
    Outbound::text(format!("📬 Your order #{} has been delivered.\n💬 {comment}", order.id))
        .button("🔎 Details", &Action::OrderDetails(order.id))
        .with_photo(Some(photo.to_string()))
}

/// Product list for admins.
#[must_use]
pub fn admin_products(products: &[product::Model], currency: &str) -> Outbound {
    let mut message = Outbound::text(if products.is_empty() {
        "🏷 No products yet."
    } else {
        "🏷 Products:"
    });
    for product in products {
        let marker = if product.is_active { "🟢" } else { "⚪" };
        message = message.button(
            format!(
                "{marker} {} · {} · {}",
                product.name,
                product.city,
                money(product.price, currency)
            ),
            &Action::EditProduct(product.id),
        );
    }
    message
        .row(vec![Button::new("➕ Add product", &Action::AdminAddProduct)])
        .row(vec![back_to_admin()])
}

/// Product card with edit actions.
#[must_use]
pub fn admin_product_card(product: &product::Model, currency: &str) -> Outbound {
    let prices = price_table_of(product)
        .iter()
        .map(|(size, price)| format!("{}: {}", size_label(size), money(price, currency)))
        .collect::<Vec<_>>()
        .join(", ");
    let text = format!(
        "🏷 {} (#{})\n{}\n\n📂 {}\n📍 {}\n📦 Stock: {}\n💰 {}\n{}",
        product.name,
        product.id,
        product.description,
        product.category,
        product.city,
        product.stock,
        prices,
        if product.is_active { "🟢 Active" } else { "⚪ Hidden" }
    );

    let edits = ProductField::ALL
        .into_iter()
        .map(|field| {
            Button::new(
                format!("✏️ {}", field_label(field)),
                &Action::EditField {
                    field,
                    product_id: product.id,
                },
            )
        })
        .collect::<Vec<_>>();
    let toggle = if product.is_active { "⚪ Hide" } else { "🟢 Show" };

    with_rows(Outbound::text(text), edits.chunks(3).map(<[Button]>::to_vec).collect())
        .row(vec![
            Button::new(toggle, &Action::ToggleProduct(product.id)),
            Button::new("🗑 Delete", &Action::DeleteProduct(product.id)),
        ])
        .row(vec![
            Button::new("⬅️ Products", &Action::AdminProducts),
            back_to_admin(),
        ])
        .with_photo(product.image_url.clone())
}

fn field_label(field: ProductField) -> &'static str {
    match field {
        ProductField::Name => "Name",
        ProductField::Price => "Price",
        ProductField::Description => "Description",
        ProductField::Category => "Category",
        ProductField::City => "City",
        ProductField::Stock => "Stock",
        ProductField::Prices => "Sizes",
    }
}

/// Wizard state that collects `field`.
#[must_use]
pub const fn field_state(field: ProductField) -> ConversationState {
    match field {
        ProductField::Name => ConversationState::AdminWaitingForProductName,
        ProductField::Price => ConversationState::AdminWaitingForProductPrice,
        ProductField::Description => ConversationState::AdminWaitingForProductDescription,
        ProductField::Category => ConversationState::AdminWaitingForProductCategory,
        ProductField::City => ConversationState::AdminWaitingForProductCity,
        ProductField::Stock => ConversationState::AdminWaitingForProductStock,
        ProductField::Prices => ConversationState::AdminWaitingForGramPrices,
    }
}

/// Prompt for a wizard or edit step, with a cancel button.
#[must_use]
pub fn admin_prompt(state: ConversationState) -> Outbound {
    let text = match state {
        ConversationState::AdminWaitingForProductName => "✏️ Product name:",
        ConversationState::AdminWaitingForProductPrice => "💰 Price for size 1 (e.g. 100 or 99.5):",
        ConversationState::AdminWaitingForProductDescription => "📝 Description:",
        ConversationState::AdminWaitingForProductStock => "📦 Units in stock (whole number):",
        ConversationState::AdminWaitingForProductCategory => "📂 Category:",
        ConversationState::AdminWaitingForProductCity => "📍 City (or \"All\" for every city):",
        ConversationState::AdminWaitingForGramPrices => {
            "⚖️ Sizes and prices as size:price pairs, e.g. 1:100, 2.5:230; 5:400"
        }
        ConversationState::AdminWaitingForProductPhoto => "📷 Send the delivery photo:",
        ConversationState::AdminWaitingForOrderComment => {
            "💬 Comment for the client (send \"-\" for none):"
        }
        ConversationState::AdminWaitingForDeliveryTime => "⏰ Delivery time to send to the client:",
        ConversationState::AdminReplyingToSupport => "↩️ Your reply (text or photo):",
        _ => "✏️ Send the value:",
    };
    Outbound::text(text).button("✖️ Cancel", &Action::AdminCancel)
}

/// Thread history chunks, with navigation on the last one.
#[must_use]
pub fn history(chunks: Vec<String>, last_row: Vec<Button>) -> Vec<Outbound> {
    if chunks.is_empty() {
        return vec![Outbound::text("📭 No messages yet.").row(last_row)];
    }
    let count = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let message = Outbound::text(chunk);
            if index + 1 == count {
                message.row(last_row.clone())
            } else {
                message
            }
        })
        .collect()
}
