//! Event dispatch.
//!
//! Callbacks are matched against [`CALLBACK_ROUTES`] by parsed token and
//! messages against [`MESSAGE_ROUTES`] by `(state, payload)`. Both tables are
//! ordered and the first match wins; the tests below check that no two routes
//! ever claim the same input.
//!
//! Admin access is re-checked on every event against the allowlist, never
//! against the stored user flag.

use crate::{
    bot::{
        BotData, handlers,
        messenger::{Event, Messenger, Outbound, Payload},
        views,
    },
    core::{audit, catalog, state::ConversationState, token::Action, user},
    entities::user as user_entity,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, instrument, warn};

/// Handler family a callback route leads to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackFamily {
    Menu,
    Catalog,
    Cart,
    Payment,
    Orders,
    Support,
    AdminPanel,
    AdminOrders,
    AdminProducts,
    AdminSupport,
}

/// One entry of the callback table
pub struct CallbackRoute {
    pub name: &'static str,
    pub admin_only: bool,
    pub accepts: fn(&Action) -> bool,
    pub family: CallbackFamily,
}

/// Handler family a message route leads to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageFamily {
    ProductWizard,
    DeliveryPhoto,
    DeliveryComment,
    DeliveryTime,
    AdminSupportReply,
    ClientSupport,
    Checkout,
    Payment,
}

/// One entry of the message table
pub struct MessageRoute {
    pub name: &'static str,
    pub admin_only: bool,
    pub accepts: fn(ConversationState, &Payload) -> bool,
    pub family: MessageFamily,
}

fn is_menu(action: &Action) -> bool {
    matches!(
        action,
        Action::MainMenu | Action::ShowProfile | Action::ChangeCity | Action::SelectCity(_)
    )
}

fn is_catalog(action: &Action) -> bool {
    matches!(
        action,
        Action::ShowCatalog
            | Action::BackToCategories
            | Action::BackToProducts
            | Action::Category(_)
            | Action::Product(_)
            | Action::SelectUnit { .. }
            | Action::AddToCart { .. }
    )
}

fn is_cart(action: &Action) -> bool {
    matches!(
        action,
        Action::ShowCart | Action::ClearCart | Action::RemoveCartItem(_) | Action::Checkout
    )
}

fn is_payment(action: &Action) -> bool {
    matches!(action, Action::Paid | Action::ConfirmPayment(_))
}

fn is_orders(action: &Action) -> bool {
    matches!(
        action,
        Action::MyOrders | Action::OrderDetails(_) | Action::CancelOrder(_)
    )
}

fn is_support(action: &Action) -> bool {
    matches!(
        action,
        Action::SupportStart | Action::SupportOrder(_) | Action::SupportHistory(_)
    )
}

fn is_admin_panel(action: &Action) -> bool {
    matches!(
        action,
        Action::AdminPanel | Action::AdminStats | Action::AdminUsers | Action::AdminCancel
    )
}

fn is_admin_orders(action: &Action) -> bool {
    matches!(
        action,
        Action::AdminOrders
            | Action::AdminOrdersFilter(_)
            | Action::AdminOrderView(_)
            | Action::AdminSetStatus { .. }
            | Action::AdminSendPhoto(_)
            | Action::AdminDeliveryTime(_)
    )
}

fn is_admin_products(action: &Action) -> bool {
    matches!(
        action,
        Action::AdminProducts
            | Action::AdminAddProduct
            | Action::AdminEditProducts
            | Action::EditProduct(_)
            | Action::EditField { .. }
            | Action::ToggleProduct(_)
            | Action::DeleteProduct(_)
    )
}

fn is_admin_support(action: &Action) -> bool {
    matches!(
        action,
        Action::AdminSupportRequests
            | Action::AdminSupportHistory(_)
            | Action::AdminReplySupport { .. }
    )
}

/// Callback routes in match order.
pub static CALLBACK_ROUTES: &[CallbackRoute] = &[
    CallbackRoute {
        name: "menu",
        admin_only: false,
        accepts: is_menu,
        family: CallbackFamily::Menu,
    },
    CallbackRoute {
        name: "catalog",
        admin_only: false,
        accepts: is_catalog,
        family: CallbackFamily::Catalog,
    },
    CallbackRoute {
        name: "cart",
        admin_only: false,
        accepts: is_cart,
        family: CallbackFamily::Cart,
    },
    CallbackRoute {
        name: "payment",
        admin_only: false,
        accepts: is_payment,
        family: CallbackFamily::Payment,
    },
    CallbackRoute {
        name: "orders",
        admin_only: false,
        accepts: is_orders,
        family: CallbackFamily::Orders,
    },
    CallbackRoute {
        name: "support",
        admin_only: false,
        accepts: is_support,
        family: CallbackFamily::Support,
    },
    CallbackRoute {
        name: "admin_panel",
        admin_only: true,
        accepts: is_admin_panel,
        family: CallbackFamily::AdminPanel,
    },
    CallbackRoute {
        name: "admin_orders",
        admin_only: true,
        accepts: is_admin_orders,
        family: CallbackFamily::AdminOrders,
    },
    CallbackRoute {
        name: "admin_products",
        admin_only: true,
        accepts: is_admin_products,
        family: CallbackFamily::AdminProducts,
    },
    CallbackRoute {
        name: "admin_support",
        admin_only: true,
        accepts: is_admin_support,
        family: CallbackFamily::AdminSupport,
    },
];

const PAYMENT_KEYWORDS: [&str; 2] = ["paid", "оплат"];

fn mentions_payment(text: &str) -> bool {
    let text = text.to_lowercase();
    PAYMENT_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

fn wizard_text(state: ConversationState, payload: &Payload) -> bool {
    state.is_wizard_step() && payload.is_text()
}

fn delivery_photo(state: ConversationState, payload: &Payload) -> bool {
    state == ConversationState::AdminWaitingForProductPhoto
        && !matches!(payload, Payload::Callback(_))
}

fn delivery_comment(state: ConversationState, payload: &Payload) -> bool {
    state == ConversationState::AdminWaitingForOrderComment && payload.is_text()
}

fn delivery_time(state: ConversationState, payload: &Payload) -> bool {
    state == ConversationState::AdminWaitingForDeliveryTime && payload.is_text()
}

fn admin_support_reply(state: ConversationState, payload: &Payload) -> bool {
    state == ConversationState::AdminReplyingToSupport && !matches!(payload, Payload::Callback(_))
}

fn client_support(state: ConversationState, payload: &Payload) -> bool {
    state == ConversationState::WaitingForSupportMessage
        && !matches!(payload, Payload::Callback(_))
}

fn checkout_address(state: ConversationState, payload: &Payload) -> bool {
    state.is_checkout() && payload.is_text()
}

fn payment_text(state: ConversationState, payload: &Payload) -> bool {
    state == ConversationState::WaitingForPayment
        && matches!(payload, Payload::Text(text) if mentions_payment(text))
}

/// Message routes in match order.
pub static MESSAGE_ROUTES: &[MessageRoute] = &[
    MessageRoute {
        name: "product_wizard",
        admin_only: true,
        accepts: wizard_text,
        family: MessageFamily::ProductWizard,
    },
    MessageRoute {
        name: "delivery_photo",
        admin_only: true,
        accepts: delivery_photo,
        family: MessageFamily::DeliveryPhoto,
    },
    MessageRoute {
        name: "delivery_comment",
        admin_only: true,
        accepts: delivery_comment,
        family: MessageFamily::DeliveryComment,
    },
    MessageRoute {
        name: "delivery_time",
        admin_only: true,
        accepts: delivery_time,
        family: MessageFamily::DeliveryTime,
    },
    MessageRoute {
        name: "admin_support_reply",
        admin_only: true,
        accepts: admin_support_reply,
        family: MessageFamily::AdminSupportReply,
    },
    MessageRoute {
        name: "client_support",
        admin_only: false,
        accepts: client_support,
        family: MessageFamily::ClientSupport,
    },
    MessageRoute {
        name: "checkout_address",
        admin_only: false,
        accepts: checkout_address,
        family: MessageFamily::Checkout,
    },
    MessageRoute {
        name: "payment_text",
        admin_only: false,
        accepts: payment_text,
        family: MessageFamily::Payment,
    },
];

/// Everything a handler needs while processing one event
pub struct Turn<'a, M> {
    pub data: &'a BotData,
    pub out: &'a M,
    /// Sender, refreshed at the start of the event
    pub user: user_entity::Model,
    pub chat_id: i64,
    /// Set when the event was routed as an admin action
    pub admin_flow: bool,
}

impl<'a, M: Messenger> Turn<'a, M> {
    pub const fn db(&self) -> &'a DatabaseConnection {
        &self.data.database
    }

    /// Whether the sender is on the admin allowlist right now.
    pub fn is_admin(&self) -> bool {
        self.data.admins.is_admin(self.user.id)
    }

    pub fn currency(&self) -> &'a str {
        &self.data.config.shop.currency
    }

    pub async fn reply(&self, message: Outbound) -> Result<()> {
        self.out.reply(self.chat_id, message).await
    }

    /// Sends several messages in order.
    pub async fn reply_all(&self, messages: Vec<Outbound>) -> Result<()> {
        for message in messages {
            self.reply(message).await?;
        }
        Ok(())
    }

    /// Acknowledges the current callback with a short notice.
    pub async fn toast(&self, notice: &str) -> Result<()> {
        self.out.acknowledge(Some(notice)).await
    }

    /// Persists a new conversation state for the sender.
    pub async fn set_state(&mut self, state: ConversationState) -> Result<()> {
        if self.user.state != state {
            user::set_state(self.db(), self.user.id, state).await?;
            self.user.state = state;
        }
        Ok(())
    }

    /// Sends to another user, logging instead of failing. Returns whether the
    /// message went out.
    pub async fn notify(&self, user_id: i64, message: Outbound) -> bool {
        match self.out.notify(user_id, message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to notify user");
                false
            }
        }
    }

    /// Like [`Turn::notify`], retrying without the photo if the first attempt
    /// fails. Returns `None` if nothing went out, `Some(true)` if the photo was
    /// delivered.
    pub async fn notify_with_fallback(&self, user_id: i64, message: Outbound) -> Option<bool> {
        if message.photo.is_none() {
            return self.notify(user_id, message).await.then_some(false);
        }
        match self.out.notify(user_id, message.clone()).await {
            Ok(()) => Some(true),
            Err(e) => {
                warn!(user_id, error = %e, "Photo delivery failed, sending text only");
                self.notify(user_id, message.without_photo())
                    .await
                    .then_some(false)
            }
        }
    }

    /// Sends `message` to every allowlisted admin. Failures are logged and
    /// skipped; returns the number of admins reached.
    pub async fn notify_admins(&self, message: &Outbound) -> usize {
        let mut reached = 0;
        for admin_id in self.data.admins.ids() {
            if self.notify(admin_id, message.clone()).await {
                reached += 1;
            }
        }
        reached
    }

    /// Writes an `admin` audit entry for the sender.
    pub async fn audit(&self, action: &str, detail: &str) -> Result<()> {
        audit::record_admin_action(self.db(), self.user.id, action, detail).await?;
        Ok(())
    }
}

fn is_start_command(text: &str) -> bool {
    let text = text.trim();
    text == "/start" || text.starts_with("/start ") || text.starts_with("/start@")
}

/// Processes one inbound event. Never fails: errors are answered or logged
/// here, and callbacks are always acknowledged.
#[instrument(skip_all, fields(user_id = event.sender.id))]
pub async fn dispatch<M: Messenger>(data: &BotData, out: &M, event: Event) {
    let is_callback = matches!(event.payload, Payload::Callback(_));

    if let Err(e) = handle_event(data, out, event).await {
        error!(error = %e, "Dropping event after unexpected error");
    }

    if is_callback {
        if let Err(e) = out.acknowledge(None).await {
            warn!(error = %e, "Failed to acknowledge callback");
        }
    }
}

async fn handle_event<M: Messenger>(data: &BotData, out: &M, event: Event) -> Result<()> {
    let is_admin = data.admins.is_admin(event.sender.id);
    let user = user::get_or_create_user(&data.database, &event.sender, is_admin).await?;
    let mut turn = Turn {
        data,
        out,
        user,
        chat_id: event.chat_id,
        admin_flow: false,
    };

    let outcome = match event.payload {
        Payload::Callback(token) => route_callback(&mut turn, &token).await,
        Payload::Text(text) if is_start_command(&text) => handlers::menu::start(&mut turn).await,
        payload => route_message(&mut turn, payload).await,
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) if e.is_user_facing() => report(&mut turn, &e).await,
        Err(e) => Err(e),
    }
}

async fn report<M: Messenger>(turn: &mut Turn<'_, M>, error: &Error) -> Result<()> {
    debug!(error = %error, "Answering with user-facing error");
    if error.is_not_found() && turn.admin_flow && turn.is_admin() {
        turn.data.scratch.clear(turn.user.id);
        turn.set_state(ConversationState::AdminPanel).await?;
        let panel = views::admin_panel();
        return turn
            .reply(Outbound {
                text: format!("⚠️ {error}\n\n{}", panel.text),
                ..panel
            })
            .await;
    }
    turn.reply(Outbound::text(format!("⚠️ {error}"))).await
}

async fn deny<M: Messenger>(turn: &Turn<'_, M>, attempted: &str) -> Result<()> {
    let detail = format!("state {:?}", turn.user.state);
    if let Err(e) = audit::record_violation(turn.db(), turn.user.id, attempted, &detail).await {
        error!(error = %e, "Failed to record security violation");
    }
    turn.reply(Outbound::text("⛔ Access denied.")).await
}

async fn route_callback<M: Messenger>(turn: &mut Turn<'_, M>, token: &str) -> Result<()> {
    if token.starts_with("admin_") && !turn.is_admin() {
        return deny(turn, token).await;
    }

    let action = Action::parse(token);
    let route = action
        .as_ref()
        .and_then(|action| CALLBACK_ROUTES.iter().find(|route| (route.accepts)(action)));
    let (Some(action), Some(route)) = (action.clone(), route) else {
        debug!(token, "Unrecognized callback token");
        return turn.toast("🤔 Not recognized").await;
    };

    if route.admin_only || action.requires_admin() {
        if !turn.is_admin() {
            return deny(turn, token).await;
        }
        turn.admin_flow = true;
    }

    debug!(route = route.name, token, "Routing callback");
    match route.family {
        CallbackFamily::Menu => handlers::menu::handle(turn, action).await,
        CallbackFamily::Catalog => handlers::catalog::handle(turn, action).await,
        CallbackFamily::Cart => handlers::cart::handle(turn, action).await,
        CallbackFamily::Payment => handlers::payment::handle(turn, action).await,
        CallbackFamily::Orders => handlers::orders::handle(turn, action).await,
        CallbackFamily::Support => handlers::support::handle(turn, action).await,
        CallbackFamily::AdminPanel => handlers::admin::handle(turn, action).await,
        CallbackFamily::AdminOrders => handlers::admin_orders::handle(turn, action).await,
        CallbackFamily::AdminProducts => handlers::admin_products::handle(turn, action).await,
        CallbackFamily::AdminSupport => handlers::admin_support::handle(turn, action).await,
    }
}

async fn route_message<M: Messenger>(turn: &mut Turn<'_, M>, payload: Payload) -> Result<()> {
    let state = turn.user.state;
    if state.is_admin_state() {
        if !turn.is_admin() {
            return deny(turn, &format!("message in {state:?}")).await;
        }
        turn.admin_flow = true;
    }

    let route = if state.accepts_free_text() {
        MESSAGE_ROUTES
            .iter()
            .find(|route| (route.accepts)(state, &payload))
    } else {
        None
    };
    let Some(route) = route else {
        return fallback(turn).await;
    };

    if route.admin_only && !turn.is_admin() {
        return deny(turn, route.name).await;
    }

    debug!(route = route.name, ?state, "Routing message");
    match route.family {
        MessageFamily::ProductWizard => {
            handlers::admin_products::on_text(turn, payload.text().unwrap_or_default()).await
        }
        MessageFamily::DeliveryPhoto => handlers::admin_orders::on_delivery_photo(turn, &payload).await,
        MessageFamily::DeliveryComment => {
            handlers::admin_orders::on_delivery_comment(turn, payload.text().unwrap_or_default())
                .await
        }
        MessageFamily::DeliveryTime => {
            handlers::admin_orders::on_delivery_time(turn, payload.text().unwrap_or_default()).await
        }
        MessageFamily::AdminSupportReply => handlers::admin_support::on_reply(turn, &payload).await,
        MessageFamily::ClientSupport => handlers::support::on_message(turn, &payload).await,
        MessageFamily::Checkout => {
            handlers::cart::on_address(turn, payload.text().unwrap_or_default()).await
        }
        MessageFamily::Payment => handlers::payment::on_text(turn).await,
    }
}

/// Answers input no route accepts. The state is left as it is.
async fn fallback<M: Messenger>(turn: &Turn<'_, M>) -> Result<()> {
    if turn.user.city.is_none() {
        let cities = catalog::available_cities(turn.db(), &turn.data.config.cities).await?;
        return turn.reply(views::city_prompt(&cities)).await;
    }
    turn.reply(views::not_recognized(&turn.user, turn.is_admin()))
        .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{cart, catalog, order, token::sample_actions};
    use crate::entities::{AuditEntry, OrderStatus, Product};
    use crate::test_utils::*;
    use rust_decimal::Decimal;
    use sea_orm::{EntityTrait, Iterable, PaginatorTrait};

    const ADMIN: i64 = 1;
    const CLIENT: i64 = 100;

    fn routes_for(action: &Action) -> Vec<&'static str> {
        CALLBACK_ROUTES
            .iter()
            .filter(|route| (route.accepts)(action))
            .map(|route| route.name)
            .collect()
    }

    #[test]
    fn test_every_action_has_exactly_one_route() {
        for action in sample_actions() {
            let routes = routes_for(&action);
            assert_eq!(routes.len(), 1, "{action} matched {routes:?}");
        }
    }

    #[test]
    fn test_admin_routes_cover_admin_actions() {
        for action in sample_actions() {
            let route = CALLBACK_ROUTES
                .iter()
                .find(|route| (route.accepts)(&action))
                .unwrap();
            if action.requires_admin() {
                assert!(route.admin_only, "{action} routed to {}", route.name);
            }
        }
    }

    #[test]
    fn test_message_routes_never_overlap() {
        let payloads = [
            Payload::Text("hello".to_string()),
            Payload::Text("I have PAID".to_string()),
            Payload::Text("оплатил".to_string()),
            Payload::Photo {
                photo: "https://cdn/p.png".to_string(),
                caption: None,
            },
            Payload::Photo {
                photo: "https://cdn/p.png".to_string(),
                caption: Some("paid".to_string()),
            },
        ];
        for state in ConversationState::iter() {
            for payload in &payloads {
                let matched: Vec<_> = MESSAGE_ROUTES
                    .iter()
                    .filter(|route| (route.accepts)(state, payload))
                    .map(|route| route.name)
                    .collect();
                assert!(matched.len() <= 1, "{state:?} {payload:?} matched {matched:?}");
            }
        }
    }

    #[test]
    fn test_message_routes_only_take_free_text_states() {
        let payloads = [
            Payload::Text("paid".to_string()),
            Payload::Photo {
                photo: "https://cdn/p.png".to_string(),
                caption: None,
            },
        ];
        for state in ConversationState::iter() {
            for payload in &payloads {
                for route in MESSAGE_ROUTES {
                    if (route.accepts)(state, payload) {
                        assert!(state.accepts_free_text(), "{} accepts {state:?}", route.name);
                    }
                }
            }
        }
    }

    #[test]
    fn test_admin_states_only_reach_admin_routes() {
        let text = Payload::Text("x".to_string());
        for state in ConversationState::iter() {
            for route in MESSAGE_ROUTES {
                if (route.accepts)(state, &text) {
                    assert_eq!(route.admin_only, state.is_admin_state(), "{}", route.name);
                }
            }
        }
    }

    #[test]
    fn test_start_command_detection() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("  /start ref42"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("start"));
    }

    async fn send<M: Messenger>(data: &BotData, out: &M, event: Event) {
        dispatch(data, out, event).await;
    }

    #[tokio::test]
    async fn test_first_contact_asks_for_city() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, text_event(CLIENT, "/start")).await;

        let reply = out.last_reply().unwrap();
        assert!(reply.tokens().any(|token| token == "city_Moscow"));
        let user = user::get_user(&data.database, CLIENT).await?.unwrap();
        assert_eq!(user.state, ConversationState::SelectingCity);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_text_with_city_shows_menu() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        let out = RecordingMessenger::new();

        send(&data, &out, text_event(CLIENT, "what is this")).await;

        let reply = out.last_reply().unwrap();
        assert!(reply.text.contains("not recognized"));
        assert!(reply.tokens().any(|token| token == "show_catalog"));
        let user = user::get_user(&data.database, CLIENT).await?.unwrap();
        assert_eq!(user.state, ConversationState::MainMenu);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_text_without_city_keeps_state() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, text_event(555, "hello")).await;

        let reply = out.last_reply().unwrap();
        assert!(reply.tokens().any(|token| token == "city_Moscow"));
        let user = user::get_user(&data.database, 555).await?.unwrap();
        assert_eq!(user.state, ConversationState::MainMenu);
        assert!(user.city.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_token_is_acknowledged_once() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(CLIENT, "launch_rocket_now")).await;

        assert_eq!(out.acks(), vec![Some("🤔 Not recognized".to_string())]);
        assert!(out.replies().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_non_admin_admin_token_is_denied_and_audited() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        let product =
            catalog::create_product(&data.database, new_product("Widget", "tea", "Moscow")).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(CLIENT, "admin_products")).await;
        send(
            &data,
            &out,
            callback_event(CLIENT, &format!("delete_product_{}", product.id)),
        )
        .await;
        send(&data, &out, callback_event(CLIENT, "admin_launch_everything")).await;

        let replies = out.replies();
        assert_eq!(replies.len(), 3);
        assert!(replies.iter().all(|(_, reply)| reply.text.contains("Access denied")));
        assert_eq!(Product::find().count(&data.database).await?, 1);
        assert_eq!(AuditEntry::find().count(&data.database).await?, 3);
        let user = user::get_user(&data.database, CLIENT).await?.unwrap();
        assert_eq!(user.state, ConversationState::MainMenu);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_admin_state_is_denied_after_revocation() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        user::set_state(
            &data.database,
            CLIENT,
            ConversationState::AdminWaitingForProductName,
        )
        .await?;
        let out = RecordingMessenger::new();

        send(&data, &out, text_event(CLIENT, "Free stuff")).await;

        assert!(out.last_reply().unwrap().text.contains("Access denied"));
        assert_eq!(Product::find().count(&data.database).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_city_scoping_in_catalog() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        catalog::create_product(&data.database, new_product("Local", "tea", "Moscow")).await?;
        catalog::create_product(&data.database, new_product("Anywhere", "tea", "All")).await?;
        catalog::create_product(&data.database, new_product("Far", "tea", "Omsk")).await?;
        catalog::create_product(&data.database, new_product("Far coffee", "coffee", "Omsk"))
            .await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(CLIENT, "show_catalog")).await;
        let categories: Vec<String> = out
            .last_reply()
            .unwrap()
            .tokens()
            .filter(|token| token.starts_with("category_"))
            .map(ToString::to_string)
            .collect();
        assert_eq!(categories, vec!["category_tea".to_string()]);

        send(&data, &out, callback_event(CLIENT, "category_tea")).await;
        let products = out.last_reply().unwrap();
        let labels: Vec<&str> = products
            .buttons
            .iter()
            .flatten()
            .filter(|button| button.token.starts_with("product_"))
            .map(|button| button.label.as_str())
            .collect();
        assert_eq!(labels.len(), 2);
        assert!(labels.iter().any(|label| label.starts_with("Local")));
        assert!(labels.iter().any(|label| label.starts_with("Anywhere")));
        Ok(())
    }

    #[tokio::test]
    async fn test_browse_and_add_to_cart() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        let product =
            catalog::create_product(&data.database, new_product("Widget", "tea", "Moscow")).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(CLIENT, &format!("product_{}", product.id))).await;
        let card = out.last_reply().unwrap();
        assert!(card.tokens().any(|t| t == format!("select_gram_{}_2", product.id)));

        send(&data, &out, callback_event(CLIENT, &format!("select_gram_{}_2", product.id))).await;
        let menu = out.last_reply().unwrap();
        assert!(menu.tokens().any(|t| t == format!("add_to_cart_{}_2_5", product.id)));

        out.reset();
        send(&data, &out, callback_event(CLIENT, &format!("add_to_cart_{}_2_3", product.id))).await;
        assert_eq!(out.acks(), vec![Some("✅ Added to cart".to_string())]);
        let menu = out.last_reply().unwrap();
        assert!(menu.tokens().any(|t| t == format!("add_to_cart_{}_2_2", product.id)));
        assert!(!menu.tokens().any(|t| t == format!("add_to_cart_{}_2_3", product.id)));

        let stock = catalog::require_product(&data.database, product.id).await?.stock;
        assert_eq!(stock, 2);
        let lines = cart::cart_lines(&data.database, CLIENT).await?;
        assert_eq!(cart::cart_total(&lines), Decimal::from(540));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_unit_size_is_a_toast() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        let product =
            catalog::create_product(&data.database, new_product("Widget", "tea", "Moscow")).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(CLIENT, &format!("select_gram_{}_7", product.id))).await;

        let acks = out.acks();
        assert_eq!(acks.len(), 1);
        assert!(acks[0].as_deref().unwrap().contains("not offered"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_is_refused() -> Result<()> {
        let data = setup_test_bot(&[]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(CLIENT, "checkout")).await;

        assert!(out.last_reply().unwrap().text.contains("cart is empty"));
        assert_eq!(order::count_orders(&data.database, None).await?, 0);
        let user = user::get_user(&data.database, CLIENT).await?.unwrap();
        assert_eq!(user.state, ConversationState::MainMenu);
        Ok(())
    }

    async fn checkout_one_widget(data: &BotData, out: &RecordingMessenger) -> Result<i64> {
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        let product =
            catalog::create_product(&data.database, new_product("Widget", "tea", "Moscow")).await?;
        cart::add_to_cart(&data.database, CLIENT, product.id, Decimal::TWO, 1).await?;

        send(data, out, callback_event(CLIENT, "checkout")).await;
        send(data, out, text_event(CLIENT, "  Central, Main street 1  ")).await;

        let order = order::latest_pending_order(&data.database, CLIENT)
            .await?
            .unwrap();
        Ok(order.id)
    }

    #[tokio::test]
    async fn test_checkout_creates_order_and_asks_for_payment() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        let out = RecordingMessenger::new();

        let order_id = checkout_one_widget(&data, &out).await?;

        let details = order::order_details(&data.database, order_id).await?;
        assert_eq!(details.order.delivery_address, "Central, Main street 1");
        assert_eq!(details.order.total_amount, Decimal::from(180));
        assert_eq!(details.items.len(), 1);

        let reply = out.last_reply().unwrap();
        assert!(reply.tokens().any(|t| t == format!("confirm_payment_{order_id}")));
        assert!(reply.tokens().any(|t| t == format!("cancel_order_{order_id}")));
        let user = user::get_user(&data.database, CLIENT).await?.unwrap();
        assert_eq!(user.state, ConversationState::WaitingForPayment);
        // Cart survives until payment.
        assert_eq!(cart::cart_lines(&data.database, CLIENT).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_notifies_every_reachable_admin() -> Result<()> {
        let data = setup_test_bot(&[2, 3]).await?;
        let out = RecordingMessenger::new().with_unreachable(&[2]);
        let order_id = checkout_one_widget(&data, &out).await?;

        send(&data, &out, callback_event(CLIENT, &format!("confirm_payment_{order_id}"))).await;

        assert!(out.notifications_to(2).is_empty());
        let alerts = out.notifications_to(3);
        assert_eq!(alerts.len(), 1);
        for token in [
            format!("admin_confirm_{order_id}"),
            format!("admin_ship_{order_id}"),
            format!("admin_deliver_{order_id}"),
            format!("admin_send_photo_{order_id}"),
            format!("admin_order_view_{order_id}"),
            format!("admin_cancel_order_{order_id}"),
        ] {
            assert!(alerts[0].tokens().any(|t| t == token), "missing {token}");
        }

        assert!(cart::cart_lines(&data.database, CLIENT).await?.is_empty());
        let user = user::get_user(&data.database, CLIENT).await?.unwrap();
        assert_eq!(user.state, ConversationState::MainMenu);
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_keyword_uses_latest_pending_order() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        let out = RecordingMessenger::new();
        let order_id = checkout_one_widget(&data, &out).await?;

        send(&data, &out, text_event(CLIENT, "Оплатил, спасибо")).await;

        let alerts = out.notifications_to(ADMIN);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].text.contains(&format!("#{order_id}")));
        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_confirm_someone_elses_order() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        let out = RecordingMessenger::new();
        let order_id = checkout_one_widget(&data, &out).await?;
        create_test_user(&data.database, 200, "Moscow").await?;

        send(&data, &out, callback_event(200, &format!("confirm_payment_{order_id}"))).await;

        assert!(out.notifications_to(ADMIN).is_empty());
        assert!(out.last_reply().unwrap().text.contains("not found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_status_moves_notify_client() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        let out = RecordingMessenger::new();
        let order_id = checkout_one_widget(&data, &out).await?;
        out.reset();

        send(&data, &out, callback_event(ADMIN, &format!("admin_ship_{order_id}"))).await;
        assert_eq!(
            order::require_order(&data.database, order_id).await?.status,
            OrderStatus::Shipped
        );
        assert_eq!(out.notifications_to(CLIENT).len(), 1);

        send(&data, &out, callback_event(ADMIN, &format!("admin_confirm_{order_id}"))).await;
        assert_eq!(
            order::require_order(&data.database, order_id).await?.status,
            OrderStatus::Shipped
        );
        assert!(out.last_reply().unwrap().text.contains("cannot move"));
        assert_eq!(out.notifications_to(CLIENT).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_order_in_admin_flow_returns_to_panel() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        let out = RecordingMessenger::new();

        send(&data, &out, callback_event(ADMIN, "admin_send_photo_999")).await;

        let reply = out.last_reply().unwrap();
        assert!(reply.text.contains("Order not found"));
        assert!(reply.tokens().any(|t| t == "admin_orders"));
        let admin = user::get_user(&data.database, ADMIN).await?.unwrap();
        assert_eq!(admin.state, ConversationState::AdminPanel);
        Ok(())
    }
}
