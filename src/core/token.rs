//! Callback-token vocabulary.
//!
//! Every inline button carries a token of the form `<action>_<args>` with `_`
//! as the only delimiter. [`Action`] is the typed form; `Display` writes a
//! token and [`Action::parse`] reads one back. Decimal arguments are written
//! with `.` and without trailing zeros, so a unit size survives the round trip
//! exactly.

use crate::core::price_table::format_decimal;
use crate::entities::OrderStatus;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Product field an admin can edit in place
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProductField {
    Name,
    Price,
    Description,
    Category,
    City,
    Stock,
    Prices,
}

impl ProductField {
    /// All editable fields, in the order the edit menu shows them.
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Price,
        Self::Description,
        Self::Category,
        Self::City,
        Self::Stock,
        Self::Prices,
    ];

    /// Short name used inside tokens.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Description => "desc",
            Self::Category => "cat",
            Self::City => "city",
            Self::Stock => "stock",
            Self::Prices => "prices",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.slug() == slug)
    }
}

/// A parsed callback token
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    MainMenu,
    ShowProfile,
    ChangeCity,
    SelectCity(String),

    // Catalog
    ShowCatalog,
    BackToCategories,
    BackToProducts,
    Category(String),
    Product(i64),
    SelectUnit { product_id: i64, size: Decimal },
    AddToCart { product_id: i64, size: Decimal, quantity: i32 },

    // Cart and checkout
    ShowCart,
    ClearCart,
    RemoveCartItem(i64),
    Checkout,

    // Payment
    Paid,
    ConfirmPayment(i64),

    // Client orders
    MyOrders,
    OrderDetails(i64),
    CancelOrder(i64),

    // Client support
    SupportStart,
    SupportOrder(i64),
    SupportHistory(i64),

    // Admin panel
    AdminPanel,
    AdminStats,
    AdminUsers,
    AdminCancel,

    // Admin orders
    AdminOrders,
    AdminOrdersFilter(OrderStatus),
    AdminOrderView(i64),
    AdminSetStatus { order_id: i64, status: OrderStatus },
    AdminSendPhoto(i64),
    AdminDeliveryTime(i64),

    // Admin products
    AdminProducts,
    AdminAddProduct,
    AdminEditProducts,
    EditProduct(i64),
    EditField { field: ProductField, product_id: i64 },
    ToggleProduct(i64),
    DeleteProduct(i64),

    // Admin support
    AdminSupportRequests,
    AdminSupportHistory(i64),
    AdminReplySupport { order_id: i64, client_id: i64 },
}

/// Token prefix for each status an admin can set directly.
const STATUS_PREFIXES: [(&str, OrderStatus); 5] = [
    ("admin_confirm_", OrderStatus::Confirmed),
    ("admin_ship_", OrderStatus::Shipped),
    ("admin_deliver_", OrderStatus::Delivered),
    ("admin_complete_", OrderStatus::Completed),
    ("admin_cancel_order_", OrderStatus::Cancelled),
];

fn id(arg: &str) -> Option<i64> {
    arg.parse().ok()
}

fn decimal(arg: &str) -> Option<Decimal> {
    // Tokens are written by us, so `,` never appears here.
    Decimal::from_str(arg).ok().map(|value| value.normalize())
}

fn non_empty(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

impl Action {
    /// Reads a token. Returns `None` for anything outside the vocabulary.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let exact = match token {
            "main_menu" => Some(Self::MainMenu),
            "show_profile" => Some(Self::ShowProfile),
            "change_city" => Some(Self::ChangeCity),
            "show_catalog" => Some(Self::ShowCatalog),
            "back_to_categories" => Some(Self::BackToCategories),
            "back_to_products" => Some(Self::BackToProducts),
            "show_cart" => Some(Self::ShowCart),
            "clear_cart" => Some(Self::ClearCart),
            "checkout" => Some(Self::Checkout),
            "paid" => Some(Self::Paid),
            "my_orders" | "show_orders" => Some(Self::MyOrders),
            "support_start" => Some(Self::SupportStart),
            "show_admin" => Some(Self::AdminPanel),
            "admin_stats" => Some(Self::AdminStats),
            "admin_users" => Some(Self::AdminUsers),
            "admin_cancel" => Some(Self::AdminCancel),
            "admin_orders" => Some(Self::AdminOrders),
            "admin_products" => Some(Self::AdminProducts),
            "admin_add_product" => Some(Self::AdminAddProduct),
            "admin_edit_product" => Some(Self::AdminEditProducts),
            "admin_support_requests" => Some(Self::AdminSupportRequests),
            _ => None,
        };
        if exact.is_some() {
            return exact;
        }

        if token.starts_with("admin_") {
            return Self::parse_admin(token);
        }

        if let Some(rest) = token.strip_prefix("city_") {
            return non_empty(rest).map(Self::SelectCity);
        }
        if let Some(rest) = token.strip_prefix("category_") {
            return non_empty(rest).map(Self::Category);
        }
        if let Some(rest) = token.strip_prefix("product_") {
            return id(rest).map(Self::Product);
        }
        if let Some(rest) = token.strip_prefix("select_gram_") {
            let (product, size) = rest.split_once('_')?;
            return Some(Self::SelectUnit {
                product_id: id(product)?,
                size: decimal(size)?,
            });
        }
        if let Some(rest) = token.strip_prefix("add_to_cart_") {
            let mut parts = rest.splitn(3, '_');
            let product_id = id(parts.next()?)?;
            let size = decimal(parts.next()?)?;
            let quantity = parts.next()?.parse().ok()?;
            return Some(Self::AddToCart {
                product_id,
                size,
                quantity,
            });
        }
        if let Some(rest) = token.strip_prefix("remove_") {
            return id(rest).map(Self::RemoveCartItem);
        }
        if let Some(rest) = token.strip_prefix("confirm_payment_") {
            return id(rest).map(Self::ConfirmPayment);
        }
        if let Some(rest) = token.strip_prefix("order_details_") {
            return id(rest).map(Self::OrderDetails);
        }
        if let Some(rest) = token.strip_prefix("cancel_order_") {
            return id(rest).map(Self::CancelOrder);
        }
        if let Some(rest) = token.strip_prefix("support_order_") {
            return id(rest).map(Self::SupportOrder);
        }
        if let Some(rest) = token.strip_prefix("support_history_") {
            return id(rest).map(Self::SupportHistory);
        }
        if let Some(rest) = token.strip_prefix("edit_product_") {
            return id(rest).map(Self::EditProduct);
        }
        if let Some(rest) = token.strip_prefix("toggle_product_") {
            return id(rest).map(Self::ToggleProduct);
        }
        if let Some(rest) = token.strip_prefix("delete_product_") {
            return id(rest).map(Self::DeleteProduct);
        }
        if let Some(rest) = token.strip_prefix("edit_") {
            let (slug, product) = rest.split_once('_')?;
            return Some(Self::EditField {
                field: ProductField::from_slug(slug)?,
                product_id: id(product)?,
            });
        }
        None
    }

    fn parse_admin(token: &str) -> Option<Self> {
        if let Some(rest) = token.strip_prefix("admin_orders_filter_") {
            return OrderStatus::from_name(rest).map(Self::AdminOrdersFilter);
        }
        if let Some(rest) = token.strip_prefix("admin_order_view_") {
            return id(rest).map(Self::AdminOrderView);
        }
        for (prefix, status) in STATUS_PREFIXES {
            if let Some(rest) = token.strip_prefix(prefix) {
                return id(rest).map(|order_id| Self::AdminSetStatus { order_id, status });
            }
        }
        if let Some(rest) = token.strip_prefix("admin_send_photo_") {
            return id(rest).map(Self::AdminSendPhoto);
        }
        if let Some(rest) = token.strip_prefix("admin_delivery_time_") {
            return id(rest).map(Self::AdminDeliveryTime);
        }
        if let Some(rest) = token.strip_prefix("admin_support_history_") {
            return id(rest).map(Self::AdminSupportHistory);
        }
        if let Some(rest) = token.strip_prefix("admin_reply_support_") {
            let (order, client) = rest.split_once('_')?;
            return Some(Self::AdminReplySupport {
                order_id: id(order)?,
                client_id: id(client)?,
            });
        }
        None
    }

    /// Whether only allowlisted admins may trigger this action.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::AdminPanel
                | Self::AdminStats
                | Self::AdminUsers
                | Self::AdminCancel
                | Self::AdminOrders
                | Self::AdminOrdersFilter(_)
                | Self::AdminOrderView(_)
                | Self::AdminSetStatus { .. }
                | Self::AdminSendPhoto(_)
                | Self::AdminDeliveryTime(_)
                | Self::AdminProducts
                | Self::AdminAddProduct
                | Self::AdminEditProducts
                | Self::EditProduct(_)
                | Self::EditField { .. }
                | Self::ToggleProduct(_)
                | Self::DeleteProduct(_)
                | Self::AdminSupportRequests
                | Self::AdminSupportHistory(_)
                | Self::AdminReplySupport { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainMenu => f.write_str("main_menu"),
            Self::ShowProfile => f.write_str("show_profile"),
            Self::ChangeCity => f.write_str("change_city"),
            Self::SelectCity(city) => write!(f, "city_{city}"),
            Self::ShowCatalog => f.write_str("show_catalog"),
            Self::BackToCategories => f.write_str("back_to_categories"),
            Self::BackToProducts => f.write_str("back_to_products"),
            Self::Category(category) => write!(f, "category_{category}"),
            Self::Product(product_id) => write!(f, "product_{product_id}"),
            Self::SelectUnit { product_id, size } => {
                write!(f, "select_gram_{product_id}_{}", format_decimal(*size))
            }
            Self::AddToCart {
                product_id,
                size,
                quantity,
            } => write!(
                f,
                "add_to_cart_{product_id}_{}_{quantity}",
                format_decimal(*size)
            ),
            Self::ShowCart => f.write_str("show_cart"),
            Self::ClearCart => f.write_str("clear_cart"),
            Self::RemoveCartItem(item_id) => write!(f, "remove_{item_id}"),
            Self::Checkout => f.write_str("checkout"),
            Self::Paid => f.write_str("paid"),
            Self::ConfirmPayment(order_id) => write!(f, "confirm_payment_{order_id}"),
            Self::MyOrders => f.write_str("my_orders"),
            Self::OrderDetails(order_id) => write!(f, "order_details_{order_id}"),
            Self::CancelOrder(order_id) => write!(f, "cancel_order_{order_id}"),
            Self::SupportStart => f.write_str("support_start"),
            Self::SupportOrder(order_id) => write!(f, "support_order_{order_id}"),
            Self::SupportHistory(order_id) => write!(f, "support_history_{order_id}"),
            Self::AdminPanel => f.write_str("show_admin"),
            Self::AdminStats => f.write_str("admin_stats"),
            Self::AdminUsers => f.write_str("admin_users"),
            Self::AdminCancel => f.write_str("admin_cancel"),
            Self::AdminOrders => f.write_str("admin_orders"),
            Self::AdminOrdersFilter(status) => write!(f, "admin_orders_filter_{status}"),
            Self::AdminOrderView(order_id) => write!(f, "admin_order_view_{order_id}"),
            Self::AdminSetStatus { order_id, status } => {
                let prefix = STATUS_PREFIXES
                    .iter()
                    .find(|(_, candidate)| candidate == status)
                    .map_or("admin_confirm_", |(prefix, _)| prefix);
                write!(f, "{prefix}{order_id}")
            }
            Self::AdminSendPhoto(order_id) => write!(f, "admin_send_photo_{order_id}"),
            Self::AdminDeliveryTime(order_id) => write!(f, "admin_delivery_time_{order_id}"),
            Self::AdminProducts => f.write_str("admin_products"),
            Self::AdminAddProduct => f.write_str("admin_add_product"),
            Self::AdminEditProducts => f.write_str("admin_edit_product"),
            Self::EditProduct(product_id) => write!(f, "edit_product_{product_id}"),
            Self::EditField { field, product_id } => {
                write!(f, "edit_{}_{product_id}", field.slug())
            }
            Self::ToggleProduct(product_id) => write!(f, "toggle_product_{product_id}"),
            Self::DeleteProduct(product_id) => write!(f, "delete_product_{product_id}"),
            Self::AdminSupportRequests => f.write_str("admin_support_requests"),
            Self::AdminSupportHistory(order_id) => write!(f, "admin_support_history_{order_id}"),
            Self::AdminReplySupport {
                order_id,
                client_id,
            } => write!(f, "admin_reply_support_{order_id}_{client_id}"),
        }
    }
}

/// One instance of every action, used by tests that sweep the vocabulary.
#[cfg(test)]
pub fn sample_actions() -> Vec<Action> {
    let half = Decimal::new(5, 1);
    let mut actions = vec![
        Action::MainMenu,
        Action::ShowProfile,
        Action::ChangeCity,
        Action::SelectCity("Saint Petersburg".to_string()),
        Action::ShowCatalog,
        Action::BackToCategories,
        Action::BackToProducts,
        Action::Category("tea_leaves".to_string()),
        Action::Product(7),
        Action::SelectUnit {
            product_id: 7,
            size: half,
        },
        Action::AddToCart {
            product_id: 7,
            size: half,
            quantity: 3,
        },
        Action::ShowCart,
        Action::ClearCart,
        Action::RemoveCartItem(4),
        Action::Checkout,
        Action::Paid,
        Action::ConfirmPayment(12),
        Action::MyOrders,
        Action::OrderDetails(12),
        Action::CancelOrder(12),
        Action::SupportStart,
        Action::SupportOrder(0),
        Action::SupportHistory(12),
        Action::AdminPanel,
        Action::AdminStats,
        Action::AdminUsers,
        Action::AdminCancel,
        Action::AdminOrders,
        Action::AdminOrderView(12),
        Action::AdminSendPhoto(12),
        Action::AdminDeliveryTime(12),
        Action::AdminProducts,
        Action::AdminAddProduct,
        Action::AdminEditProducts,
        Action::EditProduct(7),
        Action::ToggleProduct(7),
        Action::DeleteProduct(7),
        Action::AdminSupportRequests,
        Action::AdminSupportHistory(12),
        Action::AdminReplySupport {
            order_id: 12,
            client_id: 42,
        },
    ];
    actions.extend(OrderStatus::ALL.into_iter().map(Action::AdminOrdersFilter));
    actions.extend(STATUS_PREFIXES.iter().map(|(_, status)| Action::AdminSetStatus {
        order_id: 12,
        status: *status,
    }));
    actions.extend(ProductField::ALL.into_iter().map(|field| Action::EditField {
        field,
        product_id: 7,
    }));
    actions
}
