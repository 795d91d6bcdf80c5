//! Conversation states.
//!
//! Every user sits in exactly one state. States decide which message handler
//! may take a free-form text or photo; callback buttons are routed by token
//! regardless of state.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Position of a user in the conversation state machine
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ConversationState {
    #[sea_orm(string_value = "MainMenu")]
    MainMenu,
    #[sea_orm(string_value = "SelectingCity")]
    SelectingCity,
    #[sea_orm(string_value = "Catalog")]
    Catalog,
    #[sea_orm(string_value = "Cart")]
    Cart,
    #[sea_orm(string_value = "Profile")]
    Profile,
    #[sea_orm(string_value = "AdminPanel")]
    AdminPanel,
    #[sea_orm(string_value = "WaitingForDistrict")]
    WaitingForDistrict,
    #[sea_orm(string_value = "WaitingForAddress")]
    WaitingForAddress,
    #[sea_orm(string_value = "WaitingForPayment")]
    WaitingForPayment,
    #[sea_orm(string_value = "AdminWaitingForProductName")]
    AdminWaitingForProductName,
    #[sea_orm(string_value = "AdminWaitingForProductPrice")]
    AdminWaitingForProductPrice,
    #[sea_orm(string_value = "AdminWaitingForProductDescription")]
    AdminWaitingForProductDescription,
    #[sea_orm(string_value = "AdminWaitingForProductStock")]
    AdminWaitingForProductStock,
    #[sea_orm(string_value = "AdminWaitingForProductCategory")]
    AdminWaitingForProductCategory,
    #[sea_orm(string_value = "AdminWaitingForProductCity")]
    AdminWaitingForProductCity,
    #[sea_orm(string_value = "AdminWaitingForGramPrices")]
    AdminWaitingForGramPrices,
    /// Waiting for the delivery photo of an order
    #[sea_orm(string_value = "AdminWaitingForProductPhoto")]
    AdminWaitingForProductPhoto,
    /// Waiting for the comment that goes with the delivery photo
    #[sea_orm(string_value = "AdminWaitingForOrderComment")]
    AdminWaitingForOrderComment,
    #[sea_orm(string_value = "AdminWaitingForDeliveryTime")]
    AdminWaitingForDeliveryTime,
    #[sea_orm(string_value = "WaitingForSupportMessage")]
    WaitingForSupportMessage,
    #[sea_orm(string_value = "AdminReplyingToSupport")]
    AdminReplyingToSupport,
}

/// Wizard steps in the order they are asked.
pub const WIZARD_STEPS: [ConversationState; 7] = [
    ConversationState::AdminWaitingForProductName,
    ConversationState::AdminWaitingForProductPrice,
    ConversationState::AdminWaitingForProductDescription,
    ConversationState::AdminWaitingForProductStock,
    ConversationState::AdminWaitingForProductCategory,
    ConversationState::AdminWaitingForProductCity,
    ConversationState::AdminWaitingForGramPrices,
];

impl ConversationState {
    /// States only an admin may occupy.
    #[must_use]
    pub const fn is_admin_state(self) -> bool {
        matches!(
            self,
            Self::AdminPanel
                | Self::AdminWaitingForProductName
                | Self::AdminWaitingForProductPrice
                | Self::AdminWaitingForProductDescription
                | Self::AdminWaitingForProductStock
                | Self::AdminWaitingForProductCategory
                | Self::AdminWaitingForProductCity
                | Self::AdminWaitingForGramPrices
                | Self::AdminWaitingForProductPhoto
                | Self::AdminWaitingForOrderComment
                | Self::AdminWaitingForDeliveryTime
                | Self::AdminReplyingToSupport
        )
    }

    /// Whether the state is one of the product wizard steps.
    #[must_use]
    pub fn is_wizard_step(self) -> bool {
        WIZARD_STEPS.contains(&self)
    }

    /// The wizard step after `self`, or `None` for the last step and for
    /// states outside the wizard.
    #[must_use]
    pub fn wizard_next(self) -> Option<Self> {
        let index = WIZARD_STEPS.iter().position(|step| *step == self)?;
        WIZARD_STEPS.get(index + 1).copied()
    }

    /// Whether a typed message is expected in this state rather than a button.
    #[must_use]
    pub fn accepts_free_text(self) -> bool {
        self.is_wizard_step()
            || matches!(
                self,
                Self::WaitingForDistrict
                    | Self::WaitingForAddress
                    | Self::WaitingForPayment
                    | Self::AdminWaitingForProductPhoto
                    | Self::AdminWaitingForOrderComment
                    | Self::AdminWaitingForDeliveryTime
                    | Self::WaitingForSupportMessage
                    | Self::AdminReplyingToSupport
            )
    }

    /// Whether the state is waiting for the checkout address.
    #[must_use]
    pub const fn is_checkout(self) -> bool {
        matches!(self, Self::WaitingForDistrict | Self::WaitingForAddress)
    }
}
