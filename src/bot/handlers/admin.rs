//! Admin panel entry, dashboard and user list.

use crate::{
    bot::{messenger::{Messenger, Outbound}, router::Turn, views},
    core::{state::ConversationState, stats, token::Action, user},
    errors::Result,
};

/// Users listed on the admin users screen.
const RECENT_USERS: u64 = 10;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::AdminPanel => show_panel(turn).await,
        Action::AdminCancel => {
            turn.data.scratch.clear(turn.user.id);
            turn.set_state(ConversationState::AdminPanel).await?;
            let panel = views::admin_panel();
            turn.reply(Outbound {
                text: format!("✖️ Cancelled.\n\n{}", panel.text),
                ..panel
            })
            .await
        }
        Action::AdminStats => {
            let figures = stats::shop_stats(turn.db()).await?;
            turn.reply(views::stats(&figures, turn.currency())).await
        }
        Action::AdminUsers => {
            let users = user::recently_active_users(turn.db(), RECENT_USERS).await?;
            turn.reply(views::users(&users)).await
        }
        other => super::misrouted("admin", &other),
    }
}

/// Leaves any admin flow and shows the panel.
pub async fn show_panel<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    turn.data.scratch.clear(turn.user.id);
    turn.set_state(ConversationState::AdminPanel).await?;
    turn.reply(views::admin_panel()).await
}

/// Shows the panel under a short report line.
pub async fn panel_with<M: Messenger>(turn: &mut Turn<'_, M>, report: &str) -> Result<()> {
    turn.set_state(ConversationState::AdminPanel).await?;
    let panel = views::admin_panel();
    turn.reply(Outbound {
        text: format!("{report}\n\n{}", panel.text),
        ..panel
    })
    .await
}
