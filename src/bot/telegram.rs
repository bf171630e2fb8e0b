//! Telegram transport for [`BotState`] and the [`Notifier`] used by the watcher.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{error, info, warn};

use crate::bot::command::bot_commands;
use crate::bot::{BotState, Reply};
use crate::notify::Notifier;
use crate::watch::registry::UserId;
use crate::watch::subscription::WatchToken;

/// Sends watcher notifications as Telegram messages.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, user: UserId, text: &str) {
        if let Err(e) = self.bot.send_message(ChatId(user.0), text).await {
            error!(%user, error = %e, "Failed to send Telegram notification");
        }
    }
}

/// Run the update dispatcher until Ctrl-C.
pub async fn run_dispatcher(bot: Bot, state: Arc<BotState>) {
    if let Err(e) = register_bot_commands(&bot).await {
        warn!(error = %e, "Failed to register bot commands with Telegram");
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("Telegram dispatcher started");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram dispatcher stopped");
}

async fn register_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = bot_commands()
        .into_iter()
        .map(|(cmd, desc)| BotCommand::new(cmd, desc))
        .collect();

    bot.set_my_commands(commands).await?;
    info!("Registered bot commands with Telegram");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Some(reply) = state.handle_text(UserId(msg.chat.id.0), text).await {
        send_reply(&bot, msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(ref payload) = q.data else {
        return Ok(());
    };

    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64));

    let Some(reply) = state.handle_action(UserId(chat_id.0), payload).await else {
        return Ok(());
    };

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(toast) = reply.toast {
        answer = answer.text(toast);
    }
    answer.await?;

    bot.send_message(chat_id, reply.message).await?;
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    let mut request = bot.send_message(chat_id, reply.text);
    if let Some(token) = reply.watch_button {
        request = request.reply_markup(watch_keyboard(token));
    }
    request.await?;
    Ok(())
}

fn watch_keyboard(token: WatchToken) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🔔 Notify me about discounts",
        token.encode(),
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_watch_keyboard_carries_token() {
        let markup = watch_keyboard(WatchToken(620));
        let button = &markup.inline_keyboard[0][0];
        assert_eq!(
            button.kind,
            InlineKeyboardButtonKind::CallbackData("watch_620".to_string())
        );
    }
}
