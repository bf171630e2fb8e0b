//! Plain-text message bodies for chat replies and alerts.

use std::collections::BTreeSet;

use crate::store::models::{store_link, AppId, GameListing};
use crate::store::LookupError;
use crate::watch::registry::AddOutcome;

pub fn welcome() -> String {
    "👋 Welcome to Steam Price Bot!\n\
     Send me a game title and I will show its price and DLC. \
     You can subscribe to be notified when it goes on sale.\n\n\
     /watches — list your subscriptions\n\
     /unwatch <appid> — stop watching a game"
        .to_string()
}

pub fn game_card(game: &GameListing) -> String {
    let mut text = format!("🎮 {}\n💸 Price: {}\n🔗 {}", game.title, game.price, game.link);

    if !game.dlcs.is_empty() {
        text.push_str("\n\n📦 DLC:");
        for dlc in &game.dlcs {
            text.push_str(&format!("\n- {} — {}", dlc.title, dlc.price));
        }
    }

    text
}

pub fn discount_alert(name: &str, percent: u8, price: &str, app_id: AppId) -> String {
    format!(
        "🎉 {name} is on sale: -{percent}%\n💸 Now: {price}\n🔗 {}",
        store_link(app_id)
    )
}

pub fn lookup_error(err: &LookupError) -> String {
    match err {
        LookupError::Unavailable(_) => "⛔ This game is not available in your region".to_string(),
        other => format!("❌ Error: {other}"),
    }
}

pub fn subscribed(outcome: AddOutcome) -> String {
    match outcome {
        AddOutcome::Added | AddOutcome::Reset => {
            "🔔 I will let you know when this game goes on sale!".to_string()
        }
        AddOutcome::AlreadyWatching => "🔔 You are already watching this game.".to_string(),
    }
}

pub fn subscribe_failed() -> String {
    "❌ Could not add the game to your watch list".to_string()
}

pub fn watch_list(app_ids: &BTreeSet<AppId>) -> String {
    if app_ids.is_empty() {
        return "You are not watching any games.".to_string();
    }

    let mut text = String::from("🔔 Watching:");
    for app_id in app_ids {
        text.push_str(&format!("\n- {app_id} {}", store_link(*app_id)));
    }
    text
}

pub fn unwatched(app_id: AppId, removed: bool) -> String {
    if removed {
        format!("🔕 Stopped watching {app_id}.")
    } else {
        format!("You were not watching {app_id}.")
    }
}
