use crate::store::models::AppId;

/// A parsed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Watches,
    /// `None` when the argument is missing or not an app id.
    Unwatch(Option<AppId>),
    /// Anything that is not a known command is a game search.
    Search(String),
}

/// Slash commands advertised in the client's "/" menu.
pub fn bot_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("start", "Welcome message"),
        ("help", "How to use the bot"),
        ("watches", "List games you are watching"),
        ("unwatch", "Stop watching a game: /unwatch <appid>"),
    ]
}

pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let Some(rest) = text.strip_prefix('/') else {
        return Some(Command::Search(text.to_string()));
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((rest, ""));
    // "/start@SomeBot" in group chats
    let name = name.split('@').next().unwrap_or(name).to_lowercase();

    let command = match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "watches" => Command::Watches,
        "unwatch" => Command::Unwatch(arg.parse().ok()),
        _ => Command::Search(text.to_string()),
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_search() {
        assert_eq!(
            parse_command("  Portal 2 "),
            Some(Command::Search("Portal 2".to_string()))
        );
    }

    #[test]
    fn test_empty_is_ignored() {
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_known_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/start@SteamPriceBot"), Some(Command::Start));
        assert_eq!(parse_command("/HELP"), Some(Command::Help));
        assert_eq!(parse_command("/watches"), Some(Command::Watches));
    }

    #[test]
    fn test_unwatch_argument() {
        assert_eq!(parse_command("/unwatch 620"), Some(Command::Unwatch(Some(620))));
        assert_eq!(parse_command("/unwatch"), Some(Command::Unwatch(None)));
        assert_eq!(parse_command("/unwatch portal"), Some(Command::Unwatch(None)));
    }

    #[test]
    fn test_unknown_slash_is_search() {
        assert_eq!(
            parse_command("/portal"),
            Some(Command::Search("/portal".to_string()))
        );
    }

    #[test]
    fn test_bot_commands_are_parseable() {
        for (name, _) in bot_commands() {
            let parsed = parse_command(&format!("/{name}")).unwrap();
            assert!(!matches!(parsed, Command::Search(_)), "{name}");
        }
    }
}
