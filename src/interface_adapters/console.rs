// Line-oriented console commands for the headless driving client.

use crate::domain::{Control, ControlMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Press(Control),
    Release(Control),
    Mode(ControlMode),
    Chat(String),
    Join {
        name: Option<String>,
        car_id: Option<String>,
        color: Option<String>,
    },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    UnknownCommand(String),
    UnknownKey(String),
    UnknownMode(String),
    MissingArgument(&'static str),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::UnknownCommand(cmd) => write!(f, "unknown command `{cmd}`"),
            CommandError::UnknownKey(key) => write!(f, "unbound key code `{key}`"),
            CommandError::UnknownMode(mode) => write!(f, "unknown mode `{mode}` (grip|drift)"),
            CommandError::MissingArgument(what) => write!(f, "missing {what}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub fn parse_command(line: &str) -> Result<ClientCommand, CommandError> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "" => Err(CommandError::Empty),
        "down" | "up" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("key code"));
            }
            let control = Control::from_key_code(rest)
                .ok_or_else(|| CommandError::UnknownKey(rest.to_string()))?;
            Ok(if cmd == "down" {
                ClientCommand::Press(control)
            } else {
                ClientCommand::Release(control)
            })
        }
        "mode" => ControlMode::parse(rest)
            .map(ClientCommand::Mode)
            .ok_or_else(|| CommandError::UnknownMode(rest.to_string())),
        // Chat keeps interior whitespace; blank text is filtered later.
        "chat" => Ok(ClientCommand::Chat(rest.to_string())),
        "join" => {
            let mut args = rest.split_whitespace().map(str::to_string);
            Ok(ClientCommand::Join {
                name: args.next(),
                car_id: args.next(),
                color: args.next(),
            })
        }
        "quit" | "exit" => Ok(ClientCommand::Quit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_commands_map_to_controls() {
        assert_eq!(
            parse_command("down KeyW"),
            Ok(ClientCommand::Press(Control::Forward))
        );
        assert_eq!(
            parse_command("  up   ShiftRight "),
            Ok(ClientCommand::Release(Control::Nitro))
        );
        assert_eq!(
            parse_command("down KeyQ"),
            Err(CommandError::UnknownKey("KeyQ".to_string()))
        );
        assert_eq!(
            parse_command("up"),
            Err(CommandError::MissingArgument("key code"))
        );
    }

    #[test]
    fn mode_and_quit() {
        assert_eq!(
            parse_command("mode drift"),
            Ok(ClientCommand::Mode(ControlMode::Drift))
        );
        assert!(matches!(
            parse_command("mode rally"),
            Err(CommandError::UnknownMode(_))
        ));
        assert_eq!(parse_command("quit"), Ok(ClientCommand::Quit));
    }

    #[test]
    fn chat_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_command("chat see you at the  bridge"),
            Ok(ClientCommand::Chat("see you at the  bridge".to_string()))
        );
        assert_eq!(parse_command("chat"), Ok(ClientCommand::Chat(String::new())));
    }

    #[test]
    fn join_arguments_are_positional_and_optional() {
        assert_eq!(
            parse_command("join Ana falcon #ff0000"),
            Ok(ClientCommand::Join {
                name: Some("Ana".to_string()),
                car_id: Some("falcon".to_string()),
                color: Some("#ff0000".to_string()),
            })
        );
        assert_eq!(
            parse_command("join"),
            Ok(ClientCommand::Join {
                name: None,
                car_id: None,
                color: None,
            })
        );
    }

    #[test]
    fn blank_and_unknown_lines_are_errors() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert!(matches!(
            parse_command("honk"),
            Err(CommandError::UnknownCommand(_))
        ));
    }
}
