//! Parsing of stdin lines into commands.

use std::path::PathBuf;

use roomlink_client::UiCommand;
use thiserror::Error;

/// Usage text printed for `/help` and unknown commands.
pub const HELP: &str = "\
commands:
  /join <room>     switch to a room
  /create <name>   ask the server to create a room
  /send <path>     share a file with the current room
  /quit            leave
anything else is sent as a message";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Forward to the runtime.
    Ui(UiCommand),
    /// Read this file, then send it.
    SendFile(PathBuf),
    /// Print usage.
    Help,
    /// Blank line.
    Nothing,
}

/// Input parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Slash command not recognized.
    #[error("unknown command: /{0}")]
    UnknownCommand(String),

    /// Slash command needs an argument.
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),
}

/// Parse one line of user input.
///
/// Lines starting with `/` are commands; a leading `//` escapes a message
/// that itself starts with a slash. Message text is forwarded untrimmed.
///
/// # Errors
///
/// Returns [`InputError`] for unknown commands and missing arguments.
pub fn parse_line(line: &str) -> Result<LineCommand, InputError> {
    if line.trim().is_empty() {
        return Ok(LineCommand::Nothing);
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Ok(LineCommand::Ui(UiCommand::SendText { text: line.to_string() }));
    };
    if rest.starts_with('/') {
        return Ok(LineCommand::Ui(UiCommand::SendText { text: rest.to_string() }));
    }

    let (command, argument) = match rest.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (rest.trim(), ""),
    };
    let required = |name: &'static str| {
        if argument.is_empty() { Err(InputError::MissingArgument(name)) } else { Ok(argument) }
    };

    match command {
        "join" | "j" => {
            Ok(LineCommand::Ui(UiCommand::SelectRoom { room_id: required("join")?.to_string() }))
        },
        "create" => {
            Ok(LineCommand::Ui(UiCommand::CreateRoom { name: required("create")?.to_string() }))
        },
        "send" => Ok(LineCommand::SendFile(PathBuf::from(required("send")?))),
        "help" | "?" => Ok(LineCommand::Help),
        "quit" | "q" => Ok(LineCommand::Ui(UiCommand::Quit)),
        other => Err(InputError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_line("  hello there"),
            Ok(LineCommand::Ui(UiCommand::SendText { text: "  hello there".into() }))
        );
    }

    #[test]
    fn blank_line_does_nothing() {
        assert_eq!(parse_line("   "), Ok(LineCommand::Nothing));
    }

    #[test]
    fn join_takes_room() {
        assert_eq!(
            parse_line("/join random"),
            Ok(LineCommand::Ui(UiCommand::SelectRoom { room_id: "random".into() }))
        );
        assert_eq!(parse_line("/join"), Err(InputError::MissingArgument("join")));
    }

    #[test]
    fn create_keeps_inner_spaces() {
        assert_eq!(
            parse_line("/create  rust lovers "),
            Ok(LineCommand::Ui(UiCommand::CreateRoom { name: "rust lovers".into() }))
        );
    }

    #[test]
    fn send_takes_path() {
        assert_eq!(
            parse_line("/send ./a b.txt"),
            Ok(LineCommand::SendFile(PathBuf::from("./a b.txt")))
        );
    }

    #[test]
    fn double_slash_escapes_message() {
        assert_eq!(
            parse_line("//shrug"),
            Ok(LineCommand::Ui(UiCommand::SendText { text: "/shrug".into() }))
        );
    }

    #[test]
    fn unknown_command_is_error() {
        assert_eq!(parse_line("/dance"), Err(InputError::UnknownCommand("dance".into())));
    }

    #[test]
    fn quit_and_help() {
        assert_eq!(parse_line("/quit"), Ok(LineCommand::Ui(UiCommand::Quit)));
        assert_eq!(parse_line("/help"), Ok(LineCommand::Help));
    }
}
