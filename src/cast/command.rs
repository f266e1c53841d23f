//! Moderation commands
//!
//! The cast owner moderates by typing commands on the cast channel:
//!
//! | command        | argument      |
//! |----------------|---------------|
//! | `/mute`        | viewer name   |
//! | `/unmute`      | viewer name   |
//! | `/ban`         | viewer name   |
//! | `/unban`       | banned name   |
//! | `/kick`        | viewer name   |
//! | `/spectators`  | none          |
//! | `/password`    | new password (omit to open the cast) |
//!
//! A line is split once on the first space: the command word is matched
//! case-insensitively and everything after the space is the argument,
//! internal spaces included. Parsing produces a typed [`ModerationCommand`]
//! or a [`CommandError`]; applying a command mutates the session and yields
//! the single [`Reply`] to send once the mutation is done.

use crate::persistence::PersistenceSink;

use super::session::CastSession;

/// Prefix that marks a chat line as a command
pub const COMMAND_PREFIX: char = '/';

const NOT_FOUND: &str = "Spectator not found.";

/// Command word, with its declared argument arity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Mute,
    Unmute,
    Ban,
    Unban,
    Kick,
    Spectators,
    Password,
}

/// How many arguments a command takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No argument; anything after the command word is ignored
    None,
    /// Exactly one argument
    One,
    /// One argument that may be left out
    Optional,
}

impl CommandKind {
    /// Match a command word, ignoring case
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "mute" => Some(CommandKind::Mute),
            "unmute" => Some(CommandKind::Unmute),
            "ban" => Some(CommandKind::Ban),
            "unban" => Some(CommandKind::Unban),
            "kick" => Some(CommandKind::Kick),
            "spectators" => Some(CommandKind::Spectators),
            "password" => Some(CommandKind::Password),
            _ => None,
        }
    }

    /// Argument arity of this command
    pub fn arity(self) -> Arity {
        match self {
            CommandKind::Spectators => Arity::None,
            CommandKind::Password => Arity::Optional,
            _ => Arity::One,
        }
    }
}

/// A parsed moderation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationCommand {
    Mute(String),
    Unmute(String),
    Ban(String),
    Unban(String),
    Kick(String),
    Spectators,
    /// New password; empty opens the cast
    Password(String),
}

/// Validation failure, reported privately to the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Not enough parameters.")]
    MissingArgument,
    #[error("Invalid command.")]
    Unrecognized,
}

/// Message produced by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Notice on the cast channel, seen by the owner and every viewer
    Broadcast(String),
    /// Status line seen only by the owner
    Private(String),
}

/// Parse a chat line
///
/// Returns `None` when the line is not a command at all.
pub fn parse(text: &str) -> Option<Result<ModerationCommand, CommandError>> {
    let body = text.strip_prefix(COMMAND_PREFIX)?;

    let (word, arg) = match body.split_once(' ') {
        Some((word, arg)) => (word, Some(arg).filter(|a| !a.is_empty())),
        None => (body, None),
    };

    let Some(kind) = CommandKind::from_word(word) else {
        return Some(Err(CommandError::Unrecognized));
    };

    let arg = match (kind.arity(), arg) {
        (Arity::One, None) => return Some(Err(CommandError::MissingArgument)),
        (Arity::One | Arity::Optional, Some(arg)) => arg.to_owned(),
        _ => String::new(),
    };

    Some(Ok(match kind {
        CommandKind::Mute => ModerationCommand::Mute(arg),
        CommandKind::Unmute => ModerationCommand::Unmute(arg),
        CommandKind::Ban => ModerationCommand::Ban(arg),
        CommandKind::Unban => ModerationCommand::Unban(arg),
        CommandKind::Kick => ModerationCommand::Kick(arg),
        CommandKind::Spectators => ModerationCommand::Spectators,
        CommandKind::Password => ModerationCommand::Password(arg),
    }))
}

impl ModerationCommand {
    /// Apply the command to a session and return the reply to send
    pub(crate) fn apply(self, session: &mut CastSession, sink: &dyn PersistenceSink) -> Reply {
        match self {
            ModerationCommand::Mute(name) => match session.find_viewer_by_name(&name) {
                Some(viewer) => {
                    session.mute(viewer.id());
                    Reply::Broadcast(format!("{} has been muted.", viewer.display_name()))
                }
                None => Reply::Private(NOT_FOUND.into()),
            },
            ModerationCommand::Unmute(name) => match session.find_viewer_by_name(&name) {
                Some(viewer) => {
                    session.unmute(viewer.id());
                    Reply::Broadcast(format!("{} has been unmuted.", viewer.display_name()))
                }
                None => Reply::Private(NOT_FOUND.into()),
            },
            ModerationCommand::Ban(name) => match session.find_viewer_by_name(&name) {
                Some(viewer) => {
                    session.ban(&viewer, sink);
                    tracing::info!(
                        owner = %session.owner_id(),
                        viewer = %viewer.display_name(),
                        peer = %viewer.remote_addr(),
                        "Viewer banned"
                    );
                    Reply::Broadcast(format!("{} has been banned.", viewer.display_name()))
                }
                None => Reply::Private(NOT_FOUND.into()),
            },
            ModerationCommand::Unban(name) => {
                if session.unban(&name) {
                    Reply::Broadcast(format!("{} has been unbanned.", name))
                } else {
                    Reply::Private(NOT_FOUND.into())
                }
            }
            ModerationCommand::Kick(name) => match session.find_viewer_by_name(&name) {
                Some(viewer) => {
                    session.kick(&viewer, sink);
                    tracing::info!(
                        owner = %session.owner_id(),
                        viewer = %viewer.display_name(),
                        "Viewer kicked"
                    );
                    Reply::Broadcast(format!("{} has been kicked.", viewer.display_name()))
                }
                None => Reply::Private(NOT_FOUND.into()),
            },
            ModerationCommand::Spectators => {
                if session.viewers().is_empty() {
                    Reply::Broadcast("No spectators.".into())
                } else {
                    let names: Vec<&str> =
                        session.viewers().iter().map(|v| v.display_name()).collect();
                    Reply::Broadcast(format!("Spectators:\n{}", names.join("\n")))
                }
            }
            ModerationCommand::Password(password) => {
                session.set_password(&password, sink);
                if password.is_empty() {
                    Reply::Broadcast("Cast is no longer password protected.".into())
                } else {
                    Reply::Broadcast(format!("Casting new password: {}", password))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connection::{ConnectionEvents, OwnerId, Outgoing};
    use crate::registry::CastRegistry;
    use crate::test_support::{connection, connection_at, RecordingSink, CAST_CHANNEL};

    fn active_session(sink: &RecordingSink) -> (CastSession, ConnectionEvents, CastRegistry) {
        let (conn, events) = connection(100);
        let mut session = CastSession::new(OwnerId(1), "Alice", conn, CAST_CHANNEL, "Live Channel");
        let mut registry = CastRegistry::new(4);
        assert!(session.start(&mut registry, sink, None, ""));
        (session, events, registry)
    }

    fn last_text(events: &mut ConnectionEvents) -> Option<String> {
        events
            .drain()
            .last()
            .and_then(|m| m.text().map(str::to_owned))
    }

    #[test]
    fn test_parse_not_a_command() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse("/MUTE Spectator(1)"),
            Some(Ok(ModerationCommand::Mute("Spectator(1)".into())))
        );
        assert_eq!(parse("/spectators"), Some(Ok(ModerationCommand::Spectators)));
        assert_eq!(
            parse("/spectators please"),
            Some(Ok(ModerationCommand::Spectators))
        );
        // Argument keeps internal whitespace
        assert_eq!(
            parse("/password open sesame"),
            Some(Ok(ModerationCommand::Password("open sesame".into())))
        );
        assert_eq!(parse("/password"), Some(Ok(ModerationCommand::Password(String::new()))));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("/kick"), Some(Err(CommandError::MissingArgument)));
        assert_eq!(parse("/ban "), Some(Err(CommandError::MissingArgument)));
        assert_eq!(parse("/dance"), Some(Err(CommandError::Unrecognized)));
        assert_eq!(parse("/"), Some(Err(CommandError::Unrecognized)));
    }

    #[test]
    fn test_arity() {
        assert_eq!(CommandKind::Spectators.arity(), Arity::None);
        assert_eq!(CommandKind::Password.arity(), Arity::Optional);
        assert_eq!(CommandKind::Kick.arity(), Arity::One);
    }

    #[test]
    fn test_mute_keeps_viewer_listed() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);
        let (conn, mut viewer_events) = connection(1);
        let viewer = session.add_viewer(conn, &sink).unwrap();

        assert!(session.dispatch_chat_command("/mute spectator(1)", &sink));
        assert!(session.is_muted(viewer.id()));
        assert_eq!(session.viewer_count(), 1);
        assert_eq!(
            viewer_events.drain(),
            vec![Outgoing::notice(CAST_CHANNEL, "Spectator(1) has been muted.")]
        );

        session.dispatch_chat_command("/unmute Spectator(1)", &sink);
        assert!(!session.is_muted(viewer.id()));
        assert_eq!(
            last_text(&mut owner_events).as_deref(),
            Some("Spectator(1) has been unmuted.")
        );
    }

    #[test]
    fn test_unknown_viewer_reported_privately() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);
        let (conn, mut viewer_events) = connection(1);
        session.add_viewer(conn, &sink);
        owner_events.drain();

        for line in ["/mute Spectator(9)", "/kick nobody", "/ban x", "/unban x"] {
            assert!(session.dispatch_chat_command(line, &sink));
            assert_eq!(
                owner_events.drain(),
                vec![Outgoing::status("Spectator not found.")]
            );
        }
        assert!(viewer_events.drain().is_empty());
    }

    #[test]
    fn test_kick_removes_and_disconnects() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);
        let (conn1, _events1) = connection(1);
        let (conn2, events2) = connection(2);
        session.add_viewer(conn1, &sink);
        let v2 = session.add_viewer(conn2, &sink).unwrap();

        session.dispatch_chat_command("/kick Spectator(2)", &sink);

        assert_eq!(session.viewer_count(), 1);
        assert!(events2.is_disconnected());
        assert_eq!(v2.cast(), None);
        assert_eq!(
            last_text(&mut owner_events).as_deref(),
            Some("Spectator(2) has been kicked.")
        );
    }

    #[test]
    fn test_ban_then_unban() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);
        let (conn, events) = connection_at(1, [192, 168, 1, 20]);
        let viewer = session.add_viewer(conn, &sink).unwrap();
        let addr = viewer.remote_addr();

        session.dispatch_chat_command("/ban Spectator(1)", &sink);
        assert_eq!(session.viewer_count(), 0);
        assert!(events.is_disconnected());
        assert!(session.is_banned(&addr));
        assert_eq!(session.banned().get(&addr).map(String::as_str), Some("spectator(1)"));
        assert_eq!(
            last_text(&mut owner_events).as_deref(),
            Some("Spectator(1) has been banned.")
        );

        session.dispatch_chat_command("/unban SPECTATOR(1)", &sink);
        assert!(!session.is_banned(&addr));
        assert_eq!(session.viewer_count(), 0);
        assert_eq!(
            last_text(&mut owner_events).as_deref(),
            Some("SPECTATOR(1) has been unbanned.")
        );
    }

    #[test]
    fn test_spectators_listing() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);

        session.dispatch_chat_command("/spectators", &sink);
        assert_eq!(last_text(&mut owner_events).as_deref(), Some("No spectators."));

        let (conn1, _e1) = connection(1);
        let (conn2, _e2) = connection(2);
        session.add_viewer(conn1, &sink);
        session.add_viewer(conn2, &sink);

        session.dispatch_chat_command("/Spectators", &sink);
        assert_eq!(
            last_text(&mut owner_events).as_deref(),
            Some("Spectators:\nSpectator(1)\nSpectator(2)")
        );
    }

    #[test]
    fn test_password_change() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);

        session.dispatch_chat_command("/password Secret", &sink);
        assert_eq!(session.password(), "Secret");
        assert!(sink.requests().last().map_or(false, |r| matches!(
            r,
            crate::persistence::PersistRequest::Upsert(rec) if rec.password_protected
        )));
        assert_eq!(
            last_text(&mut owner_events).as_deref(),
            Some("Casting new password: Secret")
        );

        session.dispatch_chat_command("/password", &sink);
        assert!(!session.is_password_protected());
    }

    #[test]
    fn test_invalid_and_incomplete_commands() {
        let sink = RecordingSink::default();
        let (mut session, mut owner_events, _registry) = active_session(&sink);
        owner_events.drain();

        assert!(session.dispatch_chat_command("/wave", &sink));
        assert_eq!(owner_events.drain(), vec![Outgoing::status("Invalid command.")]);

        assert!(session.dispatch_chat_command("/mute", &sink));
        assert_eq!(
            owner_events.drain(),
            vec![Outgoing::status("Not enough parameters.")]
        );

        assert!(!session.dispatch_chat_command("just chatting", &sink));
        assert!(owner_events.drain().is_empty());
    }

    #[test]
    fn test_kicked_viewer_misses_notice() {
        let sink = RecordingSink::default();
        let (mut session, _owner_events, _registry) = active_session(&sink);
        let (conn, mut events) = connection(1);
        let viewer = session.add_viewer(conn, &sink).unwrap();

        session.dispatch_chat_command("/kick Spectator(1)", &sink);

        // Removed before the notice went out
        assert!(events.drain().is_empty());
        assert_eq!(Arc::strong_count(&viewer), 1);
    }
}
