//! JSON-lines protocol between the connector and the headless runner.
//!
//! **Input (stdin):** one command per line.
//! **Output (stdout):** one response per line.
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0"}`
//! 2. Connector sends a `snapshot` command every turn
//! 3. Runner answers each snapshot with exactly one `action` response,
//!    whose `action` field is absent when the agent does nothing
//! 4. `reset` discards all decision state; `quit` ends the session
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0"}
//! -> {"cmd":"snapshot","turn":1,"map_size":20,"self":{"id":"me","position":{"x":10,"y":10},"health":100}}
//! <- {"type":"action","turn":1,"action":{"action":"move","path":"uu"}}
//! -> {"cmd":"reset","reason":"desync"}
//! <- {"type":"reset","rebuilds":1}
//! -> {"cmd":"quit"}
//! <- {"type":"bye","turns":1,"failed_turns":0}
//! ```

use arena_core::action::Action;
use arena_core::snapshot::WorldSnapshot;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the `ready` line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Connector -> Runner)
// ============================================================================

/// Commands accepted by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// A new turn's world snapshot; the snapshot fields sit beside `cmd`.
    Snapshot(Box<WorldSnapshot>),

    /// The connector lost track of the game; rebuild the decision state.
    Reset {
        #[serde(default)]
        reason: String,
    },

    /// Report the hash of the persisted decision state.
    Hash,

    /// End the session.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Command name for error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::Reset { .. } => "reset",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (Runner -> Connector)
// ============================================================================

/// Responses written by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String },

    /// The agent's answer to one snapshot.
    Action {
        turn: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<Action>,
    },

    /// Decision state was rebuilt.
    Reset { rebuilds: u64 },

    /// Hash of the persisted decision state.
    StateHash { hash: u64 },

    /// A line could not be handled. The session continues.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye { turns: u64, failed_turns: u64 },
}

impl Response {
    /// Create a ready response.
    pub fn ready() -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::geometry::{Direction, Position};

    #[test]
    fn test_parse_snapshot_command() {
        let json = r#"{"cmd":"snapshot","turn":7,"map_size":12,
            "self":{"id":"me","position":{"x":3,"y":4},"health":80}}"#;
        let cmd = Command::from_json(json).unwrap();
        match cmd {
            Command::Snapshot(snapshot) => {
                assert_eq!(snapshot.turn, 7);
                assert_eq!(snapshot.me.position, Position::new(3, 4));
                assert_eq!(snapshot.me.health, 80);
                assert!(snapshot.hostiles.is_empty());
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_with_null_collections() {
        let json = r#"{"cmd":"snapshot","turn":2,"map_size":12,
            "self":{"id":"me","position":{"x":3,"y":4},"health":80},
            "inventory":{"melee":null,"consumables":null},
            "hostiles":null,"allies":null,"loot":null,"obstacles":null}"#;
        match Command::from_json(json).unwrap() {
            Command::Snapshot(snapshot) => {
                assert!(snapshot.hostiles.is_empty());
                assert!(snapshot.allies.is_empty());
                assert!(snapshot.loot.is_empty());
                assert!(snapshot.obstacles.is_empty());
                assert!(snapshot.inventory.consumables.is_empty());
            }
            other => panic!("expected snapshot, got {other:?}"),
        }

        let json = r#"{"cmd":"snapshot","map_size":12,
            "self":{"position":{"x":3,"y":4},"health":80},"inventory":null}"#;
        assert!(Command::from_json(json).is_ok());
    }

    #[test]
    fn test_reset_reason_defaults_to_empty() {
        let cmd = Command::from_json(r#"{"cmd":"reset"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Reset {
                reason: String::new()
            }
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Command::from_json(r#"{"cmd":"teleport"}"#).is_err());
    }

    #[test]
    fn test_serialize_action_response() {
        let resp = Response::Action {
            turn: 5,
            action: Some(Action::Shoot {
                direction: Direction::Up,
            }),
        };
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"action""#));
        assert!(json.contains(r#""action":{"action":"shoot","direction":"u"}"#));
    }

    #[test]
    fn test_idle_turn_omits_action() {
        let json = Response::Action {
            turn: 5,
            action: None,
        }
        .to_json_line();
        assert_eq!(json, "{\"type\":\"action\",\"turn\":5}\n");
    }
}
