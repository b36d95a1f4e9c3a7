//! Headless session loop.
//!
//! Reads commands line by line, hands snapshots to the [`Agent`] and writes
//! one response per line. A bad line never ends the session: it is answered
//! with an `error` response and the loop carries on.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use arena_core::agent::{Agent, TurnInput};
use arena_core::config::AgentConfig;
use arena_core::oracle::PathOracle;
use tracing::{debug, info, warn};

use crate::error::{Result, RunnerError};
use crate::protocol::{Command, Response};

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Snapshots handled.
    pub turns: u64,
    /// Snapshots that produced an action.
    pub actions: u64,
    /// Lines that could not be decoded.
    pub malformed_lines: u64,
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop after writing the response.
    Quit,
}

/// Headless runner driving one [`Agent`].
pub struct HeadlessRunner<O: PathOracle> {
    agent: Agent<O>,
    stats: SessionStats,
}

impl<O: PathOracle> HeadlessRunner<O> {
    /// Create a runner with a fresh agent.
    pub fn new(config: AgentConfig, oracle: O) -> Self {
        Self {
            agent: Agent::new(config, oracle),
            stats: SessionStats::default(),
        }
    }

    /// The agent being driven.
    pub fn agent(&self) -> &Agent<O> {
        &self.agent
    }

    /// Counters so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Handle one decoded command.
    pub fn handle(&mut self, command: Command) -> (Response, Flow) {
        debug!(cmd = command.name(), "Handling command");
        match command {
            Command::Snapshot(snapshot) => {
                let turn = snapshot.turn;
                let action = self.agent.on_turn(&TurnInput::Snapshot(snapshot));
                self.stats.turns += 1;
                if action.is_some() {
                    self.stats.actions += 1;
                }
                debug!(turn, action = ?action, "Answered snapshot");
                (Response::Action { turn, action }, Flow::Continue)
            }
            Command::Reset { reason } => {
                self.agent.on_turn(&TurnInput::Corrupted { reason });
                (
                    Response::Reset {
                        rebuilds: self.agent.rebuilds(),
                    },
                    Flow::Continue,
                )
            }
            Command::Hash => (
                Response::StateHash {
                    hash: self.agent.state_hash(),
                },
                Flow::Continue,
            ),
            Command::Quit => (
                Response::Bye {
                    turns: self.stats.turns,
                    failed_turns: self.agent.failed_turns(),
                },
                Flow::Quit,
            ),
        }
    }

    /// Decode and handle one raw line.
    ///
    /// Blank lines produce no response.
    pub fn handle_line(&mut self, line: &str, line_number: usize) -> Option<(Response, Flow)> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match Command::from_json(line) {
            Ok(command) => Some(self.handle(command)),
            Err(source) => {
                self.stats.malformed_lines += 1;
                let err = RunnerError::Json {
                    line: line_number,
                    source,
                };
                warn!(error = %err, "Skipping malformed line");
                Some((Response::error(err.to_string(), None), Flow::Continue))
            }
        }
    }

    /// Run the session loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<SessionStats> {
        write_response(&mut output, &Response::ready())?;
        info!("Session started");

        for (index, line) in input.lines().enumerate() {
            let line = line.map_err(|e| RunnerError::io("<input>", e))?;
            let Some((response, flow)) = self.handle_line(&line, index + 1) else {
                continue;
            };
            write_response(&mut output, &response)?;
            if flow == Flow::Quit {
                break;
            }
        }

        info!(
            turns = self.stats.turns,
            actions = self.stats.actions,
            failed_turns = self.agent.failed_turns(),
            rebuilds = self.agent.rebuilds(),
            malformed_lines = self.stats.malformed_lines,
            "Session finished"
        );
        Ok(self.stats)
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> Result<()> {
    output
        .write_all(response.to_json_line().as_bytes())
        .and_then(|()| output.flush())
        .map_err(|e| RunnerError::io("<output>", e))
}

/// Result of replaying a recorded session file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// One response per non-blank line, in order.
    pub responses: Vec<Response>,
    /// Hash of the decision state after the last line.
    pub state_hash: u64,
    /// Counters for the run.
    pub stats: SessionStats,
}

/// Replay a JSON-lines session file through a fresh agent.
pub fn replay_file<O: PathOracle>(
    config: &AgentConfig,
    oracle: O,
    path: &Path,
) -> Result<ReplayOutcome> {
    let label = path.display().to_string();
    let file = File::open(path).map_err(|e| RunnerError::io(label.clone(), e))?;
    let mut runner = HeadlessRunner::new(config.clone(), oracle);
    let mut responses = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| RunnerError::io(label.clone(), e))?;
        let Some((response, flow)) = runner.handle_line(&line, index + 1) else {
            continue;
        };
        responses.push(response);
        if flow == Flow::Quit {
            break;
        }
    }

    info!(path = %label, turns = runner.stats.turns, "Replay finished");
    Ok(ReplayOutcome {
        responses,
        state_hash: runner.agent.state_hash(),
        stats: runner.stats,
    })
}

/// Replay `path` `runs` times and check every run ends in the same state with
/// the same responses.
pub fn verify_replay<O, F>(
    config: &AgentConfig,
    make_oracle: F,
    path: &Path,
    runs: usize,
) -> Result<ReplayOutcome>
where
    O: PathOracle,
    F: Fn() -> O,
{
    let first = replay_file(config, make_oracle(), path)?;
    for run in 1..runs {
        let again = replay_file(config, make_oracle(), path)?;
        if again != first {
            warn!(run, "Replay diverged");
            return Err(RunnerError::Diverged {
                path: path.to_path_buf(),
                first: first.state_hash,
                second: again.state_hash,
            });
        }
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::GridOracle;
    use arena_core::action::{Action, Path as StepPath};
    use arena_test_utils::fixtures::SnapshotBuilder;
    use std::io::Cursor;

    fn snapshot_line(builder: SnapshotBuilder) -> String {
        let json = serde_json::to_string(&Command::Snapshot(Box::new(builder.build()))).unwrap();
        json + "\n"
    }

    fn responses(output: &[u8]) -> Vec<Response> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_session_answers_every_snapshot() {
        let mut input = snapshot_line(SnapshotBuilder::new(20).turn(1).at(10, 10).loot(
            "AXE",
            arena_core::item::ItemKind::Weapon(arena_core::item::WeaponClass::Melee),
            10,
            12,
        ));
        input.push_str("{\"cmd\":\"hash\"}\n{\"cmd\":\"quit\"}\n");

        let mut output = Vec::new();
        let mut runner = HeadlessRunner::new(AgentConfig::default(), GridOracle::new());
        let stats = runner.run(Cursor::new(input), &mut output).unwrap();

        let responses = responses(&output);
        assert_eq!(responses[0], Response::ready());
        assert_eq!(
            responses[1],
            Response::Action {
                turn: 1,
                action: Some(Action::Move {
                    path: StepPath::parse("uu").unwrap()
                })
            }
        );
        assert!(matches!(responses[2], Response::StateHash { .. }));
        assert_eq!(
            responses[3],
            Response::Bye {
                turns: 1,
                failed_turns: 0
            }
        );
        assert_eq!(stats.turns, 1);
        assert_eq!(stats.actions, 1);
    }

    #[test]
    fn test_malformed_line_does_not_end_session() {
        let input = "not json\n\n{\"cmd\":\"reset\",\"reason\":\"desync\"}\n";
        let mut output = Vec::new();
        let mut runner = HeadlessRunner::new(AgentConfig::default(), GridOracle::new());
        let stats = runner.run(Cursor::new(input), &mut output).unwrap();

        let responses = responses(&output);
        assert_eq!(responses.len(), 3);
        match &responses[1] {
            Response::Error { message, .. } => assert!(message.contains("line 1")),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(responses[2], Response::Reset { rebuilds: 1 });
        assert_eq!(stats.malformed_lines, 1);
    }

    #[test]
    fn test_null_collections_are_answered_not_rejected() {
        let line = r#"{"cmd":"snapshot","turn":3,"map_size":10,
            "self":{"position":{"x":5,"y":5},"health":100},
            "hostiles":null,"allies":null,"loot":null,"obstacles":null,"inventory":null}"#
            .replace('\n', "");
        let mut runner = HeadlessRunner::new(AgentConfig::default(), GridOracle::new());
        let (response, flow) = runner.handle_line(&line, 1).unwrap();
        assert!(matches!(response, Response::Action { turn: 3, .. }));
        assert_eq!(flow, Flow::Continue);
        assert_eq!(runner.stats().malformed_lines, 0);
        assert_eq!(runner.agent().failed_turns(), 0);
    }

    #[test]
    fn test_replay_is_reproducible() {
        use arena_core::item::{ItemKind, WeaponClass};
        use arena_test_utils::fixtures::weapon;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut session = String::new();
        for turn in 0..6 {
            session.push_str(&snapshot_line(
                SnapshotBuilder::new(16)
                    .turn(turn)
                    .at(8, 8)
                    .equip(weapon("CROSSBOW", WeaponClass::Gun, 20, 5, 3))
                    .chest("CHEST", 3, 3)
                    .loot("ELIXIR", ItemKind::Consumable, 12, 8)
                    .hostile("p2", 8, 13 - i32::try_from(turn).unwrap(), 100),
            ));
        }
        session.push_str("{\"cmd\":\"hash\"}\n{\"cmd\":\"quit\"}\n{\"cmd\":\"hash\"}\n");
        std::fs::write(&path, session).unwrap();

        let outcome = verify_replay(&AgentConfig::default(), GridOracle::new, &path, 3).unwrap();
        assert_eq!(outcome.stats.turns, 6);
        // Lines after quit are not read.
        assert_eq!(outcome.responses.len(), 8);
        assert_eq!(
            outcome.responses[6],
            Response::StateHash {
                hash: outcome.state_hash
            }
        );
    }

    #[test]
    fn test_replay_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = replay_file(
            &AgentConfig::default(),
            GridOracle::new(),
            &dir.path().join("absent.jsonl"),
        )
        .unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }

    #[test]
    fn test_invalid_snapshot_yields_no_action() {
        let mut snapshot = SnapshotBuilder::new(10).turn(4).build();
        snapshot.me.position.x = 50;
        let mut runner = HeadlessRunner::new(AgentConfig::default(), GridOracle::new());
        let (response, flow) = runner.handle(Command::Snapshot(Box::new(snapshot)));
        assert_eq!(
            response,
            Response::Action {
                turn: 4,
                action: None
            }
        );
        assert_eq!(flow, Flow::Continue);
        assert_eq!(runner.agent().failed_turns(), 1);
    }
}
