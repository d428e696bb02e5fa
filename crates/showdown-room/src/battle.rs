//! Battle metadata: players, format, rules, and the final outcome.
//!
//! Only metadata is tracked. Moves, switches and damage flow past as
//! ordinary log lines.

use std::fmt;

use showdown_protocol::normalize_id;

use crate::User;

/// One of the two player positions in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    /// The `p1` side.
    First,
    /// The `p2` side.
    Second,
}

impl PlayerSlot {
    /// Parses the wire token (`p1` / `p2`).
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "p1" => Some(Self::First),
            "p2" => Some(Self::Second),
            _ => None,
        }
    }

    /// The wire token for this slot.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::First => "p1",
            Self::Second => "p2",
        }
    }

    /// The other slot.
    pub fn opponent(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// How a battle ended. Set once, never overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub winner: User,
    pub winner_slot: PlayerSlot,
    /// `None` if the losing slot was never announced.
    pub loser: Option<User>,
    pub loser_slot: PlayerSlot,
}

/// Battle-specific room state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Battle {
    rules: Vec<String>,
    rated: bool,
    tier: Option<String>,
    players: [Option<User>; 2],
    outcome: Option<Outcome>,
}

impl Battle {
    /// Rule lines in the order they were announced.
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn rated(&self) -> bool {
        self.rated
    }

    /// Normalized format id, e.g. `gen7ou`.
    pub fn tier(&self) -> Option<&str> {
        self.tier.as_deref()
    }

    pub fn player(&self, slot: PlayerSlot) -> Option<&User> {
        self.players[slot.index()].as_ref()
    }

    pub fn ended(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn winner(&self) -> Option<&User> {
        self.outcome.as_ref().map(|o| &o.winner)
    }

    pub fn loser(&self) -> Option<&User> {
        self.outcome.as_ref().and_then(|o| o.loser.as_ref())
    }

    /// Folds one event into the battle state. `room_id` is only used
    /// for logging.
    pub(crate) fn apply<S: AsRef<str>>(&mut self, room_id: &str, kind: &str, params: &[S]) {
        let param = |i: usize| params.get(i).map(AsRef::as_ref);

        match kind {
            "player" => {
                let (Some(token), Some(name)) = (param(0), param(1)) else {
                    return;
                };
                match PlayerSlot::from_wire(token) {
                    Some(slot) if !name.is_empty() => {
                        self.players[slot.index()] = Some(User::new(name));
                    }
                    Some(_) => {}
                    None => {
                        tracing::debug!(room_id, token, "ignoring unknown player slot");
                    }
                }
            }
            "rated" => self.rated = true,
            "tier" => {
                if let Some(tier) = param(0) {
                    self.tier = Some(normalize_id(tier));
                }
            }
            "rule" => {
                if let Some(rule) = param(0) {
                    self.rules.push(rule.to_string());
                }
            }
            "win" => {
                if let Some(name) = param(0) {
                    self.resolve_winner(room_id, name);
                }
            }
            _ => {}
        }
    }

    /// Decides winner and loser by matching `name` against each player's
    /// current display name.
    fn resolve_winner(&mut self, room_id: &str, name: &str) {
        if let Some(outcome) = &self.outcome {
            tracing::debug!(
                room_id,
                winner = %outcome.winner,
                "battle already ended, ignoring repeated win"
            );
            return;
        }

        let winner_slot = [PlayerSlot::First, PlayerSlot::Second]
            .into_iter()
            .find(|slot| {
                self.player(*slot)
                    .is_some_and(|user| user.name_matches(name))
            });

        let Some(winner_slot) = winner_slot else {
            tracing::warn!(
                room_id,
                winner = name,
                p1 = ?self.player(PlayerSlot::First).map(User::name),
                p2 = ?self.player(PlayerSlot::Second).map(User::name),
                "win announced for neither player, outcome unresolved"
            );
            return;
        };

        let loser_slot = winner_slot.opponent();
        let Some(winner) = self.player(winner_slot).cloned() else {
            return;
        };
        self.outcome = Some(Outcome {
            winner,
            winner_slot,
            loser: self.player(loser_slot).cloned(),
            loser_slot,
        });
        tracing::info!(room_id, winner = name, slot = %winner_slot, "battle ended");
    }
}
