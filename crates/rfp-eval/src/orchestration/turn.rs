use strum::IntoEnumIterator;

use crate::models::agent_role::AgentRole;

/// Where the group chat is in its control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Nothing has been said since creation or the last reset
    #[default]
    Idle,
    AwaitingUserInput,
    SelectingAgent,
    AgentResponding,
    CheckingTermination,
}

/// The set of roles that have taken a turn, one bit per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpokenSet(u8);

impl SpokenSet {
    const ALL: u8 = (1 << AgentRole::COUNT) - 1;

    pub fn new() -> Self {
        Self::default()
    }

    fn bit(role: AgentRole) -> u8 {
        1 << role.index()
    }

    pub fn insert(&mut self, role: AgentRole) {
        self.0 |= Self::bit(role);
    }

    pub fn contains(&self, role: AgentRole) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Every role has spoken at least once
    pub fn is_complete(&self) -> bool {
        self.0 == Self::ALL
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// First role in evaluation order that has not spoken yet
    pub fn next_unvisited(&self) -> Option<AgentRole> {
        AgentRole::iter().find(|role| !self.contains(*role))
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentRole> + '_ {
        AgentRole::iter().filter(|role| self.contains(*role))
    }
}

impl FromIterator<AgentRole> for SpokenSet {
    fn from_iter<I: IntoIterator<Item = AgentRole>>(iter: I) -> Self {
        let mut set = SpokenSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

/// Turn bookkeeping of a group chat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnState {
    /// Roles that spoke since the last reset
    pub spoken: SpokenSet,
    /// Agent turns in the current invocation
    pub turns_taken: usize,
    pub last_speaker: Option<AgentRole>,
}

impl TurnState {
    pub fn record(&mut self, role: AgentRole) {
        self.spoken.insert(role);
        self.turns_taken += 1;
        self.last_speaker = Some(role);
    }

    /// The initial evaluation is still running
    pub fn in_sequence(&self) -> bool {
        !self.spoken.is_complete()
    }
}
