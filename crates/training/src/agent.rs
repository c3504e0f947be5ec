use crate::error::TrainingError;
use std::fmt;
use std::str::FromStr;

/// Learning algorithm a run is configured for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Agent {
    #[default]
    Ppo,
    Fql,
}

impl Agent {
    pub const ALL: [Agent; 2] = [Agent::Ppo, Agent::Fql];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Agent::Ppo => "ppo",
            Agent::Fql => "fql",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Agent {
    type Err = TrainingError;

    /// Case-insensitive: `PPO`, `ppo` and `Ppo` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Agent::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TrainingError::UnknownAgent {
                name: s.to_string(),
                available: Agent::ALL.iter().map(|a| a.name().to_string()).collect(),
            })
    }
}
