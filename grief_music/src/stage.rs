// Stage identity.
//
// The five stages form a closed set, so stage identity is an enum rather
// than a string key: a typo becomes a parse error at the boundary instead of
// a silent lookup miss deep inside a sequencer. Parsing is the only place an
// `UnknownStage` error can originate.
//
// "Flatline" is deliberately not a `Stage`. It has no beat, pause, or chord
// structure and is only meaningful to the heartbeat renderer, which models it
// as `HeartbeatTarget::Flatline` (see waveform.rs).

use crate::error::SynthError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Denial = 0,
    Anger = 1,
    Bargaining = 2,
    Depression = 3,
    Acceptance = 4,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Denial,
        Stage::Anger,
        Stage::Bargaining,
        Stage::Depression,
        Stage::Acceptance,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Denial => "Denial",
            Stage::Anger => "Anger",
            Stage::Bargaining => "Bargaining",
            Stage::Depression => "Depression",
            Stage::Acceptance => "Acceptance",
        }
    }

    /// Lowercase name, used for output file names.
    pub fn slug(self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = SynthError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SynthError::UnknownStage(s.to_string()))
    }
}
