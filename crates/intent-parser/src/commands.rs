//! Robot motion commands understood by the recognizer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of motion commands.
///
/// Declaration order is significant: it is the catalog order, and the
/// classifier breaks score ties in favour of the earlier command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
        Command::Stop,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
            Command::Stop => "stop",
        }
    }

    /// Action code the motion firmware expects for this command.
    pub fn default_code(self) -> u8 {
        match self {
            Command::Forward => 0x01,
            Command::Backward => 0x02,
            Command::Left => 0x03,
            Command::Right => 0x04,
            Command::Stop => 0x05,
        }
    }

    /// Canonical Vietnamese phrasings.
    pub fn default_phrases(self) -> &'static [&'static str] {
        match self {
            Command::Forward => &[
                "tiến lên",
                "đi thẳng",
                "đi về phía trước",
                "chạy lên phía trước",
                "tiến lên phía trước",
            ],
            Command::Backward => &["lùi lại", "đi lùi", "lùi về phía sau", "chạy lùi"],
            Command::Left => &["quay trái", "rẽ trái", "sang trái"],
            Command::Right => &["quay phải", "rẽ phải", "sang phải"],
            Command::Stop => &["dừng lại", "dừng", "đứng yên", "ngừng di chuyển"],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Command::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_codes_are_unique() {
        let codes: HashSet<u8> = Command::ALL.iter().map(|c| c.default_code()).collect();
        assert_eq!(codes.len(), Command::ALL.len());
    }

    #[test]
    fn every_command_has_phrases() {
        for cmd in Command::ALL {
            assert!(!cmd.default_phrases().is_empty(), "{cmd} has no phrases");
        }
    }

    #[test]
    fn ids_round_trip_through_from_str() {
        for cmd in Command::ALL {
            assert_eq!(cmd.id().parse::<Command>(), Ok(cmd));
        }
        assert_eq!(" STOP ".parse::<Command>(), Ok(Command::Stop));
        assert!("jump".parse::<Command>().is_err());
    }

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = Command::ALL;
        sorted.sort();
        assert_eq!(sorted, Command::ALL);
    }
}
