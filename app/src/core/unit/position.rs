use std::fmt::Display;

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

/// Opening of a window covering in percent. 0 is fully closed, 100 fully open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsRef, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Position(u8);

impl Position {
    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Position {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Position::new)
            .ok_or(value)
    }
}

impl From<Position> for u8 {
    fn from(value: Position) -> Self {
        value.0
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} %", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_range() {
        assert_eq!(Position::try_from(0i64), Ok(Position(0)));
        assert_eq!(Position::try_from(100i64), Ok(Position(100)));
        assert_eq!(Position::try_from(42i64).map(|p| p.value()), Ok(42));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Position::try_from(101i64), Err(101));
        assert_eq!(Position::try_from(-1i64), Err(-1));
        assert_eq!(Position::new(255), None);
    }

    #[test]
    fn serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&Position(100)).unwrap(), "100");
        assert!(serde_json::from_str::<Position>("150").is_err());
    }
}
