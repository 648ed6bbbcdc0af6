use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const ALL: &str = "*";
pub const LOCAL: &str = "@";

/// Which keys a query or delete targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelector {
    /// One key, served by its owner.
    Key(String),
    /// Every key on every ring member (`*`).
    All,
    /// Every key stored on this node only (`@`).
    Local,
}

impl KeySelector {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }
}

impl From<&str> for KeySelector {
    fn from(s: &str) -> Self {
        match s {
            ALL => KeySelector::All,
            LOCAL => KeySelector::Local,
            key => KeySelector::Key(key.to_string()),
        }
    }
}

impl FromStr for KeySelector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySelector::Key(key) => f.write_str(key),
            KeySelector::All => f.write_str(ALL),
            KeySelector::Local => f.write_str(LOCAL),
        }
    }
}
