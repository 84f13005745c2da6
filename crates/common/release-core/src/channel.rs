use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Independent release track with its own latest version.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable,
    Beta,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Stable, Channel::Beta];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Beta => "beta",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel '{0}', expected 'stable' or 'beta'")]
pub struct ParseChannelError(pub String);

impl FromStr for Channel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Channel::Stable),
            "beta" => Ok(Channel::Beta),
            _ => Err(ParseChannelError(s.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either one channel or both merged, as accepted by release listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector {
    All,
    Only(Channel),
}

impl ChannelSelector {
    pub fn includes(&self, channel: Channel) -> bool {
        match self {
            ChannelSelector::All => true,
            ChannelSelector::Only(selected) => *selected == channel,
        }
    }
}

impl From<Channel> for ChannelSelector {
    fn from(channel: Channel) -> Self {
        ChannelSelector::Only(channel)
    }
}

impl FromStr for ChannelSelector {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(ChannelSelector::All);
        }
        s.parse().map(ChannelSelector::Only)
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSelector::All => f.write_str("all"),
            ChannelSelector::Only(channel) => channel.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parsing_is_exact() {
        assert_eq!("stable".parse::<Channel>(), Ok(Channel::Stable));
        assert_eq!("beta".parse::<Channel>(), Ok(Channel::Beta));
        assert!("Stable".parse::<Channel>().is_err());
        assert!("nightly".parse::<Channel>().is_err());
        assert!("all".parse::<Channel>().is_err());
    }

    #[test]
    fn test_selector_accepts_all() {
        assert_eq!("all".parse::<ChannelSelector>(), Ok(ChannelSelector::All));
        assert_eq!(
            "beta".parse::<ChannelSelector>(),
            Ok(ChannelSelector::Only(Channel::Beta))
        );
        assert!(ChannelSelector::All.includes(Channel::Stable));
        assert!(!ChannelSelector::Only(Channel::Beta).includes(Channel::Stable));
    }

    #[test]
    fn test_channel_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Channel::Beta).unwrap(), "\"beta\"");
        let parsed: Channel = serde_json::from_str("\"stable\"").unwrap();
        assert_eq!(parsed, Channel::Stable);
    }
}
