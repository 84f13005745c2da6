use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Platform key used in release asset maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Win,
    Mac,
    Linux,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Win, Platform::Mac, Platform::Linux];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Win => "win",
            Platform::Mac => "mac",
            Platform::Linux => "linux",
        }
    }

    /// The platform this binary was compiled for, if it is one we ship.
    pub fn current() -> Option<Platform> {
        if cfg!(target_os = "windows") {
            Some(Platform::Win)
        } else if cfg!(target_os = "macos") {
            Some(Platform::Mac)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    /// Guess the platform of an installer from its file name.
    pub fn from_asset_name(name: &str) -> Option<Platform> {
        let lower = name.to_lowercase();
        if lower.ends_with(".exe") || lower.ends_with(".msi") {
            Some(Platform::Win)
        } else if lower.ends_with(".dmg") || lower.ends_with(".pkg") {
            Some(Platform::Mac)
        } else if lower.ends_with(".appimage") || lower.ends_with(".deb") || lower.ends_with(".rpm")
        {
            Some(Platform::Linux)
        } else {
            Platform::ALL
                .into_iter()
                .find(|platform| lower.contains(&format!("-{}", platform.as_str())))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}', expected 'win', 'mac' or 'linux'")]
pub struct ParsePlatformError(pub String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Desktop runtimes report these under several names; normalize them here.
        match s.to_lowercase().as_str() {
            "win" | "windows" | "win32" => Ok(Platform::Win),
            "mac" | "macos" | "darwin" | "osx" => Ok(Platform::Mac),
            "linux" => Ok(Platform::Linux),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_aliases() {
        assert_eq!("darwin".parse::<Platform>(), Ok(Platform::Mac));
        assert_eq!("win32".parse::<Platform>(), Ok(Platform::Win));
        assert_eq!("Windows".parse::<Platform>(), Ok(Platform::Win));
        assert_eq!("linux".parse::<Platform>(), Ok(Platform::Linux));
        assert!("android".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_from_asset_name() {
        assert_eq!(
            Platform::from_asset_name("Ledger-1.0.0-win.exe"),
            Some(Platform::Win)
        );
        assert_eq!(
            Platform::from_asset_name("Ledger-1.0.0.AppImage"),
            Some(Platform::Linux)
        );
        assert_eq!(
            Platform::from_asset_name("Ledger-1.0.0-mac.zip"),
            Some(Platform::Mac)
        );
        assert_eq!(Platform::from_asset_name("checksums.txt"), None);
    }
}
