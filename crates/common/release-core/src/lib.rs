//! Release channels, release records and the version ordering used to decide
//! whether a client is behind its channel.
//!
//! Shared by the update server (`be-update-service`) and the desktop updater
//! (`ledger-updater`) so both sides agree on what "newer" means.

mod channel;
mod decision;
mod document;
mod platform;
mod release;
mod version;

pub use channel::{Channel, ChannelSelector, ParseChannelError};
pub use decision::{AvailableUpdate, UpdateDecision};
pub use document::{DocumentError, LegacyAsset, LegacyRelease, ReleaseDocument};
pub use platform::{ParsePlatformError, Platform};
pub use release::ReleaseRecord;
pub use version::{PreRelease, ReleaseVersion, is_newer};
