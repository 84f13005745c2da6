//! Update checking for the Ledger desktop app.
//!
//! [`UpdateClient`] follows the channel chosen in the user's settings, polls
//! the update service on a cancellable schedule and publishes its state
//! through a watch channel for the UI.

mod client;
mod config;
mod feed;
mod poller;
mod prompt;

pub use client::{CheckOutcome, CheckState, UpdateClient};
pub use config::UpdateClientConfig;
pub use feed::{FeedError, HttpReleaseFeed, ReleaseFeed};
pub use poller::PollHandle;
pub use prompt::{PromptPolicy, UpdatePrompt};
