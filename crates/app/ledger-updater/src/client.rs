//! Update checking state machine.
//!
//! `Idle -> Checking -> {UpdateFound | UpToDate}`. Checking is best effort:
//! any failure to reach or understand the update server ends in `UpToDate`
//! and is only logged.

use std::sync::Arc;

use anyhow::Result;
use ledger_settings::SettingsWithDiskSync;
use release_core::{Channel, ChannelSelector, ReleaseRecord, UpdateDecision};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::{
    UpdateClientConfig, UpdatePrompt,
    feed::{FeedError, HttpReleaseFeed, ReleaseFeed},
    poller::{PollHandle, spawn_poller},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckState {
    #[default]
    Idle,
    Checking,
    UpdateFound(UpdatePrompt),
    UpToDate,
}

impl CheckState {
    pub fn prompt(&self) -> Option<&UpdatePrompt> {
        match self {
            CheckState::UpdateFound(prompt) => Some(prompt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Completed(CheckState),
    /// Another check was already running; its result will be published.
    Skipped,
}

#[derive(Clone)]
pub struct UpdateClient {
    config: Arc<UpdateClientConfig>,
    feed: Arc<dyn ReleaseFeed>,
    settings: SettingsWithDiskSync,
    state: Arc<watch::Sender<CheckState>>,
    in_flight: Arc<Mutex<()>>,
}

impl UpdateClient {
    pub fn new(
        config: UpdateClientConfig,
        feed: Arc<dyn ReleaseFeed>,
        settings: SettingsWithDiskSync,
    ) -> Self {
        let (state, _) = watch::channel(CheckState::Idle);
        Self {
            config: Arc::new(config),
            feed,
            settings,
            state: Arc::new(state),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Client talking HTTP to the server configured in `settings`.
    pub fn from_settings(config: UpdateClientConfig, settings: SettingsWithDiskSync) -> Result<Self> {
        let server_url = settings.get()?.updates.server_url.clone();
        let feed = HttpReleaseFeed::new(&server_url, config.request_timeout)?;
        Ok(Self::new(config, Arc::new(feed), settings))
    }

    pub fn config(&self) -> &UpdateClientConfig {
        &self.config
    }

    pub fn channel(&self) -> Channel {
        match self.settings.get() {
            Ok(settings) => settings.updates.channel,
            Err(e) => {
                warn!("Could not read channel preference, using stable: {}", e);
                Channel::Stable
            }
        }
    }

    pub fn state(&self) -> CheckState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckState> {
        self.state.subscribe()
    }

    /// Store the running version as the last known one, returning the
    /// version recorded previously.
    pub fn record_running_version(&self) -> Result<Option<String>> {
        let previous = self.settings.get()?.updates.last_known_version.clone();
        if previous.as_deref() != Some(self.config.current_version.as_str()) {
            let current = self.config.current_version.clone();
            self.settings
                .update(|s| s.updates.last_known_version = Some(current))?;
            if let Some(previous) = &previous {
                info!("Running {} (previously {})", self.config.current_version, previous);
            }
        }
        Ok(previous)
    }

    /// Check now unless a check is already running.
    pub async fn check_now(&self) -> CheckOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("Update check already in flight, skipping");
            return CheckOutcome::Skipped;
        };
        CheckOutcome::Completed(self.check_locked().await)
    }

    /// Persist a new channel preference and check against it right away.
    pub async fn set_channel(&self, channel: Channel) -> Result<CheckState> {
        self.settings.update(|s| s.updates.channel = channel)?;
        info!("Update channel set to {}", channel);
        // Wait out a check against the previous channel; it discards its own result.
        let _guard = self.in_flight.lock().await;
        Ok(self.check_locked().await)
    }

    /// Every release of `selector`, newest first. Empty when the server
    /// cannot be reached.
    pub async fn all_releases(&self, selector: ChannelSelector) -> Vec<ReleaseRecord> {
        match tokio::time::timeout(self.config.request_timeout, self.feed.releases(selector)).await
        {
            Ok(Ok(releases)) => releases,
            Ok(Err(e)) => {
                warn!("Could not list releases: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("Listing releases timed out");
                Vec::new()
            }
        }
    }

    /// Start background polling. Dropping the handle stops it.
    pub fn start(&self) -> PollHandle {
        if let Err(e) = self.record_running_version() {
            warn!("Could not record running version: {}", e);
        }
        spawn_poller(
            self.clone(),
            self.config.initial_delay,
            self.config.poll_interval,
        )
    }

    async fn fetch_latest(&self, channel: Channel) -> Result<Option<ReleaseRecord>, FeedError> {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, self.feed.latest(channel))
            .await
            .map_err(|_| FeedError::Timeout(timeout))?
    }

    #[instrument(skip(self), fields(current_version = %self.config.current_version))]
    async fn check_locked(&self) -> CheckState {
        let channel = self.channel();
        self.state.send_replace(CheckState::Checking);

        let next = match self.fetch_latest(channel).await {
            Ok(latest) => match UpdateDecision::evaluate(
                latest.as_ref(),
                &self.config.current_version,
                self.config.platform,
            ) {
                UpdateDecision::UpdateAvailable(update) => {
                    info!("Update {} available on {}", update.version, channel);
                    CheckState::UpdateFound(UpdatePrompt::new(update, self.config.prompt_policy))
                }
                UpdateDecision::NoUpdateAvailable => CheckState::UpToDate,
            },
            Err(e) => {
                warn!("Update check failed, assuming up to date: {}", e);
                CheckState::UpToDate
            }
        };

        if self.channel() != channel {
            debug!("Channel changed during check against {}, discarding result", channel);
            self.state.send_replace(CheckState::Idle);
            return CheckState::Idle;
        }

        self.state.send_replace(next.clone());
        next
    }
}
