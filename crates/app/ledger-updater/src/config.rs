use std::time::Duration;

use release_core::Platform;

use crate::PromptPolicy;

const INITIAL_DELAY: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct UpdateClientConfig {
    /// Version of the running app.
    pub current_version: String,
    /// Platform whose download URL is offered. `None` still reports updates,
    /// just without a URL.
    pub platform: Option<Platform>,
    /// Grace period before the first check so startup is not slowed down.
    pub initial_delay: Duration,
    /// `None` disables periodic checks after the first one.
    pub poll_interval: Option<Duration>,
    pub request_timeout: Duration,
    pub prompt_policy: PromptPolicy,
}

impl UpdateClientConfig {
    pub fn new(current_version: impl Into<String>) -> Self {
        Self {
            current_version: current_version.into(),
            platform: Platform::current(),
            initial_delay: INITIAL_DELAY,
            poll_interval: Some(POLL_INTERVAL),
            request_timeout: REQUEST_TIMEOUT,
            prompt_policy: PromptPolicy::default(),
        }
    }

    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_prompt_policy(mut self, policy: PromptPolicy) -> Self {
        self.prompt_policy = policy;
        self
    }
}
