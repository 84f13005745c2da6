use release_core::AvailableUpdate;

/// How the app may treat updates flagged as mandatory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptPolicy {
    /// Offer "download later" for mandatory updates. The prompt stays
    /// non-dismissible either way.
    pub allow_deferring_mandatory: bool,
}

/// What the UI should show for an available update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrompt {
    pub update: AvailableUpdate,
    /// Whether close/cancel affordances are enabled.
    pub dismissible: bool,
    /// Whether a "download later" action is offered.
    pub can_defer: bool,
}

impl UpdatePrompt {
    pub fn new(update: AvailableUpdate, policy: PromptPolicy) -> Self {
        let mandatory = update.mandatory;
        Self {
            update,
            dismissible: !mandatory,
            can_defer: !mandatory || policy.allow_deferring_mandatory,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.update.mandatory
    }

    /// The URL to hand to the download flow, if this platform has one.
    pub fn download_url(&self) -> Option<&str> {
        Some(self.update.download_url.as_str()).filter(|url| !url.is_empty())
    }
}
