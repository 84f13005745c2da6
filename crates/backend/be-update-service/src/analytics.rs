use posthog_rs::Event;

fn capture_async(event: Event) {
    tokio::spawn(async move {
        if let Err(e) = posthog_rs::capture(event).await {
            tracing::error!("Failed to capture posthog event: {}", e);
        }
    });
}

pub fn track_update_check(
    channel: &str,
    platform: &str,
    current_version: &str,
    update_available: bool,
    latest_version: Option<&str>,
) {
    let mut event = Event::new_anon("update_check");
    event.insert_prop("channel", channel).ok();
    event.insert_prop("platform", platform).ok();
    event.insert_prop("current_version", current_version).ok();
    event.insert_prop("update_available", update_available).ok();
    if let Some(v) = latest_version {
        event.insert_prop("latest_version", v).ok();
    }
    capture_async(event);
}

pub fn track_release_published(channel: &str, version: &str, mandatory: bool, latest_advanced: bool) {
    let mut event = Event::new_anon("release_published");
    event.insert_prop("channel", channel).ok();
    event.insert_prop("version", version).ok();
    event.insert_prop("mandatory", mandatory).ok();
    event.insert_prop("latest_advanced", latest_advanced).ok();
    capture_async(event);
}

pub fn track_publish_rejected(error_kind: &str, field: Option<&str>) {
    let mut event = Event::new_anon("publish_rejected");
    event.insert_prop("error_kind", error_kind).ok();
    if let Some(f) = field {
        event.insert_prop("field", f).ok();
    }
    capture_async(event);
}
