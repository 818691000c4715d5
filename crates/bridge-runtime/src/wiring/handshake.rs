//! Reactions to handshake messages on either side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bridge_bus::{GuestBus, HostBus, MessageBus, SubscriptionToken, Topic};
use bridge_telemetry::log_event;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// What the preview did in response to host requests.
#[derive(Debug, Default)]
pub struct PreviewActivity {
    reloads: AtomicU64,
    navigations: Mutex<Vec<String>>,
}

impl PreviewActivity {
    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }
}

/// Owns the handshake subscriptions on both buses.
pub struct HandshakeCoordinator {
    tokens: Vec<SubscriptionToken>,
    activity: Arc<PreviewActivity>,
}

impl HandshakeCoordinator {
    pub fn install(host: &Arc<HostBus>, guest: &Arc<GuestBus>) -> Self {
        let activity = Arc::new(PreviewActivity::default());
        let mut tokens = Vec::with_capacity(3);

        // Host answers every check-in by starting in-context editing.
        let weak_host = Arc::downgrade(host);
        tokens.push(host.subscribe(Topic::GuestCheckIn, move |data: &Value| {
            let Some(host) = weak_host.upgrade() else {
                return;
            };
            let delivered = host.start_ice(json!({ "guest": data.clone() }));
            log_event!(info, "host", "Starting in-context editing", delivered = delivered);
        }));

        let reloads = activity.clone();
        tokens.push(guest.subscribe(Topic::GuestReloadRequest, move |_: &Value| {
            let total = reloads.reloads.fetch_add(1, Ordering::Relaxed) + 1;
            log_event!(info, "preview", "Reload requested", reloads = total);
        }));

        let navigations = activity.clone();
        tokens.push(guest.subscribe(Topic::GuestNavRequest, move |data: &Value| {
            match data.get("url").and_then(Value::as_str) {
                Some(url) => {
                    log_event!(info, "preview", "Navigation requested", url = url);
                    navigations.navigations.lock().push(url.to_string());
                }
                None => log_event!(warn, "preview", "Navigation request without url"),
            }
        }));

        Self { tokens, activity }
    }

    pub fn activity(&self) -> &Arc<PreviewActivity> {
        &self.activity
    }

    /// Remove every handshake subscription. Returns how many were removed.
    pub fn uninstall(&self) -> usize {
        self.tokens.iter().filter(|t| t.unsubscribe()).count()
    }
}
