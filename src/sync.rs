//! Guest-to-account cart sync.
//!
//! When a session becomes authenticated, the guest lines are pushed to the
//! server cart as one batch and the guest copy is dropped. A backend that has
//! not finished provisioning the customer profile answers with a recognisable
//! message; that case is retried with exponential backoff. Anything else is
//! reported to the user and the guest cart is left untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::api::{ApiError, ServerCart, ServerCartView, SyncItem};
use crate::guest_cart::GuestCartStore;
use crate::notify::{Notice, Notifier};

pub const DEFAULT_RETRY_MARKER: &str = "profile not found";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

const SYNC_FAILED_MESSAGE: &str = "We couldn't move your cart to your account. Your items are still saved.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Case-insensitive fragment of the backend message that marks a profile
    /// still being provisioned.
    pub retry_marker: String,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            retry_marker: DEFAULT_RETRY_MARKER.to_string(),
        }
    }
}

impl SyncPolicy {
    /// `base_delay * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn is_retryable(&self, err: &ApiError) -> bool {
        let marker = self.retry_marker.to_lowercase();
        err.backend_message().is_some_and(|m| m.to_lowercase().contains(&marker))
    }
}

/// Read-only view of the current authentication state.
pub trait SessionProbe: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn profile_id(&self) -> Option<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotAuthenticated,
    AlreadySynced,
    InFlight,
    EmptyCart,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Synced { lines: usize, attempts: u32, refreshed: Option<ServerCartView> },
    Failed { attempts: u32, error: ApiError },
    /// The session ended or changed hands while waiting to retry.
    Abandoned { attempts: u32 },
}

struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
        Some(Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

fn active_profile(session: &dyn SessionProbe) -> Option<String> {
    if !session.is_authenticated() { return None; }
    session.profile_id()
}

pub struct CartSync {
    guest: Arc<GuestCartStore>,
    server: Arc<dyn ServerCart>,
    notifier: Arc<dyn Notifier>,
    policy: SyncPolicy,
    in_flight: AtomicBool,
    synced_profile: Mutex<Option<String>>,
}

impl CartSync {
    pub fn new(guest: Arc<GuestCartStore>, server: Arc<dyn ServerCart>, notifier: Arc<dyn Notifier>, policy: SyncPolicy) -> Self {
        Self { guest, server, notifier, policy, in_flight: AtomicBool::new(false), synced_profile: Mutex::new(None) }
    }

    pub fn policy(&self) -> &SyncPolicy { &self.policy }
    pub fn is_in_flight(&self) -> bool { self.in_flight.load(Ordering::Acquire) }

    /// Call on every session change; runs at most once per signed-in profile.
    #[instrument(skip_all)]
    pub async fn run(&self, session: &dyn SessionProbe) -> SyncOutcome {
        let Some(profile) = active_profile(session) else {
            self.set_synced(None);
            return SyncOutcome::Skipped(SkipReason::NotAuthenticated);
        };
        if self.synced_for(&profile) { return SyncOutcome::Skipped(SkipReason::AlreadySynced); }
        let Some(_flight) = FlightGuard::acquire(&self.in_flight) else {
            return SyncOutcome::Skipped(SkipReason::InFlight);
        };

        let items: Vec<SyncItem> = self.guest.items().iter().map(SyncItem::from).collect();
        if items.is_empty() {
            self.set_synced(Some(profile));
            return SyncOutcome::Skipped(SkipReason::EmptyCart);
        }

        let mut attempt: u32 = 0;
        loop {
            match self.server.sync_items(&items).await {
                Ok(_) => break,
                Err(e) if self.policy.is_retryable(&e) && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(profile = %profile, attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %e,
                        "profile not ready, retrying cart sync");
                    sleep(delay).await;
                    attempt += 1;
                    if active_profile(session).as_deref() != Some(profile.as_str()) {
                        info!(profile = %profile, attempt, "session changed, abandoning cart sync");
                        return SyncOutcome::Abandoned { attempts: attempt };
                    }
                }
                Err(e) => {
                    error!(profile = %profile, attempts = attempt + 1, error = %e, "cart sync failed");
                    self.notifier.notify(Notice::error(SYNC_FAILED_MESSAGE));
                    return SyncOutcome::Failed { attempts: attempt + 1, error: e };
                }
            }
        }

        if let Err(e) = self.guest.clear() {
            warn!(error = %e, "cart synced but guest copy could not be cleared");
        }
        self.set_synced(Some(profile));
        info!(lines = items.len(), attempts = attempt + 1, "guest cart synced");

        let refreshed = match self.server.fetch().await {
            Ok(cart) => Some(cart),
            Err(e) => {
                warn!(error = %e, "failed to refresh server cart after sync");
                None
            }
        };
        SyncOutcome::Synced { lines: items.len(), attempts: attempt + 1, refreshed }
    }

    fn synced_for(&self, profile: &str) -> bool {
        self.synced_profile.lock().map(|p| p.as_deref() == Some(profile)).unwrap_or(false)
    }

    fn set_synced(&self, profile: Option<String>) {
        if let Ok(mut slot) = self.synced_profile.lock() { *slot = profile; }
    }
}
