//! Session and API token lookup.
//!
//! Login, registration and password handling live outside this crate.
//! They hand identities to a [`SessionStore`]; the gate middleware only
//! asks the store who a cookie or bearer token belongs to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::config::SessionSettings;

/// The user behind an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: u64,
    pub name: String,
    pub email_verified: bool,
}

/// Lookup of authenticated identities.
pub trait SessionStore: Send + Sync {
    /// Identity for a live cookie session.
    fn session(&self, id: &str) -> Option<Identity>;

    /// Identity for an API token.
    fn token(&self, token: &str) -> Option<Identity>;

    /// Extend a cookie session's idle lifetime. Returns false when the
    /// session no longer exists.
    fn touch(&self, id: &str) -> bool;
}

/// Longest idle lifetime a store accepts; longer lifetimes are clamped.
pub const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct SessionRecord {
    identity: Identity,
    /// `None` when the deadline is past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl SessionRecord {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// In-process session store with idle expiry.
///
/// Expired records are swept on a lottery: one `start` in every
/// `out_of / chances` clears every dead session.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
    tokens: DashMap<String, Identity>,
    lifetime: Duration,
    sweep_every: u64,
    starts: AtomicU64,
}

impl MemorySessionStore {
    /// Store without automatic sweeping.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            tokens: DashMap::new(),
            lifetime: lifetime.min(MAX_LIFETIME),
            sweep_every: 0,
            starts: AtomicU64::new(0),
        }
    }

    /// Sweep on `chances` out of every `out_of` session starts. Zero
    /// chances disables sweeping.
    pub fn with_lottery(mut self, chances: u64, out_of: u64) -> Self {
        self.sweep_every = match chances {
            0 => 0,
            c => (out_of / c).max(1),
        };
        self
    }

    /// Store using the configured session lifetime (minutes) and lottery.
    pub fn from_settings(settings: &SessionSettings) -> Self {
        let [chances, out_of] = settings.lottery;
        Self::new(Duration::from_secs(settings.lifetime.saturating_mul(60))).with_lottery(chances, out_of)
    }

    fn deadline(&self, now: Instant) -> Option<Instant> {
        now.checked_add(self.lifetime)
    }

    /// Start a session and return its id.
    pub fn start(&self, identity: Identity) -> String {
        if self.sweep_every > 0 {
            let n = self.starts.fetch_add(1, Ordering::Relaxed) + 1;
            if n % self.sweep_every == 0 {
                self.sweep();
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            id.clone(),
            SessionRecord {
                identity,
                expires_at: self.deadline(Instant::now()),
            },
        );
        id
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.sessions.retain(|_, record| {
            let live = record.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        if removed > 0 {
            tracing::debug!(removed, "Expired sessions swept");
        }
        removed
    }

    /// Issue an API token for `identity`.
    pub fn issue_token(&self, identity: Identity) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), identity);
        token
    }

    pub fn end(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn revoke_token(&self, token: &str) {
        self.tokens.remove(token);
    }

    pub fn active_sessions(&self) -> usize {
        let now = Instant::now();
        self.sessions.iter().filter(|r| r.is_live(now)).count()
    }

    /// Records held, live or not.
    pub fn stored_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionStore for MemorySessionStore {
    fn session(&self, id: &str) -> Option<Identity> {
        let now = Instant::now();
        let identity = {
            let record = self.sessions.get(id)?;
            record.is_live(now).then(|| record.identity.clone())
        };
        if identity.is_none() {
            self.sessions.remove(id);
            tracing::debug!("Expired session discarded");
        }
        identity
    }

    fn token(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).map(|identity| identity.clone())
    }

    fn touch(&self, id: &str) -> bool {
        let now = Instant::now();
        let live = match self.sessions.get_mut(id) {
            Some(mut record) if record.is_live(now) => {
                record.expires_at = self.deadline(now);
                true
            }
            Some(_) => false,
            None => return false,
        };
        if !live {
            self.sessions.remove(id);
        }
        live
    }
}
