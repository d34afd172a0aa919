//! Time-limited holder for a decrypted secret.
//!
//! `EphemeralSecret` keeps a revealed value for at most `ttl`. A timer task
//! drops the value when the TTL elapses; `revoke` (or dropping the holder)
//! drops it immediately and cancels the timer, so no timer is left running
//! after a revoke.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Slot = Arc<Mutex<Option<SecretString>>>;

/// A secret that is wiped when its TTL elapses or when revoked, whichever first.
///
/// Must be created inside a tokio runtime.
pub struct EphemeralSecret {
    slot: Slot,
    /// Stops the expiry timer.
    timer: CancellationToken,
    /// Fires once the secret is gone, by either path.
    cleared: CancellationToken,
    expires_at: Instant,
}

impl EphemeralSecret {
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        let slot: Slot = Arc::new(Mutex::new(Some(secret)));
        let timer = CancellationToken::new();
        let cleared = CancellationToken::new();
        let expires_at = Instant::now() + ttl;

        let task_slot = Arc::clone(&slot);
        let task_timer = timer.clone();
        let task_cleared = cleared.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(expires_at) => {
                    wipe(&task_slot);
                    task_cleared.cancel();
                    tracing::debug!("ephemeral secret expired");
                }
                _ = task_timer.cancelled() => {}
            }
        });

        Self {
            slot,
            timer,
            cleared,
            expires_at,
        }
    }

    /// Run `f` over the secret if it is still held.
    pub fn expose<R>(&self, f: impl FnOnce(&str) -> R) -> Option<R> {
        let guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|s| f(s.expose_secret()))
    }

    pub fn is_live(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Time left before expiry; zero once expired or revoked.
    pub fn remaining(&self) -> Duration {
        if !self.is_live() {
            return Duration::ZERO;
        }
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Drop the secret now and stop the timer.
    pub fn revoke(&self) {
        self.timer.cancel();
        wipe(&self.slot);
        self.cleared.cancel();
    }

    /// Resolves once the secret has been dropped by expiry or revocation.
    pub async fn expired(&self) {
        self.cleared.cancelled().await;
    }
}

impl Drop for EphemeralSecret {
    fn drop(&mut self) {
        self.revoke();
    }
}

fn wipe(slot: &Slot) {
    // SecretString zeroizes its buffer on drop.
    slot.lock().unwrap_or_else(|e| e.into_inner()).take();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_secret_available_before_ttl() {
        let secret = EphemeralSecret::new(SecretString::from("hunter2"), Duration::from_secs(30));
        assert_eq!(secret.expose(|s| s.to_string()).as_deref(), Some("hunter2"));
        assert!(secret.is_live());
        assert_eq!(secret.remaining(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_secret_wiped_after_ttl() {
        let secret = EphemeralSecret::new(SecretString::from("hunter2"), Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(31)).await;
        secret.expired().await;

        assert!(!secret.is_live());
        assert!(secret.expose(|s| s.len()).is_none());
        assert_eq!(secret.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoke_wipes_immediately() {
        let secret = EphemeralSecret::new(SecretString::from("hunter2"), Duration::from_secs(30));
        secret.revoke();

        assert!(!secret.is_live());
        // Resolves without advancing time.
        secret.expired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoke_stops_timer() {
        let secret = EphemeralSecret::new(SecretString::from("hunter2"), Duration::from_secs(5));
        let timer = secret.timer.clone();
        secret.revoke();
        assert!(timer.is_cancelled());

        // Timer firing after revoke must be a no-op.
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!secret.is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let secret = EphemeralSecret::new(SecretString::from("hunter2"), Duration::from_secs(5));
        let timer = secret.timer.clone();
        let cleared = secret.cleared.clone();
        drop(secret);
        assert!(timer.is_cancelled());
        assert!(cleared.is_cancelled());
    }
}
