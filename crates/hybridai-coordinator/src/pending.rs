//! Registry of outstanding remote calls.
//!
//! Every remote call is registered under a fresh [`Token`] before it is
//! issued. Whichever of `resolve` (result delivered) or `expire` (timeout)
//! reaches the entry first removes it and gets the context back; the other
//! sees [`RegistryError::NotFound`]. That removal is the only thing standing
//! between a token and a second final emission, so it happens under one lock.

use chrono::{DateTime, Utc};
use hybridai_core::{ProcessingStrategy, RegistryError, Request, Token};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// One outstanding remote call and the context needed to finish it
#[derive(Debug)]
pub struct PendingEntry<C> {
    pub token: Token,
    pub request_id: String,
    pub request: Arc<Request>,
    pub created_at: DateTime<Utc>,
    pub strategy: ProcessingStrategy,
    pub context: C,
}

/// Counters for monitoring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub registered: u64,
    pub resolved: u64,
    pub expired: u64,
    /// Results delivered for tokens already gone (late or duplicate).
    /// Expiry of an entry that already resolved is routine and not counted.
    pub missed: u64,
}

/// Token-keyed table of outstanding remote calls, safe to share across tasks
#[derive(Debug)]
pub struct PendingRequestRegistry<C> {
    entries: Mutex<HashMap<Token, PendingEntry<C>>>,
    next_token: AtomicU64,
    registered: AtomicU64,
    resolved: AtomicU64,
    expired: AtomicU64,
    missed: AtomicU64,
}

impl<C> PendingRequestRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            registered: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            missed: AtomicU64::new(0),
        }
    }

    /// Hand out a token no earlier call has seen
    pub fn issue(&self) -> Token {
        Token::new(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// True when `token` came from [`issue`](Self::issue) on this registry
    pub fn was_issued(&self, token: Token) -> bool {
        token.value() != 0 && token.value() < self.next_token.load(Ordering::Relaxed)
    }

    pub fn register(
        &self,
        token: Token,
        request: Arc<Request>,
        strategy: ProcessingStrategy,
        context: C,
    ) -> Result<(), RegistryError> {
        let mut entries = self.lock();
        if entries.contains_key(&token) {
            return Err(RegistryError::DuplicateToken(token));
        }

        entries.insert(
            token,
            PendingEntry {
                token,
                request_id: request.id.clone(),
                request,
                created_at: Utc::now(),
                strategy,
                context,
            },
        );
        self.registered.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%token, pending = entries.len(), "remote call registered");
        Ok(())
    }

    /// Remove the entry because its result arrived
    pub fn resolve(&self, token: Token) -> Result<PendingEntry<C>, RegistryError> {
        self.take(token, &self.resolved).ok_or_else(|| {
            self.missed.fetch_add(1, Ordering::Relaxed);
            RegistryError::NotFound(token)
        })
    }

    /// Remove the entry because its deadline passed
    pub fn expire(&self, token: Token) -> Result<PendingEntry<C>, RegistryError> {
        self.take(token, &self.expired).ok_or(RegistryError::NotFound(token))
    }

    pub fn contains(&self, token: Token) -> bool {
        self.lock().contains_key(&token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            registered: self.registered.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            missed: self.missed.load(Ordering::Relaxed),
        }
    }

    fn take(&self, token: Token, counter: &AtomicU64) -> Option<PendingEntry<C>> {
        let entry = self.lock().remove(&token)?;
        counter.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    // Nothing panics while holding the lock, but a poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<Token, PendingEntry<C>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C> Default for PendingRequestRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridai_core::RequestKind;

    fn request() -> Arc<Request> {
        Arc::new(Request::new(RequestKind::TextQuery, "hello"))
    }

    #[test]
    fn test_register_then_resolve() {
        let registry = PendingRequestRegistry::new();
        let token = registry.issue();
        let req = request();
        registry
            .register(token, req.clone(), ProcessingStrategy::RemoteOnly, "ctx")
            .unwrap();

        assert_eq!(registry.len(), 1);
        let entry = registry.resolve(token).unwrap();
        assert_eq!(entry.token, token);
        assert_eq!(entry.request_id, req.id);
        assert_eq!(entry.context, "ctx");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_second_resolution_not_found() {
        let registry = PendingRequestRegistry::new();
        let token = registry.issue();
        registry
            .register(token, request(), ProcessingStrategy::Parallel, ())
            .unwrap();

        assert!(registry.expire(token).is_ok());
        assert_eq!(registry.resolve(token).unwrap_err(), RegistryError::NotFound(token));
        assert_eq!(registry.expire(token).unwrap_err(), RegistryError::NotFound(token));

        let stats = registry.stats();
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.resolved, 0);
        assert_eq!(stats.missed, 1);
    }

    #[test]
    fn test_expiry_after_resolution_not_missed() {
        let registry = PendingRequestRegistry::new();
        let token = registry.issue();
        registry
            .register(token, request(), ProcessingStrategy::RemoteOnly, ())
            .unwrap();

        assert!(registry.resolve(token).is_ok());
        assert!(registry.expire(token).is_err());

        let stats = registry.stats();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.expired, 0);
        assert_eq!(stats.missed, 0);
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let registry = PendingRequestRegistry::new();
        let token = registry.issue();
        registry
            .register(token, request(), ProcessingStrategy::Parallel, 1)
            .unwrap();
        let err = registry
            .register(token, request(), ProcessingStrategy::Parallel, 2)
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateToken(token));
        assert_eq!(registry.resolve(token).unwrap().context, 1);
    }

    #[test]
    fn test_unknown_token() {
        let registry: PendingRequestRegistry<()> = PendingRequestRegistry::new();
        assert!(!registry.was_issued(Token::new(42)));
        assert!(registry.resolve(Token::new(42)).is_err());

        let issued = registry.issue();
        assert!(registry.was_issued(issued));
        assert_ne!(issued, registry.issue());
    }

    #[test]
    fn test_concurrent_resolution_single_winner() {
        let registry = Arc::new(PendingRequestRegistry::new());
        let token = registry.issue();
        registry
            .register(token, request(), ProcessingStrategy::Parallel, ())
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        registry.resolve(token).is_ok()
                    } else {
                        registry.expire(token).is_ok()
                    }
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
