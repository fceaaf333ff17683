//! Per-sender nonce serialisation.
//!
//! Without it, two concurrent requests from one sender read the same chain
//! nonce and the later submission is rejected as a `NonceConflict`. With it,
//! a sender's requests queue on an async mutex from nonce read to submission
//! and each one is handed `max(chain nonce, last submitted + 1)`.
//!
//! A slot dropped between handing a transaction to the node and learning the
//! outcome forgets the local sequence, so the next request re-reads the chain.

use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out per-sender nonce slots.
#[derive(Debug, Default)]
pub struct NonceManager {
    enabled: bool,
    senders: DashMap<Address, Arc<Mutex<Option<u64>>>>,
}

impl NonceManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            senders: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wait for exclusive use of `sender`'s nonce sequence.
    ///
    /// When serialisation is disabled this returns immediately with a slot
    /// that simply echoes the chain nonce.
    pub async fn acquire(&self, sender: Address) -> NonceSlot {
        if !self.enabled {
            return NonceSlot {
                guard: None,
                in_flight: false,
            };
        }
        let lock = self
            .senders
            .entry(sender)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        NonceSlot {
            guard: Some(lock.lock_owned().await),
            in_flight: false,
        }
    }
}

/// Exclusive access to one sender's nonce sequence until dropped.
#[derive(Debug)]
pub struct NonceSlot {
    guard: Option<OwnedMutexGuard<Option<u64>>>,
    in_flight: bool,
}

impl NonceSlot {
    /// Nonce to use given what the chain reports.
    pub fn next(&self, chain_nonce: u64) -> u64 {
        match self.guard.as_deref() {
            Some(Some(last)) => chain_nonce.max(last + 1),
            _ => chain_nonce,
        }
    }

    /// The signed transaction is about to be sent; its outcome is unknown
    /// until [`NonceSlot::commit`] or [`NonceSlot::invalidate`].
    pub fn begin_submit(&mut self) {
        self.in_flight = true;
    }

    /// Remember `nonce` as accepted by the node.
    pub fn commit(&mut self, nonce: u64) {
        self.in_flight = false;
        if let Some(guard) = self.guard.as_mut() {
            **guard = Some(nonce);
        }
    }

    /// Forget the local sequence so the next request re-reads the chain.
    pub fn invalidate(&mut self) {
        self.in_flight = false;
        if let Some(guard) = self.guard.as_mut() {
            **guard = None;
        }
    }
}

impl Drop for NonceSlot {
    fn drop(&mut self) {
        if self.in_flight {
            tracing::warn!("Nonce slot released with a submission outstanding; re-reading chain nonce next time");
            self.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_echoes_chain_nonce() {
        let manager = NonceManager::new(false);
        let mut slot = manager.acquire(Address::ZERO).await;
        slot.commit(5);
        assert_eq!(slot.next(3), 3);
        // No lock is held, so a second slot is available immediately.
        let other = manager.acquire(Address::ZERO).await;
        assert_eq!(other.next(3), 3);
    }

    #[tokio::test]
    async fn test_sequence_advances_past_pending() {
        let manager = NonceManager::new(true);
        {
            let mut slot = manager.acquire(Address::ZERO).await;
            assert_eq!(slot.next(4), 4);
            slot.commit(4);
        }
        let slot = manager.acquire(Address::ZERO).await;
        // Chain still reports 4 while the first tx is pending.
        assert_eq!(slot.next(4), 5);
        // Chain has moved past the local view.
        assert_eq!(slot.next(9), 9);
    }

    #[tokio::test]
    async fn test_invalidate_falls_back_to_chain() {
        let manager = NonceManager::new(true);
        {
            let mut slot = manager.acquire(Address::ZERO).await;
            slot.commit(10);
            slot.invalidate();
        }
        let slot = manager.acquire(Address::ZERO).await;
        assert_eq!(slot.next(3), 3);
    }

    #[tokio::test]
    async fn test_unresolved_submission_forgets_sequence() {
        let manager = NonceManager::new(true);
        {
            let mut slot = manager.acquire(Address::ZERO).await;
            slot.commit(6);
        }
        {
            let mut slot = manager.acquire(Address::ZERO).await;
            assert_eq!(slot.next(0), 7);
            slot.begin_submit();
            // Dropped before the node answered.
        }
        let slot = manager.acquire(Address::ZERO).await;
        assert_eq!(slot.next(2), 2);
    }

    #[tokio::test]
    async fn test_same_sender_is_exclusive() {
        let manager = Arc::new(NonceManager::new(true));
        let held = manager.acquire(Address::ZERO).await;

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.acquire(Address::ZERO).await.next(0) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // Other senders are not blocked.
        let _other = manager.acquire(Address::repeat_byte(1)).await;

        drop(held);
        assert_eq!(waiter.await.unwrap(), 0);
    }
}
