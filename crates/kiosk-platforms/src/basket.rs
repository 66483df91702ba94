//! # Ledger-Backed Basket Service
//!
//! The [`BasketService`] implementation every adapter family uses.
//!
//! ## Thread Safety
//! The ledger is wrapped in `Arc<Mutex<T>>` because:
//! 1. The UI shell may issue commands from concurrent tasks
//! 2. Only one command should mutate the basket at a time
//! 3. Each mutation must be atomic with respect to its recompute step -
//!    no task can ever observe lines changed but totals not yet re-derived
//!
//! ## Why Not RwLock?
//! Basket operations are quick and most of them mutate. A RwLock would add
//! complexity with minimal benefit.
//!
//! ## Why One Implementation for Four Platforms?
//! The basket is kiosk-local on every platform: prices are frozen into the
//! ledger when a line is added, and the platform only hears about the basket
//! when checkout maps it to a draft order. Platform-specific behavior lives
//! in the adapters, not here.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kiosk_core::basket::{Basket, BasketLedger, BasketLine};
use kiosk_core::types::TaxRate;
use tracing::debug;

use crate::error::PlatformResult;
use crate::service::BasketService;

/// [`BasketService`] backed by an in-process [`BasketLedger`].
#[derive(Debug, Clone)]
pub struct LedgerBasketService {
    ledger: Arc<Mutex<BasketLedger>>,
}

impl LedgerBasketService {
    /// Creates an empty basket service.
    pub fn new(tax_rate: TaxRate, currency: impl Into<String>) -> Self {
        LedgerBasketService {
            ledger: Arc::new(Mutex::new(BasketLedger::new(tax_rate, currency))),
        }
    }

    /// Wraps a pre-configured ledger (extra discount codes registered).
    pub fn from_ledger(ledger: BasketLedger) -> Self {
        LedgerBasketService {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Executes a function with exclusive access to the ledger.
    ///
    /// The mutation and its recompute both happen inside the lock, so no
    /// caller can observe an un-recomputed basket.
    fn with_ledger<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BasketLedger) -> R,
    {
        let mut ledger = self.ledger.lock().expect("basket mutex poisoned");
        f(&mut ledger)
    }
}

#[async_trait]
impl BasketService for LedgerBasketService {
    async fn add_line(&self, line: BasketLine) -> PlatformResult<Basket> {
        debug!(product_id = %line.product_id, quantity = line.quantity, "basket add_line");
        Ok(self.with_ledger(|l| l.add_line(line))?)
    }

    async fn remove_line(&self, product_id: &str) -> PlatformResult<Basket> {
        debug!(product_id = %product_id, "basket remove_line");
        Ok(self.with_ledger(|l| l.remove_line(product_id)))
    }

    async fn update_quantity(&self, product_id: &str, quantity: i64) -> PlatformResult<Basket> {
        debug!(product_id = %product_id, quantity, "basket update_quantity");
        Ok(self.with_ledger(|l| l.update_quantity(product_id, quantity))?)
    }

    async fn clear(&self) -> PlatformResult<Basket> {
        debug!("basket clear");
        Ok(self.with_ledger(|l| l.clear()))
    }

    async fn apply_discount(&self, code: &str) -> PlatformResult<Basket> {
        debug!(code = %code, "basket apply_discount");
        Ok(self.with_ledger(|l| l.apply_discount(code)))
    }

    async fn remove_discount(&self) -> PlatformResult<Basket> {
        debug!("basket remove_discount");
        Ok(self.with_ledger(|l| l.remove_discount()))
    }

    async fn basket(&self) -> PlatformResult<Basket> {
        Ok(self.with_ledger(|l| l.snapshot()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::error::CoreError;
    use crate::error::PlatformError;

    fn service() -> LedgerBasketService {
        LedgerBasketService::new(TaxRate::from_fraction(0.2), "GBP")
    }

    #[tokio::test]
    async fn test_mutators_return_recomputed_snapshot() {
        let service = service();
        let basket = service
            .add_line(BasketLine::new("p1", "Latte", 2, 350))
            .await
            .unwrap();
        assert_eq!(basket.total_cents, 840);

        let basket = service.update_quantity("p1", 3).await.unwrap();
        assert_eq!(basket.subtotal_cents, 1050);
    }

    #[tokio::test]
    async fn test_core_error_surfaces_as_platform_error() {
        let service = service();
        let err = service.update_quantity("ghost", 2).await.unwrap_err();
        assert!(matches!(
            err,
            PlatformError::Core(CoreError::LineNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_then_basket_is_empty_zero() {
        let service = service();
        service
            .add_line(BasketLine::new("p1", "Latte", 1, 350))
            .await
            .unwrap();
        service.clear().await.unwrap();

        let basket = service.basket().await.unwrap();
        assert!(basket.lines.is_empty());
        assert_eq!(basket.subtotal_cents, 0);
        assert_eq!(basket.tax_cents, 0);
        assert_eq!(basket.total_cents, 0);
    }
}
