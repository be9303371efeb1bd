//! In-process account store.
//!
//! Backs the CLI's `check-order` command and the integration tests. Accepted
//! submissions occupy a position slot immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::config_validation::{read_count, read_decimal, read_string};
use crate::domain::error::EngineError;
use crate::domain::risk::{CandidateOrder, OrderReceipt, OrderRecord, RiskLimits};
use crate::ports::account_port::{AccountPort, RiskLimitsPort};
use crate::ports::config_port::ConfigPort;
use crate::ports::order_port::OrderSubmitPort;

const SOURCE: &str = "accounts";

#[derive(Debug, Clone, Default)]
struct Account {
    balance: Decimal,
    open_positions: usize,
    orders: Vec<OrderRecord>,
    limits: Option<RiskLimits>,
    receipts: Vec<OrderReceipt>,
}

#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    accounts: Mutex<HashMap<String, Account>>,
    next_id: AtomicU64,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a single account from `[account]` (`user`, `balance`,
    /// `open_positions`) with limits from `[risk]`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<(Self, String), EngineError> {
        let user = read_string(config, "account", "user")?.unwrap_or_else(|| "default".to_string());
        let balance = match config.get_string("account", "balance") {
            Some(_) => read_decimal(config, "account", "balance", Decimal::ONE)?,
            None => {
                return Err(EngineError::ConfigMissing {
                    section: "account".into(),
                    key: "balance".into(),
                })
            }
        };
        let open_positions = read_count(config, "account", "open_positions", 0)?;
        let limits = RiskLimits::from_config(config)?;

        let accounts = Self::new().with_account(&user, balance);
        accounts.set_open_positions(&user, open_positions);
        accounts.set_limits(&user, limits);
        Ok((accounts, user))
    }

    pub fn with_account(self, user_id: &str, balance: Decimal) -> Self {
        self.lock().insert(
            user_id.to_string(),
            Account {
                balance,
                ..Default::default()
            },
        );
        self
    }

    pub fn set_open_positions(&self, user_id: &str, count: usize) {
        self.lock().entry(user_id.to_string()).or_default().open_positions = count;
    }

    pub fn set_limits(&self, user_id: &str, limits: RiskLimits) {
        self.lock().entry(user_id.to_string()).or_default().limits = Some(limits);
    }

    pub fn record_order(&self, user_id: &str, order: OrderRecord) {
        self.lock().entry(user_id.to_string()).or_default().orders.push(order);
    }

    pub fn receipts(&self, user_id: &str) -> Vec<OrderReceipt> {
        self.lock()
            .get(user_id)
            .map(|a| a.receipts.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, user_id: &str, f: impl FnOnce(&Account) -> T) -> Result<T, EngineError> {
        self.lock()
            .get(user_id)
            .map(f)
            .ok_or_else(|| EngineError::upstream(SOURCE, format!("unknown account '{user_id}'")))
    }
}

impl AccountPort for InMemoryAccounts {
    fn balance(&self, user_id: &str) -> Result<Decimal, EngineError> {
        self.read(user_id, |a| a.balance)
    }

    fn open_position_count(&self, user_id: &str) -> Result<usize, EngineError> {
        self.read(user_id, |a| a.open_positions)
    }

    fn orders_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<OrderRecord>, EngineError> {
        self.read(user_id, |a| {
            a.orders
                .iter()
                .filter(|o| o.created_at >= since)
                .cloned()
                .collect()
        })
    }
}

impl RiskLimitsPort for InMemoryAccounts {
    fn risk_limits(&self, user_id: &str) -> Result<Option<RiskLimits>, EngineError> {
        Ok(self.lock().get(user_id).and_then(|a| a.limits.clone()))
    }
}

impl OrderSubmitPort for InMemoryAccounts {
    fn submit(&self, user_id: &str, order: &CandidateOrder) -> Result<OrderReceipt, EngineError> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(user_id)
            .ok_or_else(|| EngineError::upstream(SOURCE, format!("unknown account '{user_id}'")))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let receipt = OrderReceipt {
            order_id: format!("ord-{id:06}"),
            user_id: user_id.to_string(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price: order.price,
            submitted_at: Utc::now(),
        };
        account.open_positions += 1;
        account.receipts.push(receipt.clone());
        Ok(receipt)
    }
}
