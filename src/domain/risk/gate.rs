use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::error::EngineError;
use crate::domain::risk::checks::{self, CheckResult, MarketSession};
use crate::domain::risk::order::CandidateOrder;
use crate::ports::account_port::{AccountPort, RiskLimitsPort};

/// Results of all six checks for one candidate order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskChecks {
    pub position_size: CheckResult,
    pub daily_loss: CheckResult,
    pub monthly_loss: CheckResult,
    pub leverage: CheckResult,
    pub market_hours: CheckResult,
    pub correlation: CheckResult,
}

impl RiskChecks {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CheckResult)> {
        [
            ("position_size", &self.position_size),
            ("daily_loss", &self.daily_loss),
            ("monthly_loss", &self.monthly_loss),
            ("leverage", &self.leverage),
            ("market_hours", &self.market_hours),
            ("correlation", &self.correlation),
        ]
        .into_iter()
    }

    pub fn failures(&self) -> Vec<(&'static str, &CheckResult)> {
        self.iter().filter(|(_, check)| !check.valid).collect()
    }

    pub fn all_valid(&self) -> bool {
        self.iter().all(|(_, check)| check.valid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskVerdict {
    pub valid: bool,
    pub checks: RiskChecks,
    pub message: String,
}

impl RiskVerdict {
    pub fn from_checks(checks: RiskChecks) -> Self {
        let failures = checks.failures();
        let message = if failures.is_empty() {
            "All risk checks passed".to_string()
        } else {
            let names: Vec<&str> = failures.iter().map(|(name, _)| *name).collect();
            format!("Failed checks: {}", names.join(", "))
        };
        Self {
            valid: failures.is_empty(),
            checks,
            message,
        }
    }
}

/// Evaluates candidate orders against a user's account state and limits.
pub struct RiskGate<'a> {
    accounts: &'a dyn AccountPort,
    limits: &'a dyn RiskLimitsPort,
    session: MarketSession,
}

impl<'a> RiskGate<'a> {
    pub fn new(accounts: &'a dyn AccountPort, limits: &'a dyn RiskLimitsPort) -> Self {
        Self {
            accounts,
            limits,
            session: MarketSession::Continuous,
        }
    }

    pub fn with_session(mut self, session: MarketSession) -> Self {
        self.session = session;
        self
    }

    pub fn validate_order(&self, user_id: &str, order: &CandidateOrder) -> Result<RiskVerdict, EngineError> {
        self.validate_order_at(user_id, order, Utc::now())
    }

    /// Runs every check; none short-circuits another.
    pub fn validate_order_at(
        &self,
        user_id: &str,
        order: &CandidateOrder,
        now: DateTime<Utc>,
    ) -> Result<RiskVerdict, EngineError> {
        order.validate()?;
        let notional = order
            .notional()
            .ok_or_else(|| EngineError::invalid_parameter("order", "notional is out of range"))?;

        let limits = match self.limits.risk_limits(user_id)? {
            Some(limits) => limits,
            None => {
                debug!(user = user_id, "no stored risk limits, using defaults");
                Default::default()
            }
        };
        let balance = self.accounts.balance(user_id)?;
        let open_positions = self.accounts.open_position_count(user_id)?;

        let day_start = checks::start_of_day(now);
        let month_orders = self.accounts.orders_since(user_id, checks::start_of_month(now))?;
        let daily_pnl = checks::net_realized_pnl(month_orders.iter().filter(|o| o.created_at >= day_start));
        let monthly_pnl = checks::net_realized_pnl(&month_orders);

        let results = RiskChecks {
            position_size: checks::position_size(notional, balance, limits.max_position_size),
            daily_loss: checks::realized_loss("daily", daily_pnl, balance, limits.max_daily_loss),
            monthly_loss: checks::realized_loss("monthly", monthly_pnl, balance, limits.max_monthly_loss),
            leverage: checks::leverage(order.leverage, limits.max_leverage),
            market_hours: checks::market_hours(&self.session, now),
            correlation: checks::correlation(open_positions, limits.max_open_positions),
        };
        let verdict = RiskVerdict::from_checks(results);

        if verdict.valid {
            info!(
                user = user_id,
                symbol = %order.symbol,
                side = %order.side,
                quantity = %order.quantity,
                price = %order.price,
                "order passed risk checks"
            );
        } else {
            for (name, check) in verdict.checks.failures() {
                warn!(
                    user = user_id,
                    symbol = %order.symbol,
                    check = name,
                    value = %check.value,
                    limit = %check.limit,
                    "{}",
                    check.message
                );
            }
        }
        Ok(verdict)
    }
}
