//! The individual risk checks as pure functions.
//!
//! Each check reports the measured value next to its limit so a rejection can
//! be explained without recomputing anything.

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::config_validation::read_string;
use crate::domain::error::EngineError;
use crate::domain::risk::order::OrderRecord;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub value: Decimal,
    pub limit: Decimal,
    pub message: String,
}

impl CheckResult {
    fn pass(value: Decimal, limit: Decimal, message: String) -> Self {
        Self {
            valid: true,
            value,
            limit,
            message,
        }
    }

    fn fail(value: Decimal, limit: Decimal, message: String) -> Self {
        Self {
            valid: false,
            value,
            limit,
            message,
        }
    }

    fn no_balance(balance: Decimal, limit: Decimal) -> Self {
        Self::fail(
            Decimal::ZERO,
            limit,
            format!("account balance {balance} is not positive"),
        )
    }

    fn out_of_range(what: &str, balance: Decimal, limit: Decimal) -> Self {
        Self::fail(
            Decimal::MAX,
            limit,
            format!("{what} relative to balance {balance} is out of range"),
        )
    }
}

/// Trading window for the market-hours check, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketSession {
    /// Round-the-clock venues such as crypto exchanges.
    #[default]
    Continuous,
    /// `[open, close)`; a close before the open wraps past midnight.
    Session { open: NaiveTime, close: NaiveTime },
}

impl MarketSession {
    /// Reads `market_open` / `market_close` (`HH:MM`, UTC) from `[risk]`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let open = read_string(config, "risk", "market_open")?;
        let close = read_string(config, "risk", "market_close")?;
        match (open, close) {
            (None, None) => Ok(MarketSession::Continuous),
            (Some(open), Some(close)) => {
                let open = parse_time("market_open", &open)?;
                let close = parse_time("market_close", &close)?;
                if open == close {
                    return Err(EngineError::config_invalid(
                        "risk",
                        "market_close",
                        "market_close must differ from market_open",
                    ));
                }
                Ok(MarketSession::Session { open, close })
            }
            (Some(_), None) => Err(EngineError::ConfigMissing {
                section: "risk".into(),
                key: "market_close".into(),
            }),
            (None, Some(_)) => Err(EngineError::ConfigMissing {
                section: "risk".into(),
                key: "market_open".into(),
            }),
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        match *self {
            MarketSession::Continuous => true,
            MarketSession::Session { open, close } => {
                let t = now.time();
                if open < close {
                    open <= t && t < close
                } else {
                    t >= open || t < close
                }
            }
        }
    }
}

fn parse_time(key: &str, raw: &str) -> Result<NaiveTime, EngineError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| EngineError::config_invalid("risk", key, format!("expected HH:MM, got '{raw}'")))
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let day = now.date_naive();
    day.with_day(1).unwrap_or(day).and_time(NaiveTime::MIN).and_utc()
}

/// Sum of realized P&L; negative means a net loss. Saturates at the
/// `Decimal` bounds.
pub fn net_realized_pnl<'a>(orders: impl IntoIterator<Item = &'a OrderRecord>) -> Decimal {
    orders
        .into_iter()
        .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.realized_pnl))
}

/// Notional as a fraction of balance must not exceed `limit`.
pub fn position_size(notional: Decimal, balance: Decimal, limit: Decimal) -> CheckResult {
    if balance <= Decimal::ZERO {
        return CheckResult::no_balance(balance, limit);
    }
    let Some(ratio) = notional.checked_div(balance) else {
        return CheckResult::out_of_range("position size", balance, limit);
    };
    if ratio <= limit {
        CheckResult::pass(ratio, limit, format!("position size {} within limit {}", ratio.round_dp(4), limit))
    } else {
        CheckResult::fail(
            ratio,
            limit,
            format!("position size {} of balance exceeds limit {}", ratio.round_dp(4), limit),
        )
    }
}

/// Net realized loss over a window as a fraction of balance. Net gains pass.
pub fn realized_loss(window: &str, net_pnl: Decimal, balance: Decimal, limit: Decimal) -> CheckResult {
    if balance <= Decimal::ZERO {
        return CheckResult::no_balance(balance, limit);
    }
    let loss = if net_pnl < Decimal::ZERO { -net_pnl } else { Decimal::ZERO };
    let Some(ratio) = loss.checked_div(balance) else {
        return CheckResult::out_of_range(&format!("{window} loss"), balance, limit);
    };
    if ratio <= limit {
        CheckResult::pass(ratio, limit, format!("{window} loss {} within limit {}", ratio.round_dp(4), limit))
    } else {
        CheckResult::fail(
            ratio,
            limit,
            format!("{window} loss {} of balance exceeds limit {}", ratio.round_dp(4), limit),
        )
    }
}

pub fn leverage(requested: Option<Decimal>, limit: Decimal) -> CheckResult {
    let value = requested.unwrap_or(Decimal::ONE);
    if value <= limit {
        CheckResult::pass(value, limit, format!("leverage {value}x within limit {limit}x"))
    } else {
        CheckResult::fail(value, limit, format!("leverage {value}x exceeds limit {limit}x"))
    }
}

pub fn market_hours(session: &MarketSession, now: DateTime<Utc>) -> CheckResult {
    match session {
        MarketSession::Continuous => {
            CheckResult::pass(Decimal::ONE, Decimal::ONE, "market trades continuously".to_string())
        }
        MarketSession::Session { open, close } if session.is_open(now) => CheckResult::pass(
            Decimal::ONE,
            Decimal::ONE,
            format!("market open ({} to {} UTC)", open.format("%H:%M"), close.format("%H:%M")),
        ),
        MarketSession::Session { open, close } => CheckResult::fail(
            Decimal::ZERO,
            Decimal::ONE,
            format!(
                "market closed at {} ({} to {} UTC)",
                now.format("%H:%M"),
                open.format("%H:%M"),
                close.format("%H:%M")
            ),
        ),
    }
}

/// Caps concurrent exposure: a new order needs a free position slot.
pub fn correlation(open_positions: usize, max_open_positions: usize) -> CheckResult {
    let value = Decimal::from(open_positions);
    let limit = Decimal::from(max_open_positions);
    if open_positions < max_open_positions {
        CheckResult::pass(
            value,
            limit,
            format!("{open_positions} open positions below limit {max_open_positions}"),
        )
    } else {
        CheckResult::fail(
            value,
            limit,
            format!("{open_positions} open positions at limit {max_open_positions}"),
        )
    }
}
