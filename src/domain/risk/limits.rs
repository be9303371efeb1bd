use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::config_validation::{read_decimal, read_period};
use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "risk";

/// Per-user limits. Ratios are fractions of account balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_position_size: Decimal,
    pub max_daily_loss: Decimal,
    pub max_monthly_loss: Decimal,
    pub max_leverage: Decimal,
    pub max_open_positions: usize,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: dec!(0.10),
            max_daily_loss: dec!(0.05),
            max_monthly_loss: dec!(0.15),
            max_leverage: dec!(3),
            max_open_positions: 5,
        }
    }
}

impl RiskLimits {
    /// Reads `[risk]`; absent keys keep their defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let limits = Self {
            max_position_size: read_decimal(config, SECTION, "max_position_size", d.max_position_size)?,
            max_daily_loss: read_decimal(config, SECTION, "max_daily_loss", d.max_daily_loss)?,
            max_monthly_loss: read_decimal(config, SECTION, "max_monthly_loss", d.max_monthly_loss)?,
            max_leverage: read_decimal(config, SECTION, "max_leverage", d.max_leverage)?,
            max_open_positions: read_period(config, SECTION, "max_open_positions", d.max_open_positions)?,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let ratios = [
            ("max_position_size", self.max_position_size),
            ("max_daily_loss", self.max_daily_loss),
            ("max_monthly_loss", self.max_monthly_loss),
        ];
        for (key, value) in ratios {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(EngineError::config_invalid(
                    SECTION,
                    key,
                    format!("{key} must be in (0, 1], got {value}"),
                ));
            }
        }
        if self.max_leverage < Decimal::ONE {
            return Err(EngineError::config_invalid(
                SECTION,
                "max_leverage",
                format!("max_leverage must be at least 1, got {}", self.max_leverage),
            ));
        }
        if self.max_open_positions == 0 {
            return Err(EngineError::config_invalid(
                SECTION,
                "max_open_positions",
                "max_open_positions must be positive",
            ));
        }
        Ok(())
    }
}
