//! Indicator vote combination shared by the rule-based strategies.
//!
//! Each indicator casts one [`Vote`]. Net strength = bullish − bearish; the
//! sign picks the direction and |net| picks the confidence tier.

use crate::domain::signal::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Bullish,
    Bearish,
    Neutral,
}

impl Vote {
    /// Bullish below `low`, bearish above `high`, neutral otherwise or when absent.
    pub fn from_band(value: Option<f64>, low: f64, high: f64) -> Self {
        match value {
            Some(v) if v < low => Vote::Bullish,
            Some(v) if v > high => Vote::Bearish,
            _ => Vote::Neutral,
        }
    }

    pub fn from_sign(value: Option<f64>) -> Self {
        match value {
            Some(v) if v > 0.0 => Vote::Bullish,
            Some(v) if v < 0.0 => Vote::Bearish,
            _ => Vote::Neutral,
        }
    }
}

/// Confidence for one, two and three-or-more agreeing votes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceTable {
    pub single: f64,
    pub double: f64,
    pub triple: f64,
}

impl ConfidenceTable {
    pub const fn new(single: f64, double: f64, triple: f64) -> Self {
        Self {
            single,
            double,
            triple,
        }
    }

    pub fn for_strength(&self, strength: usize) -> f64 {
        match strength {
            0 => 0.0,
            1 => self.single,
            2 => self.double,
            _ => self.triple,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub confidence: f64,
    pub reason: String,
}

/// Collects votes together with a short human-readable cause for each.
#[derive(Debug, Default)]
pub struct Ballot {
    votes: Vec<(Vote, String)>,
}

impl Ballot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cast(&mut self, vote: Vote, reason: impl Into<String>) {
        self.votes.push((vote, reason.into()));
    }

    pub fn bullish(&self) -> usize {
        self.count(Vote::Bullish)
    }

    pub fn bearish(&self) -> usize {
        self.count(Vote::Bearish)
    }

    fn count(&self, vote: Vote) -> usize {
        self.votes.iter().filter(|(v, _)| *v == vote).count()
    }

    pub fn decide(&self, table: &ConfidenceTable) -> Decision {
        let bull = self.bullish();
        let bear = self.bearish();

        let (action, winner, strength) = if bull > bear {
            (Action::Buy, Vote::Bullish, bull - bear)
        } else if bear > bull {
            (Action::Sell, Vote::Bearish, bear - bull)
        } else {
            return Decision {
                action: Action::Hold,
                confidence: 0.0,
                reason: format!("No agreement ({} bullish, {} bearish)", bull, bear),
            };
        };

        let reason = self
            .votes
            .iter()
            .filter(|(v, _)| *v == winner)
            .map(|(_, r)| r.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        Decision {
            action,
            confidence: table.for_strength(strength),
            reason,
        }
    }
}
