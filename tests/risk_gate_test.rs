//! Risk gate and order desk behavior against the in-memory account store.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::UnreachableAccounts;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signalgate::adapters::memory_account::InMemoryAccounts;
use signalgate::domain::error::EngineError;
use signalgate::domain::risk::{
    CandidateOrder, OrderDesk, OrderRecord, OrderSide, RiskGate, RiskLimits, Submission,
};
use signalgate::ports::account_port::AccountPort;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 15, 30, 0).unwrap()
}

fn buy(quantity: Decimal, price: Decimal) -> CandidateOrder {
    CandidateOrder::new("BTCUSDT", OrderSide::Buy, quantity, price)
}

fn accounts_with(balance: Decimal, limits: RiskLimits) -> InMemoryAccounts {
    let accounts = InMemoryAccounts::new().with_account("alice", balance);
    accounts.set_limits("alice", limits);
    accounts
}

mod checks {
    use super::*;

    #[test]
    fn position_size_three_percent_over_two_percent_limit() {
        let accounts = accounts_with(
            dec!(10000),
            RiskLimits {
                max_position_size: dec!(0.02),
                ..Default::default()
            },
        );
        let verdict = RiskGate::new(&accounts, &accounts)
            .validate_order_at("alice", &buy(dec!(1), dec!(300)), now())
            .unwrap();

        assert!(!verdict.valid);
        let check = &verdict.checks.position_size;
        assert!(!check.valid);
        assert_eq!(check.value, dec!(0.03));
        assert_eq!(check.limit, dec!(0.02));
    }

    #[test]
    fn correlation_rejects_at_capacity_and_passes_below() {
        let limits = RiskLimits {
            max_open_positions: 3,
            ..Default::default()
        };
        let accounts = accounts_with(dec!(10000), limits);
        let gate = RiskGate::new(&accounts, &accounts);
        let order = buy(dec!(0.01), dec!(1000));

        accounts.set_open_positions("alice", 3);
        let verdict = gate.validate_order_at("alice", &order, now()).unwrap();
        assert!(!verdict.checks.correlation.valid);
        assert!(!verdict.valid);

        accounts.set_open_positions("alice", 2);
        let verdict = gate.validate_order_at("alice", &order, now()).unwrap();
        assert!(verdict.checks.correlation.valid);
        assert!(verdict.valid);
    }

    #[test]
    fn todays_losses_trip_the_daily_limit() {
        let accounts = accounts_with(dec!(10000), RiskLimits::default());
        accounts.record_order(
            "alice",
            OrderRecord {
                created_at: Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap(),
                symbol: "ETHUSDT".into(),
                realized_pnl: dec!(-600),
            },
        );
        let verdict = RiskGate::new(&accounts, &accounts)
            .validate_order_at("alice", &buy(dec!(0.01), dec!(1000)), now())
            .unwrap();
        assert!(!verdict.checks.daily_loss.valid);
        assert_eq!(verdict.checks.daily_loss.value, dec!(0.06));
        assert!(verdict.checks.monthly_loss.valid);
    }

    #[test]
    fn last_months_losses_are_ignored() {
        let accounts = accounts_with(dec!(10000), RiskLimits::default());
        accounts.record_order(
            "alice",
            OrderRecord {
                created_at: Utc.with_ymd_and_hms(2024, 4, 30, 23, 0, 0).unwrap(),
                symbol: "ETHUSDT".into(),
                realized_pnl: dec!(-5000),
            },
        );
        let verdict = RiskGate::new(&accounts, &accounts)
            .validate_order_at("alice", &buy(dec!(0.01), dec!(1000)), now())
            .unwrap();
        assert!(verdict.valid);
    }

    #[test]
    fn missing_limits_use_defaults() {
        let accounts = InMemoryAccounts::new().with_account("bob", dec!(1000));
        // 150 / 1000 = 0.15 > default 0.10
        let verdict = RiskGate::new(&accounts, &accounts)
            .validate_order_at("bob", &buy(dec!(1), dec!(150)), now())
            .unwrap();
        assert!(!verdict.checks.position_size.valid);
        assert_eq!(verdict.checks.position_size.limit, dec!(0.10));
    }

    #[test]
    fn overflowing_notional_is_an_invalid_order() {
        let accounts = accounts_with(dec!(10000), RiskLimits::default());
        let err = RiskGate::new(&accounts, &accounts)
            .validate_order_at("alice", &buy(Decimal::MAX, dec!(2)), now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
    }

    #[test]
    fn dust_balance_rejects_without_overflow() {
        let accounts = accounts_with(dec!(0.0000000000000000000001), RiskLimits::default());
        accounts.record_order(
            "alice",
            OrderRecord {
                created_at: Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap(),
                symbol: "ETHUSDT".into(),
                realized_pnl: dec!(-100000000000000000000),
            },
        );
        let verdict = RiskGate::new(&accounts, &accounts)
            .validate_order_at("alice", &buy(dec!(1000000000), dec!(1000000000)), now())
            .unwrap();

        assert!(!verdict.valid);
        assert!(!verdict.checks.position_size.valid);
        assert_eq!(verdict.checks.position_size.value, Decimal::MAX);
        assert!(!verdict.checks.daily_loss.valid);
        assert!(!verdict.checks.monthly_loss.valid);
        assert!(verdict.checks.correlation.valid);
    }

    #[test]
    fn unreachable_account_store_propagates() {
        let gate = RiskGate::new(&UnreachableAccounts, &UnreachableAccounts);
        let err = gate.validate_order_at("alice", &buy(dec!(1), dec!(1)), now()).unwrap_err();
        assert!(matches!(err, EngineError::UpstreamUnavailable { .. }));
    }
}

mod desk {
    use super::*;

    #[test]
    fn rejected_order_never_reaches_submission() {
        let accounts = accounts_with(
            dec!(10000),
            RiskLimits {
                max_position_size: dec!(0.02),
                ..Default::default()
            },
        );
        let desk = OrderDesk::new(RiskGate::new(&accounts, &accounts), &accounts);
        let submission = desk.submit_at("alice", &buy(dec!(1), dec!(300)), now()).unwrap();

        match submission {
            Submission::Rejected(verdict) => {
                assert_eq!(verdict.message, "Failed checks: position_size");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(accounts.receipts("alice").is_empty());
        assert_eq!(accounts.open_position_count("alice").unwrap(), 0);
    }

    #[test]
    fn accepted_order_is_submitted_once() {
        let accounts = accounts_with(dec!(10000), RiskLimits::default());
        let desk = OrderDesk::new(RiskGate::new(&accounts, &accounts), &accounts);
        let submission = desk.submit_at("alice", &buy(dec!(0.01), dec!(30000)), now()).unwrap();

        assert!(submission.is_accepted());
        assert!(submission.verdict().valid);
        assert_eq!(accounts.receipts("alice").len(), 1);
        assert_eq!(accounts.open_position_count("alice").unwrap(), 1);
    }

    #[test]
    fn concurrent_submissions_respect_position_cap() {
        let accounts = accounts_with(
            dec!(100000),
            RiskLimits {
                max_open_positions: 3,
                ..Default::default()
            },
        );
        let desk = OrderDesk::new(RiskGate::new(&accounts, &accounts), &accounts);
        let order = buy(dec!(0.01), dec!(30000));

        let accepted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| desk.submit_at("alice", &order, now()).unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(Submission::is_accepted)
                .count()
        });

        assert_eq!(accepted, 3);
        assert_eq!(accounts.receipts("alice").len(), 3);
        assert_eq!(accounts.open_position_count("alice").unwrap(), 3);
    }

    #[test]
    fn users_do_not_share_capacity() {
        let limits = RiskLimits {
            max_open_positions: 1,
            ..Default::default()
        };
        let accounts = accounts_with(dec!(10000), limits.clone()).with_account("bob", dec!(10000));
        accounts.set_limits("bob", limits);
        let desk = OrderDesk::new(RiskGate::new(&accounts, &accounts), &accounts);
        let order = buy(dec!(0.01), dec!(1000));

        assert!(desk.submit_at("alice", &order, now()).unwrap().is_accepted());
        assert!(desk.submit_at("bob", &order, now()).unwrap().is_accepted());
        assert!(!desk.submit_at("alice", &order, now()).unwrap().is_accepted());
    }
}
