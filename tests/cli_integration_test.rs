//! CLI integration tests with real INI and CSV files on disk.

mod common;

use clap::Parser;
use common::*;
use signalgate::cli::{self, Cli, REJECTED_EXIT};
use std::process::ExitCode;

// ExitCode has no PartialEq on every supported toolchain, so compare the Debug form
fn exit_of(args: &[&str]) -> String {
    let mut argv = vec!["signalgate"];
    argv.extend_from_slice(args);
    format!("{:?}", cli::run(Cli::try_parse_from(argv).unwrap()))
}

fn code(value: u8) -> String {
    format!("{:?}", ExitCode::from(value))
}

fn success() -> String {
    format!("{:?}", ExitCode::SUCCESS)
}

const ACCOUNT_INI: &str = r#"
[account]
user = alice
balance = 10000
open_positions = 0

[risk]
max_position_size = 0.02
max_open_positions = 3
"#;

mod commands {
    use super::*;

    #[test]
    fn strategies_lists_variants() {
        assert_eq!(exit_of(&["strategies"]), success());
    }

    #[test]
    fn validate_accepts_good_config() {
        let file = write_temp("[strategy]\nname = day-trading\n\n[day-trading]\nrsi_period = 10\n", ".ini");
        let path = file.path().to_str().unwrap();
        assert_eq!(exit_of(&["validate", "--config", path]), success());
    }

    #[test]
    fn validate_rejects_bad_range_with_config_code() {
        let file = write_temp("[strategy]\nname = scalping\n\n[scalping]\nrsi_oversold = 90\n", ".ini");
        let path = file.path().to_str().unwrap();
        assert_eq!(exit_of(&["validate", "--config", path]), code(2));
    }

    #[test]
    fn validate_unknown_strategy_code() {
        let file = write_temp("[strategy]\nname = martingale\n", ".ini");
        let path = file.path().to_str().unwrap();
        assert_eq!(exit_of(&["validate", "--config", path]), code(4));
    }

    #[test]
    fn validate_missing_file_is_config_error() {
        assert_eq!(exit_of(&["validate", "--config", "/nonexistent/signalgate.ini"]), code(2));
    }

    #[test]
    fn indicators_over_csv() {
        let bars = bars_from_closes(&zigzag_closes(80, 100.0, 4.0));
        let data = write_temp(&bars_csv(&bars), ".csv");
        let path = data.path().to_str().unwrap();
        assert_eq!(exit_of(&["indicators", "--data", path, "--json", "--rows", "3"]), success());
    }

    #[test]
    fn indicators_missing_data_is_upstream_error() {
        assert_eq!(exit_of(&["indicators", "--data", "/nonexistent/BTC_1h.csv"]), code(3));
    }

    #[test]
    fn signal_with_explicit_strategy() {
        let bars = bars_from_closes(&trending_closes(60, 100.0, 0.5));
        let data = write_temp(&bars_csv(&bars), ".csv");
        let path = data.path().to_str().unwrap();
        assert_eq!(
            exit_of(&["signal", "--data", path, "--symbol", "BTCUSDT", "--strategy", "swing-trading", "--json"]),
            success()
        );
    }

    #[test]
    fn signal_without_strategy_name_is_config_error() {
        let bars = bars_from_closes(&trending_closes(10, 100.0, 0.5));
        let data = write_temp(&bars_csv(&bars), ".csv");
        let path = data.path().to_str().unwrap();
        assert_eq!(exit_of(&["signal", "--data", path]), code(2));
    }

    #[test]
    fn signal_rejects_out_of_order_bars() {
        let mut bars = bars_from_closes(&trending_closes(10, 100.0, 0.5));
        bars[3].open_time = bars[1].open_time;
        let data = write_temp(&bars_csv(&bars), ".csv");
        let path = data.path().to_str().unwrap();
        // the reader sorts by time, leaving a duplicate timestamp
        assert_eq!(exit_of(&["signal", "--data", path, "--strategy", "grid"]), code(5));
    }

    #[test]
    fn size_recommendation() {
        assert_eq!(
            exit_of(&[
                "size",
                "--win-rate",
                "0.55",
                "--avg-win",
                "120",
                "--avg-loss",
                "100",
                "--trades",
                "50",
                "--balance",
                "10000",
            ]),
            success()
        );
    }
}

mod check_order {
    use super::*;

    #[test]
    fn small_order_is_accepted() {
        let account = write_temp(ACCOUNT_INI, ".ini");
        let path = account.path().to_str().unwrap();
        let args = [
            "check-order", "--account", path, "--symbol", "BTCUSDT", "--side", "buy", "--quantity", "1",
            "--price", "150",
        ];
        assert_eq!(exit_of(&args), success());
    }

    #[test]
    fn oversized_order_exits_with_rejection_code() {
        let account = write_temp(ACCOUNT_INI, ".ini");
        let path = account.path().to_str().unwrap();
        let args = [
            "check-order", "--account", path, "--symbol", "BTCUSDT", "--side", "buy", "--quantity", "1",
            "--price", "300", "--json",
        ];
        assert_eq!(exit_of(&args), code(REJECTED_EXIT));
    }

    #[test]
    fn order_history_feeds_loss_checks() {
        let account = write_temp(ACCOUNT_INI, ".ini");
        let today = chrono::Utc::now().format("%Y-%m-%dT00:00:01Z").to_string();
        let history = write_temp(
            &format!("created_at,symbol,realized_pnl\n{today},ETHUSDT,-800\n"),
            ".csv",
        );
        let args = [
            "check-order",
            "--account",
            account.path().to_str().unwrap(),
            "--symbol",
            "BTCUSDT",
            "--side",
            "sell",
            "--quantity",
            "1",
            "--price",
            "100",
            "--orders",
            history.path().to_str().unwrap(),
        ];
        assert_eq!(exit_of(&args), code(REJECTED_EXIT));
    }

    #[test]
    fn overflowing_order_is_a_parameter_error() {
        let account = write_temp(ACCOUNT_INI, ".ini");
        let path = account.path().to_str().unwrap();
        let args = [
            "check-order", "--account", path, "--symbol", "BTCUSDT", "--side", "buy", "--quantity",
            "79228162514264337593543950335", "--price", "2",
        ];
        assert_eq!(exit_of(&args), code(4));
    }

    #[test]
    fn account_without_balance_is_config_error() {
        let account = write_temp("[account]\nuser = alice\n", ".ini");
        let path = account.path().to_str().unwrap();
        let args = [
            "check-order", "--account", path, "--symbol", "BTCUSDT", "--side", "buy", "--quantity", "1",
            "--price", "100",
        ];
        assert_eq!(exit_of(&args), code(2));
    }

    #[test]
    fn submit_flag_goes_through_the_desk() {
        let account = write_temp(ACCOUNT_INI, ".ini");
        let path = account.path().to_str().unwrap();
        let args = [
            "check-order", "--account", path, "--symbol", "BTCUSDT", "--side", "buy", "--quantity", "1",
            "--price", "100", "--submit",
        ];
        assert_eq!(exit_of(&args), success());
    }
}
