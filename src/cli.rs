//! CLI definition and dispatch.
//!
//! Results go to stdout; diagnostics and logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapters::csv_adapter::{read_bars, read_order_history, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_account::InMemoryAccounts;
use crate::domain::config_validation::{read_string, validate_config};
use crate::domain::error::EngineError;
use crate::domain::indicator_set::{compute_all, IndicatorConfig};
use crate::domain::ohlcv::BarSeries;
use crate::domain::risk::sizing::{KellyConfig, TradeStats};
use crate::domain::risk::{CandidateOrder, MarketSession, OrderDesk, OrderSide, RiskGate, RiskVerdict, Submission};
use crate::domain::signal::Signal;
use crate::domain::strategy::{EvaluationContext, StrategyKind, StrategyRegistry, StrategySettings};
use crate::ports::data_port::MarketDataPort;

/// Exit code for an order the risk gate rejected.
pub const REJECTED_EXIT: u8 = 6;

#[derive(Parser, Debug)]
#[command(name = "signalgate", about = "Indicator signals and pre-trade risk checks")]
pub struct Cli {
    /// Log filter such as `debug` or `signalgate=trace`; overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the full indicator set over a bar file
    Indicators {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of trailing rows to print
        #[arg(long, default_value_t = 1)]
        rows: usize,
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a strategy on a bar file
    Signal {
        #[arg(short, long)]
        data: PathBuf,
        /// Defaults to the file name up to the first underscore
        #[arg(long)]
        symbol: Option<String>,
        /// Overrides `[strategy] name`
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory of `<SYMBOL>_<timeframe>.csv` files for arbitrage legs
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long, default_value = "1h")]
        timeframe: String,
        #[arg(long)]
        json: bool,
    },
    /// List strategy variants
    Strategies,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run the risk gate on a candidate order
    CheckOrder {
        /// INI with `[account]` and optional `[risk]` sections
        #[arg(short, long)]
        account: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        side: OrderSide,
        #[arg(long)]
        quantity: Decimal,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        leverage: Option<Decimal>,
        /// CSV of `created_at,symbol,realized_pnl`
        #[arg(long)]
        orders: Option<PathBuf>,
        /// Forward an accepted order to the in-memory order book
        #[arg(long)]
        submit: bool,
        #[arg(long)]
        json: bool,
    },
    /// Recommend a position fraction from trade statistics
    Size {
        #[arg(long)]
        win_rate: f64,
        #[arg(long)]
        avg_win: f64,
        #[arg(long)]
        avg_loss: f64,
        #[arg(long)]
        trades: usize,
        /// Balance to convert the fraction into a notional
        #[arg(long)]
        balance: Option<Decimal>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators {
            data,
            config,
            rows,
            json,
        } => run_indicators(&data, config.as_deref(), rows, json),
        Command::Signal {
            data,
            symbol,
            strategy,
            config,
            prices,
            timeframe,
            json,
        } => run_signal(SignalArgs {
            data: &data,
            symbol: symbol.as_deref(),
            strategy: strategy.as_deref(),
            config: config.as_deref(),
            prices: prices.as_deref(),
            timeframe: &timeframe,
            json,
        }),
        Command::Strategies => run_strategies(),
        Command::Validate { config } => run_validate(&config),
        Command::CheckOrder {
            account,
            symbol,
            side,
            quantity,
            price,
            leverage,
            orders,
            submit,
            json,
        } => {
            let mut order = CandidateOrder::new(symbol, side, quantity, price);
            order.leverage = leverage;
            run_check_order(&account, &order, orders.as_deref(), submit, json)
        }
        Command::Size {
            win_rate,
            avg_win,
            avg_loss,
            trades,
            balance,
            config,
            json,
        } => {
            let stats = TradeStats {
                trades,
                win_rate,
                avg_win,
                avg_loss,
            };
            run_size(&stats, balance, config.as_deref(), json)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EngineError> {
    FileConfigAdapter::from_file(path)
}

/// An empty configuration when no file is given, so every section takes its defaults.
fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, EngineError> {
    match path {
        Some(p) => load_config(p),
        None => FileConfigAdapter::from_string("").map_err(|reason| EngineError::ConfigParse {
            file: "<defaults>".to_string(),
            reason,
        }),
    }
}

fn load_series(path: &Path, symbol: &str) -> Result<BarSeries, EngineError> {
    BarSeries::new(symbol, read_bars(path)?)
}

fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .and_then(|stem| stem.split('_').next().map(str::to_string))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| EngineError::Io(e.into()))?;
    println!("{text}");
    Ok(())
}

fn run_indicators(data: &Path, config: Option<&Path>, rows: usize, json: bool) -> Result<ExitCode, EngineError> {
    let cfg = load_optional_config(config)?;
    let indicator_config = IndicatorConfig::from_config(&cfg)?;
    let series = load_series(data, &symbol_from_path(data))?;
    eprintln!("Loaded {} bars for {}", series.len(), series.symbol());

    let frame = compute_all(&series, &indicator_config)?;
    let tail = &frame.rows[frame.rows.len().saturating_sub(rows)..];

    if json {
        print_json(&tail)?;
        return Ok(ExitCode::SUCCESS);
    }

    for row in tail {
        let value = serde_json::to_value(row).map_err(|e| EngineError::Io(e.into()))?;
        if let serde_json::Value::Object(fields) = value {
            let present = |v: &serde_json::Value| !v.is_null() && v.as_array().is_none_or(|a| !a.is_empty());
            for (name, field) in fields.iter().filter(|(_, v)| present(v)) {
                println!("{:<22} {}", name, field);
            }
        }
        println!();
    }
    eprintln!(
        "{} supports, {} resistances detected",
        frame.levels.supports.len(),
        frame.levels.resistances.len()
    );
    Ok(ExitCode::SUCCESS)
}

struct SignalArgs<'a> {
    data: &'a Path,
    symbol: Option<&'a str>,
    strategy: Option<&'a str>,
    config: Option<&'a Path>,
    prices: Option<&'a Path>,
    timeframe: &'a str,
    json: bool,
}

fn run_signal(args: SignalArgs) -> Result<ExitCode, EngineError> {
    let cfg = load_optional_config(args.config)?;
    let name = match args.strategy {
        Some(name) => name.to_string(),
        None => read_string(&cfg, "strategy", "name")?.ok_or_else(|| EngineError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        })?,
    };
    let kind: StrategyKind = name.parse()?;

    let mut registry = StrategyRegistry::new();
    registry.register(StrategySettings::for_kind(kind, &cfg)?)?;

    let symbol = args.symbol.map(str::to_string).unwrap_or_else(|| symbol_from_path(args.data));
    let series = load_series(args.data, &symbol)?;
    let as_of = series.last().map(|b| b.open_time).unwrap_or_else(Utc::now);

    let market = args
        .prices
        .map(|dir| CsvAdapter::new(dir.to_path_buf()).with_timeframe(args.timeframe));
    let mut ctx = EvaluationContext::new(&symbol, &series, as_of);
    if let Some(market) = market.as_ref() {
        ctx = ctx.with_market(market as &dyn MarketDataPort);
    }

    let signal = registry.evaluate(kind.as_str(), &ctx)?;
    if args.json {
        print_json(&signal)?;
    } else {
        print_signal(&signal);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_signal(signal: &Signal) {
    println!(
        "{} {} @ {:.4} (confidence {:.0}%)",
        signal.action,
        signal.symbol,
        signal.price,
        signal.confidence * 100.0
    );
    println!("  {}", signal.reason);
    if let Some(levels) = &signal.risk_management {
        println!("  stop loss   {:.4}", levels.stop_loss);
        println!("  take profit {:.4}", levels.take_profit);
    }
    for (name, value) in &signal.indicators {
        println!("  {:<16} {:.4}", name, value);
    }
}

fn run_strategies() -> Result<ExitCode, EngineError> {
    let registry = StrategyRegistry::with_defaults()?;
    for kind in registry.kinds() {
        let min_bars = registry.get(kind).map(|s| s.min_bars()).unwrap_or_default();
        println!("{:<22} min bars {}", kind, min_bars);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_validate(path: &Path) -> Result<ExitCode, EngineError> {
    eprintln!("Validating configuration: {}", path.display());
    let cfg = load_config(path)?;
    validate_config(&cfg)?;
    let settings = StrategySettings::from_config(&cfg)?;
    eprintln!("Strategy: {}", settings.kind());
    eprintln!("Configuration is valid.");
    Ok(ExitCode::SUCCESS)
}

fn run_check_order(
    account: &Path,
    order: &CandidateOrder,
    orders: Option<&Path>,
    submit: bool,
    json: bool,
) -> Result<ExitCode, EngineError> {
    let cfg = load_config(account)?;
    let (accounts, user) = InMemoryAccounts::from_config(&cfg)?;
    if let Some(path) = orders {
        for record in read_order_history(path)? {
            accounts.record_order(&user, record);
        }
    }
    let gate = RiskGate::new(&accounts, &accounts).with_session(MarketSession::from_config(&cfg)?);

    let verdict = if submit {
        let desk = OrderDesk::new(gate, &accounts);
        match desk.submit(&user, order)? {
            Submission::Accepted { verdict, receipt } => {
                eprintln!("Submitted {} for {}", receipt.order_id, receipt.user_id);
                verdict
            }
            Submission::Rejected(verdict) => verdict,
        }
    } else {
        gate.validate_order(&user, order)?
    };

    if json {
        print_json(&verdict)?;
    } else {
        print_verdict(&verdict);
    }
    Ok(if verdict.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(REJECTED_EXIT)
    })
}

fn print_verdict(verdict: &RiskVerdict) {
    println!("{}", if verdict.valid { "ACCEPTED" } else { "REJECTED" });
    for (name, check) in verdict.checks.iter() {
        let mark = if check.valid { "ok" } else { "FAIL" };
        println!("  {:<14} {:<4} {}", name, mark, check.message);
    }
    println!("{}", verdict.message);
}

fn run_size(
    stats: &TradeStats,
    balance: Option<Decimal>,
    config: Option<&Path>,
    json: bool,
) -> Result<ExitCode, EngineError> {
    let cfg = load_optional_config(config)?;
    let kelly = KellyConfig::from_config(&cfg)?;
    let recommendation = kelly.recommend(stats);

    if json {
        print_json(&recommendation)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("fraction {:.4}", recommendation.fraction);
    if let Some(raw) = recommendation.kelly {
        println!("kelly    {:.4}", raw);
    }
    if let Some(reason) = &recommendation.fallback {
        println!("fallback {}", reason);
    }
    if let Some(balance) = balance {
        println!("notional {}", recommendation.notional(balance).round_dp(2));
    }
    Ok(ExitCode::SUCCESS)
}
