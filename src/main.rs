use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use advisors::{
    calculate_buy_the_dip, Ahr999Calculator, DipConfig, MacroAdvisor, StrategyAdvisor,
};
use backtester::Backtester;
use configuration::Config;
use core_types::{BacktestResult, DcaConfig, Frequency, StrategyKind};
use market_data::{
    AlternativeMeClient, CoinGeckoClient, GoogleTrendsClient, MacroQuoteProvider, PriceProvider,
    SearchInterestProvider, SentimentProvider, YahooQuoteClient,
};
use web_server::AppState;

/// The main entry point for the stacker DCA engine.
#[tokio::main]
async fn main() {
    // Load environment variables (e.g. a CoinGecko API key) from .env.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match configuration::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    let outcome = match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config).await,
        Commands::Compare(args) => handle_compare(args, &config).await,
        Commands::Advise(args) => handle_advise(args, &config).await,
        Commands::Macro(args) => handle_macro(args, &config).await,
        Commands::Ahr999(args) => handle_ahr999(args, &config).await,
        Commands::Dip(args) => handle_dip(args, &config).await,
        Commands::Serve(args) => handle_serve(args, &config).await,
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Backtests DCA strategies and scores market conditions for BTC accumulation.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a single strategy over a historical range.
    Backtest(BacktestArgs),
    /// Simulate standard, smart and lump-sum side by side.
    Compare(BacktestArgs),
    /// Score current sentiment into a strategy recommendation.
    Advise(OutputArgs),
    /// Score the global macro liquidity backdrop.
    Macro(OutputArgs),
    /// Compute the Ahr999 valuation index.
    Ahr999(OutputArgs),
    /// Size an extra dip buy from a fiat reserve.
    Dip(DipArgs),
    /// Serve the JSON API.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// The start date of the simulated range (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// The end date of the simulated range (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// Buy cadence: daily, weekly, biweekly or monthly.
    #[arg(long)]
    frequency: Option<Frequency>,

    /// USD deployed per scheduled buy.
    #[arg(long)]
    amount: Option<Decimal>,

    /// Scale buys by the fear & greed index.
    #[arg(long)]
    smart: bool,

    /// Deploy the equivalent capital all at once instead.
    #[arg(long)]
    lump_sum: bool,

    /// Emit the full result as JSON instead of a summary table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct OutputArgs {
    /// Emit the full analysis as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct DipArgs {
    /// The fiat reserve available for an extra buy, in USD.
    #[arg(long)]
    fiat: Decimal,

    /// The regular per-interval DCA amount the ladder scales from.
    #[arg(long)]
    base: Option<Decimal>,

    /// Emit the full recommendation as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides the port from config.toml.
    #[arg(long)]
    port: Option<u16>,
}

// ==============================================================================
// Shared construction
// ==============================================================================

fn providers(
    config: &Config,
) -> (
    Arc<dyn PriceProvider>,
    Arc<dyn SentimentProvider>,
    Arc<dyn MacroQuoteProvider>,
    Option<Arc<dyn SearchInterestProvider>>,
) {
    let settings = &config.providers;
    let search: Option<Arc<dyn SearchInterestProvider>> = if settings.search_interest_enabled {
        Some(Arc::new(GoogleTrendsClient::new(settings)))
    } else {
        None
    };
    (
        Arc::new(CoinGeckoClient::new(settings)),
        Arc::new(AlternativeMeClient::new(settings)),
        Arc::new(YahooQuoteClient::new(settings)),
        search,
    )
}

fn fetch_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.providers.request_timeout_secs)
}

fn dca_config(args: &BacktestArgs, config: &Config) -> DcaConfig {
    let defaults = &config.dca;
    DcaConfig {
        start_date: args.from,
        end_date: args.to,
        frequency: args.frequency.unwrap_or(defaults.frequency),
        amount: args.amount.unwrap_or(defaults.amount),
        smart_dca: args.smart,
        fear_threshold: defaults.fear_threshold,
        greed_threshold: defaults.greed_threshold,
        fear_multiplier: defaults.fear_multiplier,
        greed_multiplier: defaults.greed_multiplier,
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_backtest(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let (prices, sentiment, _, _) = providers(config);
    let engine = Backtester::new(prices, sentiment);
    let plan = dca_config(&args, config);

    let kind = if args.lump_sum {
        StrategyKind::LumpSum
    } else if args.smart {
        StrategyKind::Smart
    } else {
        StrategyKind::Standard
    };

    let result = engine.simulate(&plan, kind).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_results_table(&[&result]);
    }
    Ok(())
}

async fn handle_compare(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let (prices, sentiment, _, _) = providers(config);
    let engine = Backtester::new(prices, sentiment);
    let plan = dca_config(&args, config);

    let comparison = engine.compare(&plan).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_results_table(&[
            &comparison.standard,
            &comparison.smart,
            &comparison.lump_sum,
        ]);
    }
    Ok(())
}

fn print_results_table(results: &[&BacktestResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Strategy",
        "Buys",
        "Invested (USD)",
        "BTC",
        "Final value (USD)",
        "ROI %",
        "Annualized %",
        "Max drawdown %",
        "Avg cost (USD)",
    ]);
    for result in results {
        table.add_row(vec![
            result.strategy.to_string(),
            result.buys.len().to_string(),
            format!("{:.2}", result.total_invested),
            format!("{:.8}", result.total_btc),
            format!("{:.2}", result.final_value),
            format!("{:.2}", result.roi),
            format!("{:.2}", result.annualized_return),
            format!("{:.2}", result.max_drawdown),
            format!("{:.2}", result.average_cost),
        ]);
    }
    println!("{table}");
}

async fn handle_advise(args: OutputArgs, config: &Config) -> anyhow::Result<()> {
    let (prices, sentiment, _, _) = providers(config);
    let advisor = StrategyAdvisor::new(prices, sentiment, fetch_timeout(config));

    let analysis = advisor.analyze().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!(
        "Signal: {} ({}% confidence)",
        analysis.signal_label, analysis.confidence
    );
    println!(
        "FGI {} ({}), trend {:?}, 7d avg {}",
        analysis.fgi.value, analysis.fgi.label, analysis.fgi.trend, analysis.fgi.avg_7d
    );
    println!(
        "BTC ${:.0} ({:+.2}% 24h)",
        analysis.btc.price, analysis.btc.change_24h
    );
    println!(
        "Suggested plan: {} buys, fear <= {} at {}x, greed >= {} at {}x",
        analysis.suggestion.frequency,
        analysis.suggestion.fear_threshold,
        analysis.suggestion.fear_multiplier,
        analysis.suggestion.greed_threshold,
        analysis.suggestion.greed_multiplier
    );
    for line in &analysis.suggestion.reasoning {
        println!("  - {line}");
    }
    Ok(())
}

async fn handle_macro(args: OutputArgs, config: &Config) -> anyhow::Result<()> {
    let (_, _, quotes, search) = providers(config);
    let advisor = MacroAdvisor::new(
        quotes,
        search,
        config.fallbacks.clone(),
        fetch_timeout(config),
    );

    let analysis = advisor.analyze().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Signal: {}", analysis.signal_label);
    println!(
        "Dollar index {:.2} ({:+.2}%), long yield {:.2}% ({:+.2}%), implied rate {:.2}% ({:+.1}bps)",
        analysis.currency_index.value,
        analysis.currency_index.change_percent,
        analysis.long_yield.value,
        analysis.long_yield.change_percent,
        analysis.implied_policy_rate.value,
        analysis.implied_policy_rate.change_bps
    );
    for line in &analysis.reasoning {
        println!("  - {line}");
    }
    Ok(())
}

async fn handle_ahr999(args: OutputArgs, config: &Config) -> anyhow::Result<()> {
    let (prices, _, _, _) = providers(config);
    let calculator = Ahr999Calculator::new(prices, fetch_timeout(config));

    let data = calculator.calculate().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("Ahr999 {:.3}: {}", data.value, data.zone_label);
    println!(
        "Price ${:.0}, 200-day MA ${:.0}, model fair value ${:.0}, coin age {} days",
        data.price, data.ma200, data.expected_price, data.coin_age_days
    );
    Ok(())
}

async fn handle_dip(args: DipArgs, config: &Config) -> anyhow::Result<()> {
    let (prices, sentiment, _, _) = providers(config);

    // The rule itself is pure; only the market snapshot is fetched live.
    let (btc, fgi) = tokio::try_join!(prices.current_price(), sentiment.current())?;

    let action = calculate_buy_the_dip(
        &DipConfig {
            available_fiat: args.fiat,
            base_amount: args.base.unwrap_or(config.dca.amount),
            current_fgi: fgi.value,
            current_price: btc.price,
            extreme_fear_threshold: None,
            fear_threshold: None,
        },
        &config.dip,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&action)?);
        return Ok(());
    }

    println!(
        "Action: {:?} (${:.2}), risk {:?} | BTC ${:.0}, FGI {} ({})",
        action.action, action.recommended_amount, action.risk_level, btc.price, fgi.value, fgi.label
    );
    for line in &action.reasoning {
        println!("  - {line}");
    }
    Ok(())
}

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let (prices, sentiment, quotes, search) = providers(config);
    let timeout = fetch_timeout(config);

    let state = AppState {
        backtester: Backtester::new(prices.clone(), sentiment.clone()),
        strategy_advisor: StrategyAdvisor::new(prices.clone(), sentiment.clone(), timeout),
        macro_advisor: MacroAdvisor::new(quotes, search, config.fallbacks.clone(), timeout),
        ahr999: Ahr999Calculator::new(prices.clone(), timeout),
        prices,
        sentiment,
        dip_defaults: config.dip.clone(),
    };

    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port).parse()?;

    web_server::run_server(addr, Arc::new(state)).await
}
