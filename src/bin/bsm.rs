//! Command-line interface for the BSM pricing kernel.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use bsm_options::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// bsm - Black-Scholes-Merton prices, Greeks and implied volatility.
#[derive(Parser)]
#[command(name = "bsm")]
#[command(version)]
#[command(about = "European option pricing under Black-Scholes-Merton")]
#[command(long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Quote vega/rho per 1% move and theta per calendar day
    #[arg(long, global = true)]
    desk: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Contract inputs shared by the single-option commands
#[derive(clap::Args)]
struct ContractArgs {
    /// Underlying spot price
    #[arg(short, long)]
    spot: f64,

    /// Strike price
    #[arg(short = 'k', long)]
    strike: f64,

    /// Time to expiry in years
    #[arg(short, long)]
    time: f64,

    /// Continuously compounded risk-free rate
    #[arg(short, long, default_value = "0.0")]
    rate: f64,

    /// Continuous dividend yield
    #[arg(short = 'q', long, default_value = "0.0")]
    dividend: f64,

    /// Option kind (call or put)
    #[arg(short = 'K', long, default_value = "call")]
    kind: OptionType,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an option
    Price {
        #[command(flatten)]
        contract: ContractArgs,

        /// Volatility (annualized)
        #[arg(long)]
        vol: f64,
    },

    /// Price an option and compute its Greeks
    Greeks {
        #[command(flatten)]
        contract: ContractArgs,

        /// Volatility (annualized)
        #[arg(long)]
        vol: f64,
    },

    /// Solve a market price for implied volatility
    Iv {
        #[command(flatten)]
        contract: ContractArgs,

        /// Observed option price
        #[arg(short, long)]
        price: f64,

        /// Absolute price tolerance
        #[arg(long, default_value = "1e-6")]
        tolerance: f64,

        /// Iteration cap
        #[arg(long, default_value = "100")]
        max_iterations: usize,

        /// Widen the volatility bracket for extreme regimes
        #[arg(long)]
        extreme: bool,
    },

    /// Price and Greeks across a grid of spot prices
    Ladder {
        #[command(flatten)]
        contract: ContractArgs,

        /// Volatility (annualized)
        #[arg(long)]
        vol: f64,

        /// Half-width of the grid as a fraction of spot
        #[arg(long, default_value = "0.30")]
        range: f64,

        /// Number of grid points
        #[arg(long, default_value = "50")]
        steps: usize,
    },

    /// Value every contract in a JSON quote chain
    Chain {
        /// Path to the chain file
        file: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {}", e);
        }
    }

    fn convention(&self) -> GreeksConvention {
        if self.desk {
            GreeksConvention::per_percent_per_day()
        } else {
            GreeksConvention::per_unit()
        }
    }
}

impl ContractArgs {
    fn parameters(&self, vol: f64) -> BsmResult<OptionParameters> {
        OptionParameters::new(self.spot, self.strike, self.time, self.rate, self.dividend, vol, self.kind)
    }

    fn unpriced(&self) -> BsmResult<OptionParameters> {
        OptionParameters::without_volatility(self.spot, self.strike, self.time, self.rate, self.dividend, self.kind)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> BsmResult<()> {
    match &cli.command {
        Commands::Price { contract, vol } => {
            let params = contract.parameters(*vol)?;
            let priced = bs_price(&params)?;
            emit(cli.output, &priced, || print_pricing(&params, &priced))
        }

        Commands::Greeks { contract, vol } => {
            let params = contract.parameters(*vol)?;
            let valuation = bs_value_with(&params, cli.convention())?;
            emit(cli.output, &valuation, || print_valuation(&params, &valuation))
        }

        Commands::Iv {
            contract,
            price,
            tolerance,
            max_iterations,
            extreme,
        } => {
            let base = if *extreme {
                SolverConfig::extreme_regime()
            } else {
                SolverConfig::default()
            };
            let config = base
                .with_tolerance(*tolerance)
                .with_max_iterations(*max_iterations);
            let params = contract.unpriced()?;
            let result = implied_volatility_with(*price, &params, &config)?;
            emit(cli.output, &result, || print_iv(*price, &result))
        }

        Commands::Ladder {
            contract,
            vol,
            range,
            steps,
        } => {
            let params = contract.parameters(*vol)?;
            let config = LadderConfig {
                range_percent: *range,
                steps: *steps,
                convention: cli.convention(),
            };
            let ladder = spot_ladder(&params, &config)?;
            emit(cli.output, &ladder, || print_ladder(&ladder))
        }

        Commands::Chain { file } => {
            let json = fs::read_to_string(file)?;
            let chain: QuoteChain =
                serde_json::from_str(&json).map_err(|e| BsmError::serialization(e.to_string()))?;
            let config = ChainConfig {
                convention: cli.convention(),
                ..ChainConfig::default()
            };
            let rows = value_chain(&chain, &config)?;
            emit(cli.output, &rows, || print_chain(&chain, &rows))
        }
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> BsmResult<()> {
    match format {
        OutputFormat::Text => text(),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(value).map_err(|e| BsmError::serialization(e.to_string()))?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn print_contract(params: &OptionParameters) {
    println!("  Kind:      {}", params.option_type());
    println!("  Spot:      {:.4}", params.spot());
    println!("  Strike:    {:.4}", params.strike());
    println!("  Expiry:    {:.4} years", params.time_to_expiry());
    println!("  Rate:      {:.2}%", params.rate() * 100.0);
    println!("  Dividend:  {:.2}%", params.dividend_yield() * 100.0);
    println!("  Vol:       {:.2}%", params.volatility() * 100.0);
}

fn print_pricing(params: &OptionParameters, priced: &PricingResult) {
    println!("Black-Scholes-Merton Price");
    println!("==========================");
    print_contract(params);
    println!();
    println!("  Price:     {:.6}", priced.price);
    println!("  d1:        {:.6}", priced.d1);
    println!("  d2:        {:.6}", priced.d2);
    println!("  Regime:    {:?}", priced.regime);
}

fn print_valuation(params: &OptionParameters, valuation: &Valuation) {
    let g = &valuation.greeks;
    println!("Black-Scholes-Merton Greeks");
    println!("===========================");
    print_contract(params);
    println!();
    println!("  Price:     {:.6}", valuation.price);
    println!("  Delta:     {:.6}", g.delta);
    println!("  Gamma:     {:.6}", g.gamma);
    println!("  Vega:      {:.6}", g.vega);
    println!("  Theta:     {:.6}", g.theta);
    println!("  Rho:       {:.6}", g.rho);
    if let Some(vanna) = g.vanna {
        println!("  Vanna:     {:.6}", vanna);
    }
    if let Some(volga) = g.volga {
        println!("  Volga:     {:.6}", volga);
    }
}

fn print_iv(market_price: f64, result: &ImpliedVolatilityResult) {
    println!("Implied Volatility");
    println!("==================");
    println!("  Market price: {:.6}", market_price);
    match result.volatility {
        Some(vol) => println!("  Volatility:   {:.4}%", vol * 100.0),
        None => println!("  Volatility:   n/a"),
    }
    println!("  Iterations:   {}", result.iterations);
    println!("  Residual:     {:.3e}", result.residual);
    println!("  Outcome:      {:?}", result.reason);
}

fn print_ladder(ladder: &[LadderPoint]) {
    println!(
        "{:>12} {:>12} {:>10} {:>10} {:>10} {:>10}",
        "Spot", "Price", "Delta", "Gamma", "Vega", "Theta"
    );
    println!("{}", "-".repeat(69));
    for point in ladder {
        let g = &point.valuation.greeks;
        println!(
            "{:>12.4} {:>12.4} {:>10.4} {:>10.6} {:>10.4} {:>10.4}",
            point.spot, point.valuation.price, g.delta, g.gamma, g.vega, g.theta
        );
    }
}

fn print_chain(chain: &QuoteChain, rows: &[ChainRow]) {
    println!(
        "{} @ {:.2}  expiry {}  (valued {})",
        chain.underlying, chain.spot, chain.expiry, chain.valuation_date
    );
    println!(
        "{:>10} {:>8} {:>8} {:>8} | {:>10} | {:>8} {:>8} {:>8}",
        "Call Mkt", "IV", "Delta", "Theta", "Strike", "Put Mkt", "IV", "Delta"
    );
    println!("{}", "-".repeat(82));
    for row in rows {
        let (c_mkt, c_iv, c_delta, c_theta) = side_cells(row.call.as_ref());
        let (p_mkt, p_iv, p_delta, _) = side_cells(row.put.as_ref());
        println!(
            "{:>10} {:>8} {:>8} {:>8} | {:>10.2} | {:>8} {:>8} {:>8}",
            c_mkt, c_iv, c_delta, c_theta, row.strike, p_mkt, p_iv, p_delta
        );
    }
}

fn side_cells(contract: Option<&ContractValuation>) -> (String, String, String, String) {
    let dash = || "-".to_string();
    let Some(c) = contract else {
        return (dash(), dash(), dash(), dash());
    };
    let mkt = c.market_price.map_or_else(dash, |p| format!("{:.2}", p));
    let iv = c
        .volatility_used
        .map_or_else(dash, |v| format!("{:.1}%", v * 100.0));
    let (delta, theta) = match &c.valuation {
        Some(v) => (format!("{:.3}", v.greeks.delta), format!("{:.3}", v.greeks.theta)),
        None => (dash(), dash()),
    };
    (mkt, iv, delta, theta)
}
