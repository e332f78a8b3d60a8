//! MatchEdge CLI - Command-line interface for match value-bet analysis

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use matchedge::backtesting::{analyze_by_odds_range, SimulationConfig, Simulator};
use matchedge::data::{Store, SyntheticSampler};
use matchedge::error::{parse_odds, validate_team_name};
use matchedge::models::{PredictionRecord, Signal};
use matchedge::session::{Session, Settlement, TrainingReport};
use matchedge::settings::{Settings, Theme};

/// Fixed wait shown before an analysis completes
const ANALYSIS_DELAY: Duration = Duration::from_millis(1500);
const RECENT_TRANSACTIONS: usize = 10;
const RECENT_OUTCOMES: usize = 10;
const WEIGHT_BAR_WIDTH: f64 = 40.0;

#[derive(Parser)]
#[command(name = "matchedge")]
#[command(author, version, about = "Match value-bet assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding model.json, bankroll.json and settings.json
    #[arg(long, env = "MATCHEDGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Skip the analysis delay
    #[arg(long)]
    no_delay: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Outcome {
    Win,
    Loss,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a fixture and recommend a stake
    Analyze {
        /// Home team
        home: String,

        /// Away team
        away: String,

        /// Decimal odds offered on the home win (e.g. 2.10 or 2,10)
        #[arg(short, long)]
        odds: String,

        /// Train immediately on the observed result
        #[arg(short, long, value_enum)]
        result: Option<Outcome>,

        /// Seed for the synthetic match data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Add funds to the bankroll
    Deposit { amount: f64 },

    /// Take funds out of the bankroll
    Withdraw { amount: f64 },

    /// Show balance, performance and recent transactions
    Bankroll {
        /// Number of transactions to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show learned weights and outcome history
    Stats {
        /// Number of outcomes to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Restore model and bankroll defaults (settings are kept)
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Run the staking and learning loop on synthetic fixtures
    Simulate {
        /// Number of fixtures
        #[arg(long, default_value = "200")]
        rounds: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Starting bankroll
        #[arg(long, default_value = "1000")]
        bankroll: f64,

        /// Learning rate (defaults to the saved setting)
        #[arg(long)]
        learning_rate: Option<f64>,

        /// Kelly fraction (defaults to the saved setting)
        #[arg(long)]
        kelly: Option<f64>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,

    /// Change one or more settings
    Set {
        #[arg(long)]
        learning_rate: Option<f64>,

        #[arg(long)]
        kelly_fraction: Option<f64>,

        /// Data-provider key (stored, never displayed)
        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        notifications: Option<bool>,

        /// dark or light
        #[arg(long)]
        theme: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let store = match cli.data_dir {
        Some(ref dir) => Store::new(dir),
        None => Store::open_default().context("Failed to resolve a data directory; pass --data-dir")?,
    };

    println!(
        "{}",
        format!("MatchEdge CLI v{}", env!("CARGO_PKG_VERSION")).cyan().bold()
    );
    println!();

    let delay = !cli.no_delay;

    if cli.interactive {
        let mut session = Session::open_synthetic(store);
        return run_interactive(&mut session, delay);
    }

    let Some(command) = cli.command else {
        let session = Session::open_synthetic(store);
        print_home(&session);
        return Ok(());
    };

    match command {
        Commands::Analyze {
            home,
            away,
            odds,
            result,
            seed,
        } => {
            let sampler = match seed {
                Some(seed) => SyntheticSampler::seeded(seed),
                None => SyntheticSampler::from_entropy(),
            };
            let mut session = Session::open(store, sampler);
            let odds = parse_odds(&odds)?;

            wait_for_analysis(delay)?;
            let prediction = session.analyze(&home, &away, odds)?;
            print_prediction(prediction);

            if let Some(outcome) = result {
                let report = session.train(matches!(outcome, Outcome::Win))?;
                print_training_report(&report);
            }
        }
        Commands::Deposit { amount } => {
            let mut session = Session::open_synthetic(store);
            let persisted = session.deposit(amount)?;
            println!(
                "{} {:.2} (balance {:.2})",
                "Deposited".green(),
                amount,
                session.bankroll().current_balance
            );
            warn_if_unsaved(persisted);
        }
        Commands::Withdraw { amount } => {
            let mut session = Session::open_synthetic(store);
            let persisted = session.withdraw(amount)?;
            println!(
                "{} {:.2} (balance {:.2})",
                "Withdrew".green(),
                amount,
                session.bankroll().current_balance
            );
            warn_if_unsaved(persisted);
        }
        Commands::Bankroll { limit } => {
            print_bankroll(&Session::open_synthetic(store), limit);
        }
        Commands::Stats { limit } => {
            print_stats(&Session::open_synthetic(store), limit);
        }
        Commands::Settings { action } => {
            let mut session = Session::open_synthetic(store);
            match action {
                None | Some(SettingsAction::Show) => print_settings(session.settings()),
                Some(SettingsAction::Set {
                    learning_rate,
                    kelly_fraction,
                    api_key,
                    notifications,
                    theme,
                }) => {
                    let mut settings = session.settings().clone();
                    if let Some(rate) = learning_rate {
                        settings.learning_rate = rate;
                    }
                    if let Some(fraction) = kelly_fraction {
                        settings.kelly_fraction = fraction;
                    }
                    if let Some(key) = api_key {
                        settings.api_key = key;
                    }
                    if let Some(flag) = notifications {
                        settings.notifications = flag;
                    }
                    if let Some(theme) = theme {
                        settings.theme = theme.parse::<Theme>()?;
                    }

                    let persisted = session.update_settings(settings)?;
                    println!("{}", "Settings saved.".green());
                    warn_if_unsaved(persisted);
                    print_settings(session.settings());
                }
            }
        }
        Commands::Reset { yes } => {
            let mut session = Session::open_synthetic(store);
            run_reset(&mut session, yes)?;
        }
        Commands::Simulate {
            rounds,
            seed,
            bankroll,
            learning_rate,
            kelly,
        } => {
            let session = Session::open_synthetic(store);
            let settings = session.settings();
            let config = SimulationConfig {
                rounds,
                seed,
                starting_bankroll: bankroll,
                learning_rate: learning_rate.unwrap_or(settings.learning_rate),
                kelly_fraction: kelly.unwrap_or(settings.kelly_fraction),
                ..Default::default()
            };
            run_simulation(config)?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn wait_for_analysis(enabled: bool) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    let pb = spinner("Analyzing match data...")?;
    std::thread::sleep(ANALYSIS_DELAY);
    pb.finish_and_clear();
    Ok(())
}

fn warn_if_unsaved(persisted: bool) {
    if !persisted {
        println!(
            "{}",
            "Warning: changes could not be saved and will be lost on exit.".yellow()
        );
    }
}

fn signed_color(value: f64, text: String) -> colored::ColoredString {
    if value > 0.0 {
        text.green()
    } else if value < 0.0 {
        text.red()
    } else {
        text.normal()
    }
}

fn print_home(session: &Session) {
    let bankroll = session.bankroll();
    let model = session.model();

    println!("{}", "Dashboard".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("{:<16} {:>12.2}", "Balance", bankroll.current_balance);
    println!("{:<16} {:>11.1}%", "Accuracy", model.accuracy * 100.0);
    println!(
        "{:<16} {:>12}",
        "ROI",
        signed_color(bankroll.roi, format!("{:.1}%", bankroll.roi))
    );
    println!("{:<16} {:>12}", "Total bets", bankroll.total_bets);
    println!("{:<16} {:>12}", "Learning cycles", model.total_cycles);
    println!();
    println!(
        "{}",
        "Run with --help for commands, or -i for interactive mode.".dimmed()
    );
}

fn print_prediction(prediction: &PredictionRecord) {
    println!(
        "{}: {} @ {:.2}",
        "Analysis".green(),
        prediction.match_label().bold(),
        prediction.odds
    );
    println!();

    println!("{}", "Factor breakdown:".yellow().bold());
    println!("{:<14} {:>12}", "Factor", "Contribution");
    println!("{}", "-".repeat(28));
    for (factor, contribution) in &prediction.factors {
        println!("{:<14} {:>11.2}%", factor.label(), contribution * 100.0);
    }
    println!();

    println!(
        "{:<20} {:>10.1}%",
        "Win probability",
        prediction.probability * 100.0
    );
    println!(
        "{:<20} {:>11}",
        "Expected value",
        signed_color(prediction.ev, format!("{:+.1}%", prediction.ev * 100.0))
    );
    println!("{:<20} {:>11.2}", "Confidence", prediction.confidence());
    println!("{:<20} {:>10.1}%", "Kelly fraction", prediction.kelly * 100.0);
    println!("{:<20} {:>11.2}", "Recommended stake", prediction.stake);
    println!();

    match prediction.signal() {
        Signal::Strong => println!(
            "{}",
            format!("STRONG SIGNAL: {}", prediction.home).green().bold()
        ),
        Signal::Moderate => println!(
            "{}",
            format!("Moderate signal: {}", prediction.home).yellow().bold()
        ),
        Signal::NoValue => println!("{}", "No value at these odds".red()),
    }
    if prediction.is_value_bet() && prediction.stake == 0.0 {
        println!("{}", "(deposit funds to get a stake recommendation)".dimmed());
    }
}

fn print_training_report(report: &TrainingReport) {
    println!();
    println!(
        "{}: {} -> {}",
        "Result recorded".green(),
        report.match_label,
        report.result.to_string().bold()
    );

    match &report.settlement {
        Settlement::NoStake => println!("No stake was placed."),
        Settlement::Settled { pnl } => println!(
            "Bet settled: {}",
            signed_color(*pnl, format!("{:+.2}", pnl))
        ),
        Settlement::Declined(e) => println!("{} {}", "Bet not settled:".yellow(), e),
    }

    println!(
        "Accuracy {:.1}% over {} cycles | ROI {:.1}% | Balance {:.2}",
        report.accuracy * 100.0,
        report.total_cycles,
        report.roi,
        report.balance
    );
    warn_if_unsaved(report.persisted);
}

fn print_bankroll(session: &Session, limit: usize) {
    let bankroll = session.bankroll();

    println!("{}", "Bankroll".yellow().bold());
    println!("{}", "-".repeat(40));
    println!(
        "{:<16} {:>12.2} ({})",
        "Balance",
        bankroll.current_balance,
        signed_color(bankroll.profit(), format!("{:+.2}", bankroll.profit()))
    );
    println!("{:<16} {:>12.2}", "Initial", bankroll.initial_balance);
    println!("{:<16} {:>11.1}%", "ROI", bankroll.roi);
    println!("{:<16} {:>11.1}%", "Win rate", bankroll.win_rate);
    println!("{:<16} {:>12}", "Total bets", bankroll.total_bets);
    println!();

    println!("{}", "Recent transactions:".yellow().bold());
    if bankroll.transactions.is_empty() {
        println!("{}", "(no transactions yet)".dimmed());
        return;
    }

    println!("{:<18} {:<12} {:>12}", "Date", "Type", "Amount");
    println!("{}", "-".repeat(44));
    for tx in bankroll.recent_transactions(limit) {
        let date = tx
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<18} {:<12} {:>12}",
            date,
            tx.kind.to_string(),
            signed_color(tx.amount, format!("{:+.2}", tx.amount))
        );
    }
}

fn print_stats(session: &Session, limit: usize) {
    let model = session.model();
    let bankroll = session.bankroll();

    println!("{}", "Learned weights:".yellow().bold());
    println!("{}", "-".repeat(60));
    for (factor, weight) in model.weights.ranked() {
        let bar = "█".repeat((weight * WEIGHT_BAR_WIDTH).round() as usize);
        println!("{:<14} {:>7.4}  {}", factor.label(), weight, bar.cyan());
    }
    println!();

    println!("{:<16} {:>12}", "Cycles", model.total_cycles);
    println!("{:<16} {:>11.1}%", "Accuracy", model.accuracy * 100.0);
    println!("{:<16} {:>12.2}", "Total wagered", bankroll.total_wagered);
    println!("{:<16} {:>12.2}", "Total won", bankroll.total_won);
    println!();

    println!("{}", "Recent outcomes:".yellow().bold());
    if model.history.is_empty() {
        println!("{}", "(no outcomes recorded yet)".dimmed());
        return;
    }
    for outcome in model.recent_history(limit) {
        let result = if outcome.result.is_win() {
            "win".green()
        } else {
            "loss".red()
        };
        println!(
            "{}  {:<32} {}",
            outcome.timestamp.format("%Y-%m-%d %H:%M"),
            outcome.match_label,
            result
        );
    }
}

fn print_settings(settings: &Settings) {
    println!("{}", "Settings".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("{:<16} {:>12.3}", "Learning rate", settings.learning_rate);
    println!("{:<16} {:>12.2}", "Kelly fraction", settings.kelly_fraction);
    println!(
        "{:<16} {:>12}",
        "API key",
        if settings.has_api_key() { "set" } else { "not set" }
    );
    println!("{:<16} {:>12}", "Notifications", settings.notifications);
    println!("{:<16} {:>12}", "Theme", settings.theme.to_string());
}

fn run_reset(session: &mut Session, yes: bool) -> Result<()> {
    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Reset the model and bankroll? Settings are kept.")
            .default(false)
            .interact()?;

    if !confirmed {
        println!("Reset cancelled.");
        return Ok(());
    }

    let persisted = session.reset();
    println!("{}", "Model and bankroll reset to defaults.".green());
    warn_if_unsaved(persisted);
    Ok(())
}

fn run_simulation(config: SimulationConfig) -> Result<()> {
    println!("{}", "Running simulation...".green());

    let simulator = Simulator::new(config)?;

    let pb = spinner("Simulating fixtures...")?;
    let result = simulator.run().context("Simulation failed")?;
    pb.finish_and_clear();

    simulator.print_summary(&result);

    let odds_analysis = analyze_by_odds_range(&result.rounds);
    if !odds_analysis.is_empty() {
        println!("\n{}", "Analysis by Odds Range:".yellow().bold());
        println!(
            "{:>16} {:>8} {:>8} {:>10} {:>12} {:>10}",
            "Range", "Bets", "Wins", "Hit Rate", "Profit", "ROI"
        );
        println!("{}", "-".repeat(69));
        for a in &odds_analysis {
            println!(
                "{:>16} {:>8} {:>8} {:>9.1}% {:>12.2} {:>9.1}%",
                a.key,
                a.bets,
                a.wins,
                a.hit_rate * 100.0,
                a.profit,
                a.roi * 100.0
            );
        }
    }

    Ok(())
}

/// Interactive screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Scanner,
    Learning,
    Bankroll,
    Stats,
    Settings,
}

impl Screen {
    /// Destinations offered from the home screen
    const MENU: [Screen; 5] = [
        Screen::Scanner,
        Screen::Learning,
        Screen::Bankroll,
        Screen::Stats,
        Screen::Settings,
    ];

    fn title(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Scanner => "Analyze a match",
            Screen::Learning => "Record a result",
            Screen::Bankroll => "Bankroll",
            Screen::Stats => "Statistics",
            Screen::Settings => "Settings",
        }
    }
}

fn run_interactive(session: &mut Session, delay: bool) -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!();

    let theme = ColorfulTheme::default();
    let mut screen = Screen::Home;

    loop {
        screen = match screen {
            Screen::Home => {
                print_home(session);
                println!();

                let mut options: Vec<&str> = Screen::MENU.iter().map(|s| s.title()).collect();
                options.push("Quit");

                let selection = Select::with_theme(&theme)
                    .with_prompt("What would you like to do?")
                    .items(&options)
                    .default(0)
                    .interact()?;

                match Screen::MENU.get(selection) {
                    Some(next) => *next,
                    None => {
                        println!("Goodbye!");
                        break;
                    }
                }
            }
            Screen::Scanner => scanner_screen(session, &theme, delay)?,
            Screen::Learning => learning_screen(session, &theme)?,
            Screen::Bankroll => bankroll_screen(session, &theme)?,
            Screen::Stats => {
                println!();
                print_stats(session, RECENT_OUTCOMES);
                println!();

                let selection = Select::with_theme(&theme)
                    .items(&["Back", "Reset model and bankroll"])
                    .default(0)
                    .interact()?;
                if selection == 1 {
                    run_reset(session, false)?;
                }
                Screen::Home
            }
            Screen::Settings => settings_screen(session, &theme)?,
        };
        println!();
    }

    Ok(())
}

fn prompt_team(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    let name: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .validate_with(|input: &String| validate_team_name(input).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;
    Ok(name)
}

fn scanner_screen(session: &mut Session, theme: &ColorfulTheme, delay: bool) -> Result<Screen> {
    let home = prompt_team(theme, "Home team")?;
    let away = prompt_team(theme, "Away team")?;
    let odds_text: String = Input::with_theme(theme)
        .with_prompt("Odds (decimal)")
        .validate_with(|input: &String| parse_odds(input).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;
    let odds = parse_odds(&odds_text)?;

    println!();
    wait_for_analysis(delay)?;
    match session.analyze(&home, &away, odds) {
        Ok(prediction) => {
            print_prediction(prediction);
            Ok(Screen::Learning)
        }
        Err(e) => {
            println!("{} {}", "Error:".red(), e);
            Ok(Screen::Home)
        }
    }
}

fn learning_screen(session: &mut Session, theme: &ColorfulTheme) -> Result<Screen> {
    let Some(pending) = session.pending() else {
        println!("{}", "No pending prediction. Analyze a match first.".yellow());
        return Ok(Screen::Home);
    };

    println!();
    let prompt = format!("Outcome of {}?", pending.match_label());
    let selection = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&["Win", "Loss", "Later", "Discard"])
        .default(0)
        .interact()?;

    match selection {
        2 => return Ok(Screen::Home),
        3 => {
            if let Some(discarded) = session.discard_pending() {
                println!("Discarded {} without training.", discarded.match_label());
            }
            return Ok(Screen::Home);
        }
        _ => {}
    }

    let report = session.train(selection == 0)?;
    print_training_report(&report);
    Ok(Screen::Home)
}

fn bankroll_screen(session: &mut Session, theme: &ColorfulTheme) -> Result<Screen> {
    println!();
    print_bankroll(session, RECENT_TRANSACTIONS);
    println!();

    let selection = Select::with_theme(theme)
        .items(&["Deposit", "Withdraw", "Back"])
        .default(0)
        .interact()?;

    if selection == 2 {
        return Ok(Screen::Home);
    }

    let amount: f64 = Input::with_theme(theme)
        .with_prompt("Amount")
        .interact_text()?;

    let result = if selection == 0 {
        session.deposit(amount)
    } else {
        session.withdraw(amount)
    };

    match result {
        Ok(persisted) => warn_if_unsaved(persisted),
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
    Ok(Screen::Bankroll)
}

fn settings_screen(session: &mut Session, theme: &ColorfulTheme) -> Result<Screen> {
    println!();
    print_settings(session.settings());
    println!();

    let options = [
        "Learning rate",
        "Kelly fraction",
        "API key",
        "Notifications",
        "Theme",
        "Back",
    ];
    let selection = Select::with_theme(theme)
        .with_prompt("Change which setting?")
        .items(&options)
        .default(options.len() - 1)
        .interact()?;

    let mut settings = session.settings().clone();
    match selection {
        0 => {
            settings.learning_rate = Input::with_theme(theme)
                .with_prompt("Learning rate (0-1)")
                .default(settings.learning_rate)
                .interact_text()?;
        }
        1 => {
            settings.kelly_fraction = Input::with_theme(theme)
                .with_prompt("Kelly fraction (0-1]")
                .default(settings.kelly_fraction)
                .interact_text()?;
        }
        2 => {
            settings.api_key = Password::with_theme(theme)
                .with_prompt("API key")
                .allow_empty_password(true)
                .interact()?;
        }
        3 => {
            settings.notifications = Confirm::with_theme(theme)
                .with_prompt("Enable notifications?")
                .default(settings.notifications)
                .interact()?;
        }
        4 => {
            let themes = [Theme::Dark, Theme::Light];
            let current = themes.iter().position(|t| *t == settings.theme).unwrap_or(0);
            let names: Vec<String> = themes.iter().map(|t| t.to_string()).collect();
            let picked = Select::with_theme(theme)
                .with_prompt("Theme")
                .items(&names)
                .default(current)
                .interact()?;
            settings.theme = themes[picked];
        }
        _ => return Ok(Screen::Home),
    }

    match session.update_settings(settings) {
        Ok(persisted) => {
            println!("{}", "Settings saved.".green());
            warn_if_unsaved(persisted);
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
    Ok(Screen::Settings)
}
