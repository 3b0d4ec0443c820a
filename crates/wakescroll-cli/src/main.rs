use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "wakescroll", version, about = "Wake Scroll CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prebuilt task completions and streaks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Personal goals
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Breathing sessions
    Breathe {
        #[command(subcommand)]
        action: commands::breathe::BreatheAction,
    },
    /// Reflection journal
    Reflect {
        #[command(subcommand)]
        action: commands::reflect::ReflectAction,
    },
    /// Custom weekly reminders
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Experience points
    Xp {
        #[command(subcommand)]
        action: commands::xp::XpAction,
    },
    /// Calendar views over any ledger
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Mindfulness nudge scheduling
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Summary of today's activity
    Today,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("WAKESCROLL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Breathe { action } => commands::breathe::run(action),
        Commands::Reflect { action } => commands::reflect::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Xp { action } => commands::xp::run(action),
        Commands::Calendar { action } => commands::calendar::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Today => commands::today::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
