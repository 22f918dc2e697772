use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fastrack_core::catalog;
use fastrack_core::export::{export_history_csv, export_journal_csv};
use fastrack_core::format::{format_clock, format_compact, format_hours_minutes, share_message};
use fastrack_core::journal::water_liters;
use fastrack_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fastrack")]
#[command(about = "Intermittent fasting timer and health journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 timestamp (for testing)
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List fasting plans
    Plans,

    /// Start a fast
    Start {
        /// Plan name from `fastrack plans` (defaults to the configured plan)
        #[arg(long)]
        plan: Option<String>,
    },

    /// Show the running fast (default)
    Status,

    /// Follow the running fast live, one line per tick
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<usize>,
    },

    /// End the running fast and record it
    End,

    /// List completed fasts, newest first
    History {
        /// Show at most this many fasts
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Totals and the last seven days
    Stats,

    /// Metabolic milestones for the running fast
    Timeline,

    /// Suggested meals for breaking a fast
    Menu,

    /// Daily health journal
    Journal {
        #[command(subcommand)]
        command: JournalCommand,
    },

    /// Export data to CSV
    Export {
        /// Write completed fasts to this file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Write journal entries to this file
        #[arg(long)]
        journal: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum JournalCommand {
    /// Show one day's entry
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the seven days around a date
    Week {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add or remove a unit of water
    Water {
        #[arg(value_enum)]
        action: WaterAction,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record body weight (kg)
    Weight {
        kg: f64,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record body measurements (cm); omitted values are kept
    Measure {
        #[arg(long)]
        chest: Option<f64>,
        #[arg(long)]
        waist: Option<f64>,
        #[arg(long)]
        hips: Option<f64>,
        #[arg(long)]
        thigh: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record blood ketones (mmol/L) and glucose (mg/dL)
    Blood {
        #[arg(long)]
        ketones: Option<f64>,
        #[arg(long)]
        glucose: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record electrolytes (mg)
    Electrolytes {
        #[arg(long)]
        sodium: Option<f64>,
        #[arg(long)]
        potassium: Option<f64>,
        #[arg(long)]
        magnesium: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WaterAction {
    Add,
    Remove,
}

/// Wall clock, or a fixed pretend "now"
#[derive(Clone, Copy)]
struct Clock {
    pretend: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl Clock {
    fn new(pretend_now: Option<DateTime<Utc>>) -> Self {
        Self {
            pretend: pretend_now.map(|t| (t, Utc::now())),
        }
    }

    /// The pretend time exactly when one was given, else the wall clock
    fn now(&self) -> DateTime<Utc> {
        match self.pretend {
            Some((pretend, _)) => pretend,
            None => Utc::now(),
        }
    }

    /// Map a live wall-clock reading onto the pretend timeline
    fn shift(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self.pretend {
            Some((pretend, anchor)) => pretend + (t - anchor),
            None => t,
        }
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

struct App {
    config: Config,
    data_dir: PathBuf,
    clock: Clock,
}

impl App {
    fn engine(&self) -> Result<FastingEngine<FileStore>> {
        FastingEngine::open(FileStore::new(&self.data_dir), self.config.default_plan()?)
    }

    fn journal(&self) -> Result<Journal<FileStore>> {
        Journal::open(FileStore::new(&self.data_dir))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    fastrack_core::logging::init_with_level(fastrack_core::logging::level_for_verbosity(
        cli.verbose,
    ));

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let app = App {
        config,
        data_dir,
        clock: Clock::new(cli.now),
    };

    match cli.command {
        Some(Commands::Plans) => cmd_plans(&app),
        Some(Commands::Start { plan }) => cmd_start(&app, plan),
        Some(Commands::Status) | None => cmd_status(&app),
        Some(Commands::Watch { ticks }) => cmd_watch(&app, ticks),
        Some(Commands::End) => cmd_end(&app),
        Some(Commands::History { limit }) => cmd_history(&app, limit),
        Some(Commands::Stats) => cmd_stats(&app),
        Some(Commands::Timeline) => cmd_timeline(&app),
        Some(Commands::Menu) => cmd_menu(),
        Some(Commands::Journal { command }) => cmd_journal(&app, command),
        Some(Commands::Export { history, journal }) => cmd_export(&app, history, journal),
    }
}

fn cmd_plans(app: &App) -> Result<()> {
    let engine = app.engine()?;
    for plan in catalog::plans() {
        let marker = if *plan == *engine.selected_plan() { "*" } else { " " };
        println!(
            "{} {:<9} {:>3}h  {}",
            marker, plan.name, plan.target_hours, plan.description
        );
    }
    Ok(())
}

fn cmd_start(app: &App, plan_name: Option<String>) -> Result<()> {
    let mut engine = app.engine()?;
    if let Some(name) = plan_name {
        engine.select_plan(catalog::plan_by_name(&name)?.clone())?;
    }

    let plan = engine.selected_plan().clone();
    let active = engine.start_fast(plan, app.clock.now())?;

    println!("✓ Fast started: {}", active.plan.name);
    println!("  Started: {}", local_time(active.start_time));
    println!("  Target:  {}", local_time(active.expected_end()));
    Ok(())
}

fn cmd_status(app: &App) -> Result<()> {
    let engine = app.engine()?;

    if let Some(user) = &app.config.user {
        println!("Hi, {}!", user.name);
    }

    let active = match engine.active() {
        Some(active) => active,
        None => {
            let plan = engine.selected_plan();
            println!("No fast running.");
            println!(
                "  Selected plan: {} ({})",
                plan.name,
                format_compact(engine.current_total_target())
            );
            println!("  Run `fastrack start` to begin.");
            return Ok(());
        }
    };

    let now = app.clock.now();
    let progress = engine.progress(now)?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  FASTING: {}", active.plan.name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Elapsed:   {}", format_clock(progress.elapsed_seconds));
    println!("  Remaining: {}", format_clock(progress.remaining_seconds));
    println!("  Progress:  {:.1}%", progress.percent);
    println!("  Started:   {}", local_time(active.start_time));
    println!("  Ends:      {}", local_time(progress.expected_end));
    println!();
    print_phase(catalog::default_timeline().resolve_seconds(progress.elapsed_seconds));
    println!();
    Ok(())
}

fn print_phase(status: PhaseStatus<'_>) {
    match status.phase {
        Some(phase) => {
            println!("  Phase: {} ({}h+)", phase.title, phase.threshold_hours);
            println!("    {}", phase.description);
            for benefit in &phase.benefits {
                println!("    • {}", benefit);
            }
        }
        None => {
            println!("  Phase: Preparing the body");
            println!("    Still running on glucose from your last meal.");
        }
    }

    if let (Some(next), Some(hours)) = (status.next_phase, status.hours_until_next) {
        println!(
            "  Next:  {} in {} ({:.0}% there)",
            next.title,
            format_hours_minutes((hours * 3600.0) as u64),
            status.progress_percent
        );
    }
}

fn cmd_watch(app: &App, max_ticks: Option<usize>) -> Result<()> {
    let mut engine = app.engine()?;
    let ticks = engine.start_ticker(app.config.tick_interval())?;
    let timeline = catalog::default_timeline();

    for (count, tick) in ticks.iter().enumerate() {
        let progress = engine.progress(app.clock.shift(tick))?;
        let status = timeline.resolve_seconds(progress.elapsed_seconds);
        let phase = status.phase.map_or("Preparing the body", |p| p.title.as_str());
        println!(
            "{}  {:>5.1}%  {}",
            format_clock(progress.elapsed_seconds),
            progress.percent,
            phase
        );

        if max_ticks.map_or(false, |max| count + 1 >= max) {
            break;
        }
    }

    engine.stop_ticker();
    Ok(())
}

fn cmd_end(app: &App) -> Result<()> {
    let mut engine = app.engine()?;
    let completed = engine.end_fast(app.clock.now())?;

    println!("✓ Fast completed: {}", completed.plan().name);
    println!(
        "  Duration: {} ({:.0}% of target)",
        format_compact(completed.duration_seconds),
        completed.achieved_percent()
    );
    println!();
    println!("  {}", share_message(&completed, catalog::quote_for(&completed)));
    Ok(())
}

fn cmd_history(app: &App, limit: Option<usize>) -> Result<()> {
    let engine = app.engine()?;
    let history = engine.history();

    if history.is_empty() {
        println!("No completed fasts yet.");
        return Ok(());
    }

    for fast in history.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{}  {:<9} {:>8}  {:>4.0}%",
            local_time(fast.start_time()),
            fast.plan().name,
            format_hours_minutes(fast.duration_seconds),
            fast.achieved_percent()
        );
    }
    Ok(())
}

fn cmd_stats(app: &App) -> Result<()> {
    let engine = app.engine()?;
    let stats = HistoryStats::from_history(engine.history(), &Local);
    let (days, hours) = stats.total_days_and_hours();

    println!("Total fasts:     {}", stats.total_fasts);
    println!("Longest fast:    {}h", stats.longest_fast_hours());
    println!("Total time:      {}d {}h", days, hours);
    println!("Days fasted:     {}", stats.days_with_fasts);
    println!();

    for bar in last_seven_days(engine.history(), app.clock.today(), &Local) {
        let width = (bar.height_percent() / 5.0).round() as usize;
        println!(
            "{} {}  {:<20} {:.1}h",
            bar.date.format("%a"),
            if bar.is_today { ">" } else { " " },
            "█".repeat(width),
            bar.hours
        );
    }
    Ok(())
}

fn cmd_timeline(app: &App) -> Result<()> {
    let engine = app.engine()?;
    let elapsed_hours = match engine.active() {
        Some(_) => engine.tick(app.clock.now())? as f64 / 3600.0,
        None => 0.0,
    };

    let milestones = catalog::default_timeline().milestones(elapsed_hours, engine.active().is_some());
    for (phase, state) in milestones {
        let marker = match state {
            MilestoneState::Reached => "[x]",
            MilestoneState::Next => "[>]",
            MilestoneState::Upcoming => "[ ]",
        };
        println!("{} {:>3}h  {}", marker, phase.threshold_hours, phase.title);
        println!("         {}", phase.description);
    }
    Ok(())
}

fn cmd_menu() -> Result<()> {
    for meal in catalog::break_fast_menu() {
        println!("{} {}", meal.emoji, meal.title);
        for item in &meal.items {
            println!("    - {}", item);
        }
    }
    println!();
    println!("Chew slowly and drink plenty of water through the day.");
    Ok(())
}

fn cmd_journal(app: &App, command: JournalCommand) -> Result<()> {
    let mut journal = app.journal()?;
    let today = app.clock.today();

    let entry = match command {
        JournalCommand::Show { date } => journal.entry(date.unwrap_or(today)),
        JournalCommand::Week { date } => {
            for log in journal.week_around(date.unwrap_or(today)) {
                println!(
                    "{}  water {:>2}  weight {}",
                    log.date,
                    log.water_units(),
                    log.weight.map_or("-".to_string(), |w| format!("{:.1}", w))
                );
            }
            return Ok(());
        }
        JournalCommand::Water { action, date } => {
            let date = date.unwrap_or(today);
            match action {
                WaterAction::Add => journal.add_water(date)?,
                WaterAction::Remove => journal.remove_water(date)?,
            }
        }
        JournalCommand::Weight { kg, date } => journal.record_weight(date.unwrap_or(today), kg)?,
        JournalCommand::Measure {
            chest,
            waist,
            hips,
            thigh,
            date,
        } => journal.record_measurements(
            date.unwrap_or(today),
            BodyMeasurements {
                chest,
                waist,
                hips,
                thigh,
            },
        )?,
        JournalCommand::Blood {
            ketones,
            glucose,
            date,
        } => journal.record_blood_levels(date.unwrap_or(today), BloodLevels { ketones, glucose })?,
        JournalCommand::Electrolytes {
            sodium,
            potassium,
            magnesium,
            date,
        } => journal.record_electrolytes(
            date.unwrap_or(today),
            Electrolytes {
                sodium,
                potassium,
                magnesium,
            },
        )?,
    };

    print_entry(&entry, app.config.journal.water_unit_liters);
    Ok(())
}

fn print_entry(log: &DailyLog, unit_liters: f64) {
    println!("Journal for {}", log.date);
    println!(
        "  Water:   {} units ({:.2} L)",
        log.water_units(),
        water_liters(log.water_units(), unit_liters)
    );
    if let Some(weight) = log.weight {
        println!("  Weight:  {:.1} kg", weight);
    }
    if let Some(m) = &log.measurements {
        println!(
            "  Measurements: chest {} waist {} hips {} thigh {}",
            show(m.chest),
            show(m.waist),
            show(m.hips),
            show(m.thigh)
        );
    }
    if let Some(b) = &log.blood_levels {
        println!("  Blood:   ketones {} glucose {}", show(b.ketones), show(b.glucose));
    }
    if let Some(e) = &log.electrolytes {
        println!(
            "  Electrolytes: sodium {} potassium {} magnesium {}",
            show(e.sodium),
            show(e.potassium),
            show(e.magnesium)
        );
    }
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}", v))
}

fn cmd_export(app: &App, history: Option<PathBuf>, journal: Option<PathBuf>) -> Result<()> {
    if history.is_none() && journal.is_none() {
        println!("Nothing to export. Pass --history and/or --journal.");
        return Ok(());
    }

    if let Some(path) = history {
        let engine = app.engine()?;
        let count = export_history_csv(engine.history(), &path)?;
        println!("✓ Exported {} fasts to {}", count, path.display());
    }

    if let Some(path) = journal {
        let count = export_journal_csv(app.journal()?.logs(), &path)?;
        println!("✓ Exported {} journal entries to {}", count, path.display());
    }

    Ok(())
}

fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
