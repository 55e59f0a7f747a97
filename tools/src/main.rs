//! reactor-runner: headless driver for the Coin Reactor economy.
//!
//! Usage:
//!   reactor-runner --db save.db --profile alice --script session.jsonl
//!   reactor-runner --db save.db --ipc-mode
//!
//! Commands are JSON lines such as {"cmd":"tap"}, {"cmd":"upgrade","kind":"click"}
//! or {"cmd":"advance","millis":1500}. Time is hand-driven unless --realtime.

use anyhow::{Context, Result};
use reactor_core::{
    clock::{GameClock, ManualClock, SystemClock},
    command::PlayerCommand,
    config::EconomyConfig,
    engine::EconomyEngine,
    statistics_subsystem::format_play_time,
    store::GameStore,
};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Runner-level control lines, tried before player commands.
#[derive(serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Control {
    GetState,
    Quit,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Line {
    Control(Control),
    Player(PlayerCommand),
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let realtime = args.iter().any(|a| a == "--realtime");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let config_path = string_arg(&args, "--config").unwrap_or("./data/economy.json");
    let script = string_arg(&args, "--script");

    let mut config = match EconomyConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; using built-in defaults");
            EconomyConfig::default()
        }
    };
    config.seed = parse_arg(&args, "--seed", config.seed);

    let store = if db == ":memory:" {
        GameStore::in_memory()?
    } else {
        GameStore::open(db).with_context(|| format!("opening {db}"))?
    };
    store.migrate()?;

    let profile_id = match string_arg(&args, "--profile") {
        Some(p) => p.to_string(),
        None => store
            .profile_ids()?
            .into_iter()
            .next()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    };

    if !ipc_mode {
        println!("Coin Reactor: reactor-runner");
        println!("  db:        {db}");
        println!("  profile:   {profile_id}");
        println!("  seed:      {}", config.seed);
        println!("  clock:     {}", if realtime { "system" } else { "manual" });
        println!();
    }

    let clock: Box<dyn GameClock> = if realtime {
        Box::new(SystemClock)
    } else {
        Box::new(ManualClock::new(chrono::Local::now().naive_local()))
    };
    let mut engine = EconomyEngine::open(Rc::new(store), &profile_id, config, clock)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else if let Some(path) = script {
        run_script(&mut engine, path)?;
        print_summary(&engine);
    } else {
        print_summary(&engine);
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut EconomyEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let line: Line = match serde_json::from_str(&buffer) {
            Ok(l) => l,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };

        match line {
            Line::Control(Control::Quit) => break,
            Line::Control(Control::GetState) => {}
            Line::Player(cmd) => {
                engine.apply(&cmd);
            }
        }
        engine.pump();
        writeln!(stdout, "{}", serde_json::to_string(&engine.snapshot())?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn run_script(engine: &mut EconomyEngine, path: &str) -> Result<()> {
    let content = fs::read_to_string(path).with_context(|| format!("reading script {path}"))?;
    for (n, raw) in content.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let cmd: PlayerCommand =
            serde_json::from_str(raw).with_context(|| format!("{path}:{}: bad command", n + 1))?;
        let outcome = engine.apply(&cmd);
        println!("{:>4}  {raw}  →  {}", n + 1, serde_json::to_string(&outcome)?);
    }
    engine.pump();
    Ok(())
}

fn print_summary(engine: &EconomyEngine) {
    let stats = engine.statistics();
    let skins = engine.cosmetics();

    println!("=== PROFILE SUMMARY ===");
    println!("  balance:        {}", engine.balance());
    println!("  active skin:    {} (x{})", skins.active().as_str(), skins.active_power());
    println!("  skins owned:    {}", skins.owned_count());
    println!("  tap reward:     {}", engine.accrual().tap_reward());
    if engine.accrual().is_active() {
        println!(
            "  accrual:        {} every {}ms",
            engine.accrual().amount_per_tick(),
            engine.accrual().interval().num_milliseconds()
        );
    } else {
        println!("  accrual:        off");
    }
    for (kind, level) in reactor_core::upgrade_subsystem::UpgradeKind::ALL
        .iter()
        .map(|&k| (k, engine.upgrades().level(k)))
    {
        println!(
            "  {:<14}  level {level:>2}  next {}",
            format!("{}:", kind.as_str()),
            engine.upgrades().price(kind)
        );
    }

    println!();
    println!("=== STATISTICS ===");
    println!("  coins earned:   {}", stats.total_coins_earned());
    println!("  taps:           {}", stats.total_taps());
    println!("  play time:      {}", format_play_time(stats.play_time_secs()));
    println!("  best day:       {}", stats.max_daily_earnings());
    println!("  best minigame:  {}", stats.best_minigame_level());

    println!();
    println!("=== ACHIEVEMENTS ({}/{}) ===", engine.achievements().completed_count(), engine.achievements().all().len());
    for a in engine.achievements().all() {
        let mark = match (a.completed, a.claimed) {
            (true, true) => "claimed",
            (true, false) => "ready",
            _ => "",
        };
        println!("  {:<18} {:>5.1}%  {mark}", a.id, a.progress() * 100.0);
    }

    let daily = engine.daily();
    println!();
    println!("=== DAILY ===");
    println!("  streak:         {}", daily.streak());
    match daily.claimable_day() {
        Some(day) => println!("  claimable:      day {day}"),
        None => println!("  claimable:      none today"),
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
