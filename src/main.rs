use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use league_sim::config::Config;
use league_sim::generator::PoissonGenerator;
use league_sim::league::{Init, League};
use league_sim::models::MatchResult;
use league_sim::schedule::generate_double_round_robin;
use league_sim::sqlite_store::SqliteStore;
use league_sim::Model;

const USAGE: &str = "usage: league_sim <command> [options]

commands:
  reset --teams N [--type random|homogeneous]
  table
  schedule
  remaining
  next
  week
  weeks --weeks N
  all
  predict [--model poisson|elo|bt|logistic|mlp|bivariate|zip|jitter|noise] [--sims N]
  edit --week W --home H --away A --home-goals X --away-goals Y

global options:
  --db PATH      sqlite file (default: $LEAGUE_DB_PATH or the user cache dir)
  --seed N       seed for team strengths, live matches and predictions";

fn main() -> Result<()> {
    init_tracing();

    let Some(command) = std::env::args().nth(1) else {
        eprintln!("{USAGE}");
        bail!("missing command");
    };
    if command == "-h" || command == "--help" || command == "help" {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = Config::from_env();
    if let Some(seed) = parse_arg::<u64>("--seed") {
        config.seed = Some(seed);
    }
    let db_path = parse_db_path_arg()
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("open league db {}", db_path.display()))?;
    let generator = match config.seed {
        Some(seed) => PoissonGenerator::seeded(seed),
        None => PoissonGenerator::new(),
    };
    let mut league = League::new(store, generator);

    match command.as_str() {
        "reset" => {
            let teams = parse_arg::<usize>("--teams").context("--teams N is required")?;
            let init = parse_arg::<String>("--type")
                .map(|raw| Init::from_str(&raw))
                .transpose()?
                .unwrap_or_default();
            let mut rng = match config.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            print_json(&league.reset(teams, init, &mut rng)?)
        }
        "table" => print_json(&league.table()?),
        "schedule" => {
            let ids: Vec<u32> = league.teams()?.iter().map(|t| t.id).collect();
            print_json(&generate_double_round_robin(&ids)?)
        }
        "remaining" => print_json(&league.remaining()?),
        "next" => print_json(&league.next_fixtures()?),
        "week" => print_json(&league.simulate_week()?),
        "weeks" => {
            let weeks = parse_arg::<usize>("--weeks")
                .or_else(|| positional(2))
                .unwrap_or(1)
                .max(1);
            print_json(&league.simulate_weeks(weeks)?)
        }
        "all" => print_json(&league.simulate_all()?),
        "predict" => {
            let model = match parse_arg::<String>("--model") {
                Some(key) => Model::from_key(&key)?,
                None => config.default_model,
            };
            let sims = parse_arg::<usize>("--sims").unwrap_or(config.sims);
            let prediction = league.predict(model, &config.simulation(sims))?;
            print_json(&prediction)
        }
        "edit" => {
            let result = MatchResult {
                week: required_arg("--week")?,
                home_team_id: required_arg("--home")?,
                away_team_id: required_arg("--away")?,
                home_goals: required_arg("--home-goals")?,
                away_goals: required_arg("--away-goals")?,
            };
            league.edit_match(&result)?;
            print_json(&serde_json::json!({ "status": "ok" }))
        }
        other => {
            eprintln!("{USAGE}");
            Err(anyhow!("unknown command '{other}'"))
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("league_sim=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_arg::<String>("--db")
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| PathBuf::from(raw.trim()))
}

fn required_arg<T: FromStr>(name: &str) -> Result<T> {
    parse_arg(name).with_context(|| format!("{name} is required"))
}

fn parse_arg<T: FromStr>(name: &str) -> Option<T> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<T>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<T>()
        {
            return Some(v);
        }
    }
    None
}

fn positional<T: FromStr>(idx: usize) -> Option<T> {
    std::env::args()
        .nth(idx)
        .filter(|arg| !arg.starts_with("--"))
        .and_then(|arg| arg.trim().parse::<T>().ok())
}
