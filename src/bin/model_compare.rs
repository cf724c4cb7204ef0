use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};

use league_sim::config::Config;
use league_sim::sqlite_store::SqliteStore;
use league_sim::standings::ranked;
use league_sim::store::Repository;
use league_sim::{Model, simulate};

// Fixed so every model sees the same random streams.
const DEFAULT_SEED: u64 = 20_240_601;

fn main() -> Result<()> {
    let config = Config::from_env();
    let db_path = parse_db_path_arg()
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;
    let sims = parse_arg::<usize>("--sims").unwrap_or(config.sims).max(1);
    let seed = parse_arg::<u64>("--seed")
        .or(config.seed)
        .unwrap_or(DEFAULT_SEED);

    let store = SqliteStore::open(&db_path)?;
    let teams = store.list_teams()?;
    if teams.is_empty() {
        return Err(anyhow!(
            "no teams in {} (run `league_sim reset --teams N` first)",
            db_path.display()
        ));
    }
    let table = store.get_table()?;
    let remaining = store.list_remaining_matches()?;

    println!(
        "{} teams, {} fixtures left, {} sims, seed {}",
        teams.len(),
        remaining.len(),
        sims,
        seed
    );
    println!();
    println!("Table:");
    for (pos, row) in ranked(&table).iter().enumerate() {
        println!(
            "  {:>2}. {:<12} P{:<3} W{:<3} D{:<3} L{:<3} GD{:>+4}  {:>3} pts",
            pos + 1,
            row.team_name,
            row.played,
            row.won,
            row.drawn,
            row.lost,
            row.goal_diff,
            row.points
        );
    }
    println!();

    for model in Model::ALL {
        let started = Instant::now();
        let cfg = config.simulation(sims).with_seed(seed);
        let prediction = simulate(&teams, &table, &remaining, model, &cfg)
            .with_context(|| format!("simulate {}", model.name()))?;

        let mut shares: Vec<(u32, f64)> =
            prediction.probs.iter().map(|(id, p)| (*id, *p)).collect();
        shares.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let line = shares
            .iter()
            .take(4)
            .map(|(id, p)| {
                let name = prediction
                    .team_names
                    .get(id)
                    .map(String::as_str)
                    .unwrap_or("?");
                format!("{name} {:.1}%", p * 100.0)
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<26} {:>6}ms  {}",
            model.name(),
            started.elapsed().as_millis(),
            line
        );
    }

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
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
