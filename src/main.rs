// songsplay - ranks your song catalog and learns from what you skip
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use anyhow::{Context, Result};
use songsplay_lib::{
    catalog::SongRegistry,
    core::{Action, PlayerController, RankedSong, Searcher},
    db::{CsvFeedbackLog, Database},
    intelligence::{scorer::KEY_SCALE, SimilarityEngine},
    Config,
};
use std::env;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};

/// Environment variable holding the log level
const LOG_ENV: &str = "SONGSPLAY_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "rank" => handle_rank(&args[2..]).await,
        "search" => handle_search(&args[2..]).await,
        "session" => handle_session().await,
        "history" => handle_history(&args[2..]).await,
        "track" => handle_track(&args[2..]).await,
        "status" => handle_status().await,
        "version" | "-v" | "--version" => {
            println!("songsplay v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

fn init_logging() {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn handle_rank(args: &[String]) -> Result<()> {
    let limit = args
        .first()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10);

    let config = load_config()?;
    let mut player = load_player(&config)?;
    let db = open_database(&config).await?;
    restore_history(&mut player, &db).await?;

    print_ranking(&player, limit);
    Ok(())
}

async fn handle_search(args: &[String]) -> Result<()> {
    if args.is_empty() {
        eprintln!("Error: No search query provided");
        return Ok(());
    }

    let query = args.join(" ");
    let config = load_config()?;
    let registry = load_catalog(&config)?;

    print_search(&registry, &query);
    Ok(())
}

async fn handle_session() -> Result<()> {
    let config = load_config()?;
    let mut player = load_player(&config)?;
    let db = Arc::new(open_database(&config).await?);
    let restored = restore_history(&mut player, &db).await?;

    let log = CsvFeedbackLog::open(&config.feedback_log_path).with_context(|| {
        format!(
            "Could not open feedback log {}",
            config.feedback_log_path.display()
        )
    })?;
    player.add_sink(Arc::new(log));
    player.add_sink(db.clone());

    println!(
        "songsplay session for '{}': {} songs ranked, {} past events restored",
        player.user_id(),
        player.tree().len(),
        restored
    );
    println!("Type 'help' for commands, 'quit' to leave.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] | ["q"] => break,
            ["help"] => print_session_help(),
            ["top"] => print_ranking(&player, 10),
            ["top", n] => print_ranking(&player, n.parse().unwrap_or(10)),
            ["rebuild"] => {
                player.rebuild();
                println!("Rebuilt ranking tree ({} songs)", player.tree().len());
            }
            ["stats"] => print_session_stats(&player),
            ["search", rest @ ..] if !rest.is_empty() => {
                print_search(player.registry(), &rest.join(" "));
            }
            [verb, track_id, rest @ ..] => {
                let action = match session_action(verb) {
                    Some(action) => action,
                    None => {
                        println!("Unknown command '{}'. Type 'help'.", verb);
                        continue;
                    }
                };
                let ms_listened = rest
                    .first()
                    .and_then(|s| s.parse::<i64>().ok())
                    .unwrap_or(0);

                match player.on_action(track_id, action, ms_listened).await {
                    Some(outcome) => {
                        let song = player.registry().song(outcome.song);
                        println!(
                            "{} {} -> score {:.4} (feedback {})",
                            action,
                            song,
                            outcome.key as f64 / KEY_SCALE,
                            song.feedback()
                        );
                        if outcome.retrained {
                            println!("  retraining started");
                        }
                        if outcome.reloaded {
                            println!("  new feature weights loaded");
                        }
                    }
                    None => println!("No song with id '{}'", track_id),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }

    db.close().await;
    Ok(())
}

async fn handle_history(args: &[String]) -> Result<()> {
    let limit = args
        .first()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(20);

    let config = load_config()?;
    let db = open_database(&config).await?;
    let records = db.recent_feedback(Some(&config.user_id), limit).await?;

    if records.is_empty() {
        println!("No feedback recorded yet.");
        return Ok(());
    }

    println!("\nRecent feedback for '{}':", config.user_id);
    println!("{}", "=".repeat(60));
    for (i, record) in records.iter().enumerate() {
        let when = record
            .time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "?".to_string());
        let heard = record
            .listened_fraction()
            .map(|f| format!(" ({:.0}% heard)", f * 100.0))
            .unwrap_or_default();
        println!(
            "{:3}. {}  {:<15} {}{}",
            i + 1,
            when,
            record.action,
            record.track_id,
            heard
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_track(args: &[String]) -> Result<()> {
    let Some(track_id) = args.first() else {
        eprintln!("Error: No track id provided");
        return Ok(());
    };

    let config = load_config()?;
    let registry = load_catalog(&config)?;
    let song = registry.require(track_id)?;

    let db = open_database(&config).await?;
    let records = db.feedback_for_track(track_id).await?;

    println!("\n{} [{}]", song, song.track_id);
    println!("{}", "=".repeat(60));
    println!("  Popularity:  {}", song.track_popularity);
    println!("  Genre:       {}", song.playlist_genre);
    println!("  Events:      {}", records.len());
    for record in &records {
        let when = record
            .time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("    {}  {:<15} {}", when, record.action, record.user_id);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_status() -> Result<()> {
    let config = load_config()?;

    println!("\nsongsplay Status");
    println!("{}", "=".repeat(60));

    println!("\nFiles:");
    for (label, path) in [
        ("Catalog", &config.catalog_path),
        ("Weights", &config.weights_path),
        ("Centroids", &config.centroids_path),
        ("Database", &config.database_path),
        ("Feedback log", &config.feedback_log_path),
    ] {
        let state = if path.exists() { "✓" } else { "✗" };
        println!("  {} {:<13} {}", state, format!("{}:", label), path.display());
    }

    let mut engine = SimilarityEngine::with_paths(&config.weights_path, &config.centroids_path);
    engine.init();
    println!("\nModel:");
    println!(
        "  Weights:     {} ({} features)",
        if engine.weight_loader_mut().is_using_default() {
            "built-in"
        } else {
            "trained"
        },
        engine.weights().len()
    );
    println!("  Clusters:    {}", engine.clusters().len());
    match &config.retrain_command {
        Some(argv) => println!(
            "  Retrain:     every {} events: {}",
            config.retrain_every,
            argv.join(" ")
        ),
        None => println!("  Retrain:     off"),
    }

    let db = open_database(&config).await?;
    let stats = db.stats().await?;
    println!("\nFeedback:");
    println!("  Events:      {}", stats.total_events);
    println!("  Tracks:      {}", stats.distinct_tracks);
    println!("  Users:       {}", stats.distinct_users);
    for count in db.action_counts(Some(&config.user_id)).await? {
        println!("  {:<12} {}", format!("{}:", count.action), count.count);
    }

    println!("{}", "=".repeat(60));

    Ok(())
}

fn load_config() -> Result<Config> {
    Config::load_default().context("Could not read songsplay config")
}

fn load_catalog(config: &Config) -> Result<SongRegistry> {
    let mut registry = SongRegistry::new();
    registry
        .load_csv(&config.catalog_path)
        .with_context(|| format!("Could not load catalog {}", config.catalog_path.display()))?;
    Ok(registry)
}

fn load_player(config: &Config) -> Result<PlayerController> {
    let registry = load_catalog(config)?;
    let mut player = PlayerController::from_config(config, registry)?;

    let ingested = match config.preload_count {
        Some(n) => player.ingest_first(n),
        None => player.ingest_all(),
    };
    info!("Ingested {} songs into the ranking tree", ingested);

    Ok(player)
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::new(&config.database_path).await.with_context(|| {
        format!(
            "Could not open feedback database {}",
            config.database_path.display()
        )
    })
}

// Rebuild accumulators and profile from this user's stored events
async fn restore_history(player: &mut PlayerController, db: &Database) -> Result<usize> {
    let user_id = player.user_id().to_string();
    let records = db.feedback_history(&user_id).await?;

    let mut applied = 0;
    for record in &records {
        match record.action() {
            Some(action) => {
                if player.replay(&record.track_id, action).is_some() {
                    applied += 1;
                }
            }
            None => warn!("Skipping stored event with unknown action {}", record.action),
        }
    }

    // Replayed keys have drifted; start from a clean order
    if applied > 0 {
        player.rebuild();
    }
    info!("Restored {} of {} stored events", applied, records.len());

    Ok(applied)
}

// Session verbs; anything else is tried as an action name
fn session_action(verb: &str) -> Option<Action> {
    match verb {
        "play" => Some(Action::PlayStart),
        "complete" => Some(Action::PlayComplete),
        "skip" => Some(Action::SkipEarly),
        other => other.parse().ok(),
    }
}

fn print_ranking(player: &PlayerController, limit: usize) {
    let ranked: Vec<RankedSong> = player.ranking(limit);
    if ranked.is_empty() {
        println!("Nothing to rank.");
        return;
    }

    println!("\nTop {} for '{}':", ranked.len(), player.user_id());
    println!("{}", "=".repeat(60));
    for (i, entry) in ranked.iter().enumerate() {
        let song = player.registry().song(entry.song);
        println!(
            "{:3}. {:.4}  {} [{}] (popularity {})",
            i + 1,
            entry.key as f64 / KEY_SCALE,
            song,
            song.track_id,
            song.track_popularity
        );
    }
    println!("{}", "=".repeat(60));
}

fn print_search(registry: &SongRegistry, query: &str) {
    let hits = Searcher::new().search(registry, query, 20);

    if hits.is_empty() {
        println!("No songs found matching '{}'", query);
        return;
    }

    println!("\nFound {} song(s) matching '{}':", hits.len(), query);
    println!("{}", "=".repeat(60));
    for (i, hit) in hits.iter().enumerate() {
        let song = registry.song(hit.song);
        println!("{:3}. {} [{}]", i + 1, song, song.track_id);
    }
    println!("{}", "=".repeat(60));
}

fn print_session_stats(player: &PlayerController) {
    let profile = player.profile();
    println!("Interactions: {}", profile.total_interactions());
    println!(
        "Profile:      {}",
        if profile.is_seeded() { "seeded" } else { "empty" }
    );
    println!("Tree:         {} songs, height {}", player.tree().len(), player.tree().height());
    println!(
        "Order:        {}",
        if player.is_sorted() {
            "in sync"
        } else {
            "drifted (run 'rebuild')"
        }
    );
}

fn print_session_help() {
    println!(
        r#"Actions (track id, optional ms listened):
    play <id> [ms]            PLAY_START
    complete <id> [ms]        PLAY_COMPLETE
    replay <id> [ms]          REPLAY
    skip <id> [ms]            SKIP_EARLY
    skip-late <id> [ms]       SKIP_LATE
    like <id>                 LIKE
    dislike <id>              DISLIKE
    not-interested <id>       NOT_INTERESTED

Other:
    top [n]                   Show the current top n (default: 10)
    search <query>            Find songs by name or artist
    rebuild                   Re-sort the ranking tree
    stats                     Show session state
    quit                      Leave the session"#
    );
}

fn print_usage() {
    println!(
        r#"songsplay v{} - ranks your songs and learns from what you skip

USAGE:
    songsplay <COMMAND> [OPTIONS]

COMMANDS:
    rank [limit]           Show the top songs (default: 10)
    search <query>         Search the catalog by name or artist
    session                Interactive listening session
    history [limit]        Show recent feedback (default: 20)
    track <id>             Show one song and every event stored for it
    status                 Show files, model and feedback stats
    version                Show version
    help                   Show this help

EXAMPLES:
    songsplay rank 25
    songsplay search daft punk
    songsplay session
    songsplay history
    songsplay track 6f807x0ima9a1j3VPbc7VN

CONFIGURATION:
    ~/.songsplay/config.json, or the file named by $SONGSPLAY_CONFIG.
    Set SONGSPLAY_LOG=info (or debug) for diagnostics on stderr.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
