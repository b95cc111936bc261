use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flashcards_app::clock::{Clock, SystemClock};
use flashcards_app::database::{DeckId, DeckProvider, LearnerId, ReviewStore, SqliteStore};
use flashcards_app::export::json::{export_deck_to_path, import_deck, import_into};
use flashcards_app::{Rating, SessionEngine, SessionError, SessionStep, classify};
use log::info;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Spaced-repetition study in the terminal
#[derive(Parser, Debug)]
#[command(name = "flashcards")]
#[command(version)]
struct Args {
    /// SQLite database holding decks and review records
    #[arg(long, default_value = "db.sqlite3", env = "FLASHCARDS_DB")]
    db: PathBuf,

    /// Learner whose review records are read and written
    #[arg(long, default_value_t = 1, env = "FLASHCARDS_LEARNER")]
    learner: LearnerId,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List decks and their sizes
    Decks,
    /// Import a deck from a JSON file
    Import { file: PathBuf },
    /// Export a deck to a JSON file
    Export { deck: String, file: PathBuf },
    /// Study a deck
    Study {
        deck: String,
        /// Only items never studied or due for review
        #[arg(long)]
        due_only: bool,
    },
    /// Show mastery statistics for a deck
    Stats { deck: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;

    match args.command {
        Command::Decks => {
            for (id, name) in store.list_decks()? {
                println!("{name} ({} items)", store.list_items(id)?.len());
            }
        }
        Command::Import { file } => {
            let deck = import_deck(&file)
                .with_context(|| format!("Failed to read deck file {}", file.display()))?;
            if store.deck_id_by_name(&deck.name)?.is_some() {
                bail!("Deck '{}' already exists", deck.name);
            }
            import_into(&deck, &store)?;
            println!("Deck '{}' imported with {} items", deck.name, deck.items.len());
        }
        Command::Export { deck, file } => {
            let id = find_deck(&store, &deck)?;
            export_deck_to_path(&store.load_deck(id)?, &file)?;
            println!("Deck '{deck}' exported to {}", file.display());
        }
        Command::Study { deck, due_only } => {
            let id = find_deck(&store, &deck)?;
            study(store, args.learner, id, due_only)?;
        }
        Command::Stats { deck } => {
            let id = find_deck(&store, &deck)?;
            let records: HashMap<_, _> =
                store.records_for_learner(args.learner)?.into_iter().collect();
            let stats = classify(&records, &store.list_items(id)?, SystemClock.now());

            println!("Items:          {}", stats.total);
            println!("Not studied:    {}", stats.not_studied);
            println!("Reviewed today: {}", stats.reviewed_today);
            println!("Needs review:   {}", stats.needs_review);
            println!("Well known:     {}", stats.well_known);
            println!("Learning:       {}", stats.learning);
            println!("Difficult:      {}", stats.difficult);
            println!("Mastery:        {:.0}%", stats.mastery_percentage);
        }
    }

    Ok(())
}

fn find_deck(store: &SqliteStore, name: &str) -> Result<DeckId> {
    store
        .deck_id_by_name(name)?
        .with_context(|| format!("No deck named '{name}'"))
}

fn study(store: SqliteStore, learner: LearnerId, deck: DeckId, due_only: bool) -> Result<()> {
    let clock = Arc::new(SystemClock);
    let mut items = store.list_items(deck)?;
    if due_only {
        let due = store.due_item_ids(learner, clock.now())?;
        let studied: HashMap<_, _> = store.records_for_learner(learner)?.into_iter().collect();
        items.retain(|item| !studied.contains_key(&item.id) || due.contains(&item.id));
    }
    if items.is_empty() {
        println!("Nothing to study right now.");
        return Ok(());
    }

    let engine = SessionEngine::new(Arc::new(store), clock);
    let handle = engine.start_with_items(learner, items)?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(item) = engine.current_item(handle)? else {
            break;
        };
        print!("\n{}\n[Enter] show answer, [s] skip: ", item.question);
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };

        let step = if line.trim() == "s" {
            engine.skip(handle)?
        } else {
            println!("{}", engine.reveal(handle)?.answer);
            loop {
                print!("[0] Failed  [3] Hard  [5] Easy: ");
                io::stdout().flush()?;
                let Some(answer) = lines.next().transpose()? else {
                    return Ok(());
                };
                let Ok(quality) = answer.trim().parse::<u8>() else {
                    println!("Please enter a number.");
                    continue;
                };
                match engine.rate(handle, quality) {
                    Ok(step) => break step,
                    Err(SessionError::InvalidQuality(q)) => {
                        println!("{q} is not a valid grade.");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if let SessionStep::Completed(stats) = step {
            println!(
                "\nSession complete: {} {}, {} {}, {} {}. Score {}/{}",
                stats.good,
                label(Rating::Easy),
                stats.hard,
                label(Rating::Hard),
                stats.failed,
                label(Rating::Failed),
                stats.good,
                stats.total
            );
            info!("Learner {} finished deck {}", learner, deck);
            break;
        }
    }

    engine.finish(handle)?;
    Ok(())
}

fn label(rating: Rating) -> &'static str {
    match rating {
        Rating::Failed => "failed",
        Rating::Hard => "hard",
        Rating::Easy => "easy",
    }
}
