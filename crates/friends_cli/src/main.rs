//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `friends_core` linkage.
//! - Optionally open a database file and print its friend/event counts.
//!
//! Usage: `friends_cli [DB_PATH]`

use friends_core::db::open_db;
use friends_core::{now_epoch_ms, RelationshipStore, SqliteRelationshipRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("friends_core ping={}", friends_core::ping());
    println!("friends_core version={}", friends_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match print_counts(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn print_counts(db_path: &str) -> Result<(), String> {
    let mut conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteRelationshipRepository::try_new(&mut conn).map_err(|err| err.to_string())?;
    let store = RelationshipStore::new(repo);

    let friends = store.load_friends().map_err(|err| err.to_string())?;
    let timeline = store
        .load_timeline(now_epoch_ms())
        .map_err(|err| err.to_string())?;
    println!("friends={}", friends.len());
    println!(
        "events past={} upcoming={}",
        timeline.past.len(),
        timeline.upcoming.len()
    );
    Ok(())
}
