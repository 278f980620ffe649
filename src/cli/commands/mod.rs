pub mod config;
pub mod db;
pub mod init;
pub mod list;
pub mod log;
pub mod merge;
pub mod place;
pub mod summary;
pub mod visit;

use crate::config::Config;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use std::io::{self, Write};

/// Open the configured database, bringing its schema up to date.
pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    DbPool::open(&cfg.database)
}

/// Ask a yes/no confirmation from the user
pub(crate) fn ask_confirmation(prompt: &str) -> bool {
    crate::ui::messages::warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}
