use clap::{Parser, Subcommand};

/// Command-line interface definition for rVisitLog
#[derive(Parser)]
#[command(
    name = "rvisitlog",
    version = env!("CARGO_PKG_VERSION"),
    about = "A location-visit diary: saved places, visits, merges and day summaries on SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the user the visits belong to
    #[arg(global = true, long = "user")]
    pub user: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Manage saved places
    Place {
        #[command(subcommand)]
        action: PlaceAction,
    },

    /// Record or edit visits
    Visit {
        #[command(subcommand)]
        action: VisitAction,
    },

    /// List visits of a day (today by default), or the calendar of a month
    List {
        #[arg(long, help = "Day to list (YYYY-MM-DD), default today", conflicts_with = "month")]
        date: Option<String>,

        #[arg(long, help = "Month to show as a calendar (YYYY-MM)")]
        month: Option<String>,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Merge two visits at the same place into one
    Merge {
        /// Ids of the visits to merge (exactly two)
        #[arg(num_args = 0..)]
        ids: Vec<i64>,
    },

    /// Show the summary of a day
    Summary {
        /// Day to summarize (YYYY-MM-DD, default today)
        date: Option<String>,

        #[arg(long, help = "Regenerate even if nothing changed")]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum PlaceAction {
    /// Save a new place
    Add {
        name: String,

        #[arg(long, default_value = "other", help = "home, work, food, shop, gym, health, social, other")]
        category: String,

        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        lon: f64,

        #[arg(long, default_value = "")]
        address: String,
    },

    /// List saved places
    List,

    /// Delete a place without visits
    Del { id: i64 },
}

#[derive(Subcommand)]
pub enum VisitAction {
    /// Geofence entry: open a visit at a place
    Enter {
        place: i64,

        #[arg(long, help = "Entry time (YYYY-MM-DD HH:MM or HH:MM today), default now")]
        at: Option<String>,
    },

    /// Geofence exit: close the open visit at a place
    Exit {
        place: i64,

        #[arg(long, help = "Exit time (YYYY-MM-DD HH:MM or HH:MM today), default now")]
        at: Option<String>,
    },

    /// Record a visit by hand
    Add {
        place: i64,

        #[arg(long = "in", help = "Entry time (YYYY-MM-DD HH:MM)")]
        entry: String,

        #[arg(long = "out", help = "Exit time (YYYY-MM-DD HH:MM or HH:MM on the entry day)")]
        exit: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Replace the notes of a visit (empty text clears them)
    Note { id: i64, text: String },

    /// Delete a visit
    Del {
        id: i64,

        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
}
