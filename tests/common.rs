#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use rvisitlog::ai::{GenerationRequest, TextGenerator};
use rvisitlog::core::visits::VisitService;
use rvisitlog::db::initialize::init_db;
use rvisitlog::db::pool::DbPool;
use rvisitlog::errors::{AppError, AppResult};
use std::cell::RefCell;
use std::time::Duration;
use tempfile::TempDir;

/// Scratch environment for CLI tests: its own HOME (so no real config is
/// read) and its own database file.
pub struct TestEnv {
    pub dir: TempDir,
    pub db: String,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir
            .path()
            .join("rvisitlog_test.sqlite")
            .to_string_lossy()
            .to_string();
        Self { dir, db }
    }

    /// `rvisitlog --db <db> --user tester ...` with an isolated HOME and no
    /// API key.
    pub fn cmd(&self) -> Command {
        self.cmd_as("tester")
    }

    pub fn cmd_as(&self, user: &str) -> Command {
        let mut cmd = cargo_bin_cmd!("rvisitlog");
        cmd.env("HOME", self.dir.path())
            .env("APPDATA", self.dir.path())
            .env_remove("OPENAI_API_KEY")
            .args(["--db", &self.db, "--user", user]);
        cmd
    }

    pub fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd().args(args).assert()
    }

    pub fn init(&self) {
        self.run(&["--test", "init"]).success();
    }
}

/// Service over a fresh in-memory database.
pub fn service(user: &str, ttl: Duration) -> VisitService {
    let pool = DbPool::in_memory().expect("in-memory db");
    init_db(&pool.conn).expect("init db");
    VisitService::with_ttls(pool, user, ttl, ttl)
}

/// Generator double: fixed reply or failure, records every request.
pub struct RecordingGenerator {
    pub reply: Option<String>,
    pub requests: RefCell<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl TextGenerator for RecordingGenerator {
    fn generate(&self, req: &GenerationRequest) -> AppResult<String> {
        self.requests.borrow_mut().push(req.clone());
        self.reply
            .clone()
            .ok_or_else(|| AppError::Generation("offline".into()))
    }
}
