//! Front end configuration from environment variables and command-line flags.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::pieces::{PieceProvider, RandomPieceProvider};

pub const SEED_ENV: &str = "TETRIS_SEED";
pub const EVENT_LOG_ENV: &str = "TETRIS_EVENT_LOG";

pub const USAGE: &str = "\
Usage: arena-tetris [--seed N] [--event-log PATH]

  --seed N           reproducible piece sequence (env: TETRIS_SEED)
  --event-log PATH   append game events as JSON lines (env: TETRIS_EVENT_LOG)
  -h, --help         print this help
";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub seed: Option<u64>,
    pub event_log: Option<PathBuf>,
    pub show_help: bool,
}

impl Config {
    /// Environment first, then flags on top.
    pub fn load(args: &[String]) -> Result<Self> {
        Self::from_env()?.with_args(args)
    }

    pub fn from_env() -> Result<Self> {
        let seed = match env::var(SEED_ENV) {
            Ok(v) if !v.trim().is_empty() => Some(parse_seed(v.trim())?),
            _ => None,
        };

        let event_log = env::var(EVENT_LOG_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(PathBuf::from(s)) });

        Ok(Self {
            seed,
            event_log,
            show_help: false,
        })
    }

    pub fn with_args(mut self, args: &[String]) -> Result<Self> {
        let mut i = 0usize;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    i += 1;
                    let v = args
                        .get(i)
                        .ok_or_else(|| anyhow!("missing value for --seed"))?;
                    self.seed = Some(parse_seed(v)?);
                }
                "--event-log" => {
                    i += 1;
                    let v = args
                        .get(i)
                        .ok_or_else(|| anyhow!("missing value for --event-log"))?;
                    self.event_log = Some(PathBuf::from(v));
                }
                "-h" | "--help" => self.show_help = true,
                other => return Err(anyhow!("unknown argument: {}", other)),
            }
            i += 1;
        }
        Ok(self)
    }

    pub fn piece_provider(&self) -> Box<dyn PieceProvider> {
        match self.seed {
            Some(seed) => Box::new(RandomPieceProvider::seeded(seed)),
            None => Box::new(RandomPieceProvider::new()),
        }
    }
}

fn parse_seed(v: &str) -> Result<u64> {
    v.parse::<u64>()
        .map_err(|_| anyhow!("invalid seed value: {}", v))
}
