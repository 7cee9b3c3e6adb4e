use memora_engine::rules::{
    DEFAULT_PLAYERS, Difficulty, normalize_player_count, parse_player_count,
};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub players: usize,
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub players: ValueSource,
    pub difficulty: ValueSource,
    pub seed: ValueSource,
    pub names: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            players: ValueSource::Default,
            difficulty: ValueSource::Default,
            seed: ValueSource::Default,
            names: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            difficulty: Difficulty::default(),
            seed: None,
            names: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => f.write_str(msg),
        }
    }
}

/// Resolves configuration from the process environment.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    resolve_with(|key| std::env::var(key).ok())
}

/// Resolves configuration with `lookup` standing in for the environment.
///
/// Precedence, lowest first: defaults, the TOML file named by `MEMORA_CONFIG`,
/// then `MEMORA_PLAYERS`, `MEMORA_DIFFICULTY` and `MEMORA_SEED`. Empty
/// variables are treated as unset. Player counts and difficulties never fail:
/// unusable values fall back to 2 players and medium.
pub fn resolve_with<F>(lookup: F) -> Result<ConfigResolved, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Some(path) = var("MEMORA_CONFIG") {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.players {
            cfg.players = normalize_player_count(v);
            sources.players = ValueSource::File;
        }
        if let Some(v) = f.difficulty {
            cfg.difficulty = Difficulty::parse_or_default(&v);
            sources.difficulty = ValueSource::File;
        }
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.names {
            cfg.names = v;
            sources.names = ValueSource::File;
        }
    }

    if let Some(players) = var("MEMORA_PLAYERS") {
        cfg.players = parse_player_count(&players);
        sources.players = ValueSource::Env;
    }
    if let Some(difficulty) = var("MEMORA_DIFFICULTY") {
        cfg.difficulty = Difficulty::parse_or_default(&difficulty);
        sources.difficulty = ValueSource::Env;
    }
    if let Some(seed) = var("MEMORA_SEED") {
        cfg.seed = Some(
            seed.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("Invalid seed".into()))?,
        );
        sources.seed = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    players: Option<usize>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    names: Option<Vec<String>>,
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.names.len() > cfg.players {
        return Err(ConfigError::Invalid(format!(
            "Invalid configuration: {} names given for {} players",
            cfg.names.len(),
            cfg.players
        )));
    }
    Ok(())
}
