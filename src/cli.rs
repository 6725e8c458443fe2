use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const BIN_NAME: &str = "shardkv";

/// Session options are deliberately left without clap defaults: an absent option must
/// stay distinguishable from one given on the command line, so the interactive loop can
/// tell what to override. Defaults live in `SessionOptions::default`.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME)]
#[command(about = "Inspect and edit a sharded on-disk key-value store")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct GlobalArgs {
    /// Path to the store root directory
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Shards for a new store [default: 8]; existing stores keep their own count
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub shards: Option<u32>,

    /// Seconds the store waits on a locked shard [default: 0.01]
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<f64>,

    /// Name prepended to every key
    #[arg(long)]
    pub name: Option<String>,

    /// Separator between key elements [default: ":"]
    #[arg(long, value_parser = parse_delim)]
    pub delim: Option<String>,

    /// Start an interactive session
    #[arg(long)]
    pub repl: bool,
}

impl GlobalArgs {
    pub fn is_empty(&self) -> bool {
        self == &GlobalArgs::default()
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Show the store's total size on disk
    Volume,

    /// Check the store for structural problems
    Check(CheckArgs),

    /// Remove every entry carrying a tag
    Evict(EvictArgs),

    /// Remove entries whose expire time has passed
    Expire,

    /// Get the value for a key
    Get(GetArgs),

    /// List all entries
    Items(ItemsArgs),

    /// Get entries whose key starts with the given elements
    #[command(name = "get_startswith", alias = "get-startswith")]
    GetStartswith(StartswithArgs),

    /// Set a key to a value
    Set(SetArgs),

    /// Set one key per top-level field of a JSON object file
    #[command(name = "set_from_dict", alias = "set-from-dict")]
    SetFromDict(SetFromDictArgs),

    /// Delete a key (asks for confirmation)
    Delete(DeleteArgs),

    /// Delete all entries, or those under a key prefix (asks for confirmation)
    Clear(ClearArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CheckArgs {
    /// Repair what can be repaired
    #[arg(long)]
    pub fix: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EvictArgs {
    /// Tag of the entries to remove
    pub tag: String,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct GetArgs {
    /// Key elements
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Returned when the key is missing
    #[arg(long)]
    pub default: Option<String>,

    /// Include the expire time
    #[arg(long)]
    pub expire_time: bool,

    /// Include the tag
    #[arg(long)]
    pub tag: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ItemsArgs {
    /// Output a key to value mapping instead of pairs
    #[arg(long)]
    pub as_dict: bool,

    /// Only print how many entries there are
    #[arg(long)]
    pub count: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct StartswithArgs {
    /// Leading key elements
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Let the last element match partially (`job` matches `jobs:1`)
    #[arg(long)]
    pub match_part: bool,

    /// Output a key to value mapping instead of pairs
    #[arg(long)]
    pub as_dict: bool,

    /// Only output keys
    #[arg(long)]
    pub keys_only: bool,

    /// Output keys with the matched prefix removed
    #[arg(long)]
    pub suffix_keys: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SetArgs {
    /// Key elements
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Store a literal string
    #[arg(long, conflicts_with = "json_value")]
    pub value: Option<String>,

    /// Store a JSON document
    #[arg(long)]
    pub json_value: Option<String>,

    /// Fail instead of overwriting an existing key
    #[arg(long)]
    pub add: bool,

    /// Seconds until the entry expires
    #[arg(long, value_name = "SECS", value_parser = parse_expire)]
    pub expire: Option<f64>,

    /// Tag the entry (see `evict`)
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SetFromDictArgs {
    /// JSON file whose top level is an object
    pub path: PathBuf,

    /// Skip keys that already exist
    #[arg(long)]
    pub add: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct DeleteArgs {
    /// Key elements
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ClearArgs {
    /// Leading key elements; omit to clear the whole store
    pub keys: Vec<String>,
}

fn parse_timeout(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("not a number: {}", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("timeout must be a non-negative number of seconds: {}", s));
    }
    Ok(secs)
}

fn parse_expire(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("not a number: {}", s))?;
    if !secs.is_finite() {
        return Err(format!("expire must be a finite number of seconds: {}", s));
    }
    Ok(secs)
}

fn parse_delim(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("delimiter must not be empty".into());
    }
    Ok(s.to_string())
}
