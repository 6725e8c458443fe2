use crate::cli::GlobalArgs;
use crate::db::Store;
use crate::error::KvError;
use crate::shards;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_SHARDS: u32 = 8;
pub const DEFAULT_TIMEOUT: f64 = 0.01;
pub const DEFAULT_DELIM: &str = ":";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub cache: Option<PathBuf>,
    pub shards: u32,
    pub timeout: f64,
    pub name: Option<String>,
    pub delim: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cache: None,
            shards: DEFAULT_SHARDS,
            timeout: DEFAULT_TIMEOUT,
            name: None,
            delim: DEFAULT_DELIM.to_string(),
        }
    }
}

impl SessionOptions {
    /// Replace every field that `args` carries; absent options keep their current value.
    /// An empty `--name` clears the name.
    pub fn merge(&mut self, args: &GlobalArgs) {
        if let Some(cache) = &args.cache {
            self.cache = Some(cache.clone());
        }
        if let Some(shards) = args.shards {
            self.shards = shards;
        }
        if let Some(timeout) = args.timeout {
            self.timeout = timeout;
        }
        if let Some(name) = &args.name {
            self.name = if name.is_empty() { None } else { Some(name.clone()) };
        }
        if let Some(delim) = &args.delim {
            self.delim = delim.clone();
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The store a run of the tool works against, plus the options it was chosen with.
///
/// The store is opened at most once per store path for the life of the session.
/// Paths are compared after canonicalization, so `store` and `./store` are the same
/// store, and switching back to a path reuses the handle opened for it earlier.
/// Changing `shards` or `timeout` for a path that is already open has no effect: the
/// first open wins.
pub struct Session {
    options: SessionOptions,
    stores: HashMap<PathBuf, Store>,
    current: Option<PathBuf>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            stores: HashMap::new(),
            current: None,
        }
    }

    pub fn from_args(args: &GlobalArgs) -> Self {
        let mut options = SessionOptions::default();
        options.merge(args);
        Self::new(options)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Apply the options given on an interactive line before the store is opened for it.
    pub fn with_overrides(&mut self, args: &GlobalArgs) {
        self.options.merge(args);
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Make the store at the current path the active one, opening it unless this
    /// session already has.
    pub fn open(&mut self) -> Result<&Store, KvError> {
        let path = self.options.cache.clone().ok_or(KvError::MissingCachePath)?;

        let known = path.canonicalize().ok().filter(|key| self.stores.contains_key(key));
        let key = match known {
            Some(key) => key,
            None => {
                self.current = None;
                let store = Self::open_at(&path, self.options.shards, self.options.timeout)?;
                // the root exists now, so this resolves unless it was removed meanwhile
                let key = path.canonicalize().unwrap_or_else(|_| path.clone());
                tracing::debug!(path = %key.display(), open = self.stores.len() + 1, "store opened for session");
                self.stores.insert(key.clone(), store);
                key
            }
        };
        self.current = Some(key);

        self.store()
    }

    fn open_at(path: &Path, requested: u32, timeout: f64) -> Result<Store, KvError> {
        let shards = shards::detect(path, requested)?;
        Store::open(path, shards, timeout)
    }

    pub fn store(&self) -> Result<&Store, KvError> {
        self.current
            .as_ref()
            .and_then(|key| self.stores.get(key))
            .ok_or(KvError::StoreNotOpen)
    }
}
