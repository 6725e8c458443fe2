pub mod cli;
pub mod commands;
pub mod confirm;
pub mod db;
pub mod entry;
pub mod error;
pub mod keys;
pub mod output;
pub mod repl;
pub mod session;
pub mod shards;

pub use cli::{Cli, Commands, GlobalArgs};
pub use commands::{CommandKind, Dispatcher};
pub use db::{Entry, Store, WriteOptions};
pub use error::KvError;
pub use session::{Session, SessionOptions};
