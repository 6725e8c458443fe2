use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use shardkv::confirm::StdinConfirm;
use shardkv::entry::{self, Mode};
use shardkv::output;
use shardkv::repl::{self, Editor};
use shardkv::{Cli, Dispatcher, Session};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let result = run(cli);
    if let Err(e) = &result {
        eprintln!("error: {:#}", e);
        std::process::exit(entry::exit_status(&result));
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let mode = entry::mode(&cli);
    if mode == Mode::Usage {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, entry::USAGE_HINT)
            .exit();
    }

    let dispatcher = Dispatcher::new()?;
    let mut session = Session::from_args(&cli.globals);
    let mut confirm = StdinConfirm;

    if let Some(command) = &cli.command {
        let out = entry::run_once(&mut session, &dispatcher, command, &mut confirm)?;
        output::render(&out)?;
    }

    if !mode.enters_loop() {
        return Ok(());
    }

    entry::start_interactive(&mut session)?;
    let mut editor = Editor::new(repl::history_path()).context("failed to start line editor")?;
    repl::run(&mut editor, &mut session, &dispatcher, &mut confirm)?;

    Ok(())
}
