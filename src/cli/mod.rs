pub mod command;
pub mod output;

use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use ansi_term::Colour;
use anyhow::Result;
use clap::Parser;
use command::{Command, Reporter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, level_filters::LevelFilter};

use crate::{
    harvest::{token_from, HarvestClient, TimeEntrySource, TOKEN_VARIABLE},
    shortcode::{
        store::{JsonFileStore, ShortCodeStore, DEFAULT_MAP_FILE},
        ShortCodeAllocator,
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, level_from_flags, CLI_PREFIX},
    },
};

const PROMPT: &str = "timegrid> ";

#[derive(Parser, Debug)]
#[command(name = "timegrid", version, long_about = None)]
#[command(about = "Harvest time entry reports with short codes and a half-hour schedule grid")]
struct Args {
    #[arg(help = "Command to run once, for example \"gw\". Starts an interactive prompt if omitted")]
    command: Vec<String>,
    #[arg(long, default_value = DEFAULT_MAP_FILE, help = "File keeping short codes between runs")]
    map_file: PathBuf,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(long = "log-filter", help = "Log level used with --log")]
    log_filter: Option<LevelFilter>,
}

pub async fn run_cli() -> Result<ExitCode> {
    let args = Args::parse();

    enable_logging(
        CLI_PREFIX,
        &create_application_default_path()?,
        level_from_flags(args.log, args.log_filter),
        args.log,
    )?;

    let mut reporter = match connect(&args.map_file).await {
        Ok(reporter) => reporter,
        Err(e) => {
            error!("Configuration failed {e:?}");
            eprintln!("Could not verify configuration - {e:#}");
            println!("Aborting");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut stdout = io::stdout();
    if args.command.is_empty() {
        println!("q to quit, h for help");
        run_loop(&mut reporter, &mut stdout).await?;
    } else {
        let command = Command::parse(&args.command.join(" "));
        if let Err(e) = reporter.execute(command, &mut stdout).await {
            error!("Command {command:?} failed {e:?}");
            eprintln!("{e:#}");
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Checks the token, resolves the account and loads short codes.
async fn connect(map_file: &Path) -> Result<Reporter<JsonFileStore, HarvestClient>> {
    let token = token_from(env::var(TOKEN_VARIABLE).ok())?;

    let client = HarvestClient::connect(token, Box::new(DefaultClock)).await?;
    println!("Using Account {}={}", client.account().id, client.account().name);
    let user = client.user();
    println!("Logged in as {} {} ({})", user.first_name, user.last_name, user.id);

    let allocator = ShortCodeAllocator::load(JsonFileStore::new(map_file)).await?;
    println!(
        "Loaded {} short codes from {}",
        allocator.map().len(),
        allocator.store().location()
    );

    Ok(Reporter::new(allocator, client, Box::new(DefaultClock)))
}

/// Reads commands from stdin until `q` or end of input. A failing command is reported and the
/// loop carries on.
async fn run_loop<S: ShortCodeStore, T: TimeEntrySource>(
    reporter: &mut Reporter<S, T>,
    out: &mut impl Write,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        writeln!(out)?;
        write!(out, "{}", Colour::Yellow.paint(PROMPT))?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            info!("Input closed");
            return Ok(());
        };

        match reporter.execute(Command::parse(&line), out).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => {
                error!("Command {line:?} failed {e:?}");
                eprintln!("{e:#}");
            }
        }
    }
}
