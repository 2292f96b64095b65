use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::args::{CliArgs, Command};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::favourites::Toggled;
use crate::output::{self, DisplaySnapshot, OutputFormat};
use crate::runner::{Gesture, Options, RunnerError, Session};
use crate::search::{SearchMode, SearchOutcome};
use crate::source::{CharacterId, CharacterSource, HttpOptions, HttpSource, DEFAULT_API_URL};
use crate::store::{FileStore, KeyValueStore};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn print_status(tag: &str, ok: bool, message: &str) {
    let tag = if ok {
        tag.bold().green()
    } else {
        tag.bold().red()
    };
    println!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message
    );
}

#[derive(Clone, Debug)]
struct RunConfig {
    command: Command,
    api_url: String,
    page_size: u32,
    timeout: usize,
    proxy: Option<String>,
    storage: PathBuf,
    placeholder_image: String,
    search_mode: SearchMode,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
    quiet: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let api_url = args
        .api_url
        .or(cfg.api_url)
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(crate::source::DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page-size, expected positive integer".to_string());
    }
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let storage = args
        .storage
        .or(cfg.storage)
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(config::default_storage_path);

    let placeholder_image = args
        .placeholder_image
        .or(cfg.placeholder_image)
        .unwrap_or_else(|| crate::render::DEFAULT_PLACEHOLDER_IMAGE.to_string());

    let search_mode_raw = args
        .search_mode
        .or(cfg.search_mode)
        .unwrap_or_else(|| "replace".to_string());
    let search_mode = SearchMode::parse(&search_mode_raw).ok_or_else(|| {
        format!("invalid search-mode '{search_mode_raw}', expected replace or swap")
    })?;

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde(&p).to_string_lossy().to_string());
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output-format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        command: args.command.unwrap_or(Command::List),
        api_url,
        page_size,
        timeout,
        proxy,
        storage,
        placeholder_image,
        search_mode,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
        quiet: args.quiet,
    })
}

async fn with_spinner<F: Future>(message: &str, enabled: bool, fut: F) -> F::Output {
    let target = if enabled {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    };
    let pb = ProgressBar::with_draw_target(None, target);
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    pb.finish_and_clear();
    out
}

fn describe_toggle(toggled: Toggled, id: CharacterId, name: Option<&str>) -> String {
    let who = match name {
        Some(name) => format!("{name} ({id})"),
        None => id.to_string(),
    };
    match toggled {
        Toggled::Added => format!("added {who} to favourites"),
        Toggled::Redecorated => format!("{who} is already a favourite"),
        Toggled::Removed => format!("removed {who} from favourites"),
    }
}

fn card_name<C, S>(session: &Session<C, S>, id: CharacterId) -> Option<String>
where
    C: CharacterSource,
    S: KeyValueStore,
{
    let state = session.state();
    state
        .visible()
        .find(id)
        .or_else(|| {
            state
                .surface(crate::render::SurfaceKind::Favourites)
                .find(id)
        })
        .map(|card| card.name.clone())
}

async fn activate<C, S>(session: &mut Session<C, S>, id: CharacterId, spinner: bool)
where
    C: CharacterSource,
    S: KeyValueStore,
{
    let result = with_spinner("looking up character", spinner, session.activate_by_id(id)).await;
    report_toggle(session, id, result);
}

fn close<C, S>(session: &mut Session<C, S>, id: CharacterId)
where
    C: CharacterSource,
    S: KeyValueStore,
{
    let name = card_name(session, id);
    let result = session.dispatch(Gesture::Close(id));
    match result {
        Ok(toggled) => print_status("OK", true, &describe_toggle(toggled, id, name.as_deref())),
        Err(e) => print_status("ERR", false, &e.to_string()),
    }
}

fn report_toggle<C, S>(
    session: &Session<C, S>,
    id: CharacterId,
    result: Result<Toggled, RunnerError>,
) where
    C: CharacterSource,
    S: KeyValueStore,
{
    match result {
        Ok(toggled) => {
            let name = card_name(session, id);
            print_status("OK", true, &describe_toggle(toggled, id, name.as_deref()));
        }
        Err(e) => print_status("ERR", false, &e.to_string()),
    }
}

async fn search<C, S>(session: &mut Session<C, S>, text: &str, spinner: bool)
where
    C: CharacterSource,
    S: KeyValueStore,
{
    match with_spinner("searching", spinner, session.search(text)).await {
        Ok(SearchOutcome::Rendered { count, .. }) => {
            print_status("OK", true, &format!("{count} match(es) for '{text}'"))
        }
        Ok(SearchOutcome::Failed { .. }) => {}
        Err(e) => print_status("ERR", false, &e.to_string()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ShellCommand {
    Fav(CharacterId),
    Close(CharacterId),
    Search(String),
    All,
    Reset,
    List,
    Favourites,
    Help,
    Quit,
    Nothing,
}

fn parse_shell_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Nothing);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let parse_id = |raw: &str| {
        raw.parse::<CharacterId>()
            .map_err(|_| format!("expected a character id, got '{raw}'"))
    };
    match word.to_lowercase().as_str() {
        "fav" | "f" | "click" => parse_id(rest).map(ShellCommand::Fav),
        "close" | "x" => parse_id(rest).map(ShellCommand::Close),
        "search" | "s" => Ok(ShellCommand::Search(rest.to_string())),
        "all" => Ok(ShellCommand::All),
        "reset" => Ok(ShellCommand::Reset),
        "list" | "ls" => Ok(ShellCommand::List),
        "favourites" | "favorites" => Ok(ShellCommand::Favourites),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

const SHELL_HELP: &str = "commands:
  fav ID        toggle a character on the visible list
  close ID      remove a favourite with its close control
  search TEXT   search by name
  all           show the character list again
  reset         remove every favourite
  list          print the lists
  favourites    print the favourites
  quit          leave";

async fn run_shell<C, S>(session: &mut Session<C, S>, run: &RunConfig, spinner: bool) -> Result<(), String>
where
    C: CharacterSource,
    S: KeyValueStore,
{
    print_snapshot(&DisplaySnapshot::capture(session.state()), run)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        print!("> ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("failed to read stdin: {e}"))?
        else {
            break;
        };
        let command = match parse_shell_command(&line) {
            Ok(command) => command,
            Err(e) => {
                print_status("ERR", false, &e);
                continue;
            }
        };
        match command {
            ShellCommand::Nothing => continue,
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{SHELL_HELP}");
                continue;
            }
            ShellCommand::Fav(id) => activate(session, id, spinner).await,
            ShellCommand::Close(id) => close(session, id),
            ShellCommand::Search(text) => search(session, &text, spinner).await,
            ShellCommand::All => {
                if let Err(e) = session.show_all() {
                    print_status("ERR", false, &e.to_string());
                }
            }
            ShellCommand::Reset => match session.reset() {
                Ok(n) => print_status("OK", true, &format!("removed {n} favourite(s)")),
                Err(e) => print_status("ERR", false, &e.to_string()),
            },
            ShellCommand::List => {}
            ShellCommand::Favourites => {
                print_snapshot(&DisplaySnapshot::favourites_only(session.state()), run)?;
                continue;
            }
        }
        print_snapshot(&DisplaySnapshot::capture(session.state()), run)?;
    }
    Ok(())
}

fn print_snapshot(snapshot: &DisplaySnapshot, run: &RunConfig) -> Result<(), String> {
    let rendered = output::render(snapshot, run.output_format, run.verbose > 0)
        .map_err(|e| format!("failed to render output: {e}"))?;
    println!();
    print!("{}", String::from_utf8_lossy(&rendered));
    Ok(())
}

async fn write_output(path: &str, snapshot: &DisplaySnapshot, run: &RunConfig) -> Result<(), String> {
    let rendered = output::render(snapshot, run.output_format, false)
        .map_err(|e| format!("failed to render output: {e}"))?;
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color || run.output_format != OutputFormat::Text {
        colored::control::set_override(false);
    }
    let spinner = !run.quiet && std::io::stderr().is_terminal();

    if run.verbose > 0 {
        format_kv_line("Catalog", &run.api_url);
        format_kv_line("Page size", &run.page_size.to_string());
        format_kv_line("Storage", &run.storage.display().to_string());
        format_kv_line("Search", &run.search_mode.to_string());
        eprintln!();
    }

    let store = FileStore::new(&run.storage);
    let source = HttpSource::new(&HttpOptions {
        base_url: run.api_url.clone(),
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
    })
    .map_err(|e| e.to_string())?;
    let options = Options {
        page_size: run.page_size,
        placeholder_image: run.placeholder_image.clone(),
        search_mode: run.search_mode,
    };
    let mut session = Session::new(options, source, store).map_err(|e| e.to_string())?;

    if run.command == Command::Favourites {
        session.restore().map_err(|e| e.to_string())?;
        let snapshot = DisplaySnapshot::favourites_only(session.state());
        print_snapshot(&snapshot, &run)?;
        if let Some(path) = run.output.as_deref() {
            write_output(path, &snapshot, &run).await?;
        }
        return Ok(());
    }

    with_spinner("loading characters", spinner, session.start())
        .await
        .map_err(|e| e.to_string())?;

    match &run.command {
        Command::List | Command::Favourites => {}
        Command::Fav { ids } => {
            for id in ids {
                activate(&mut session, *id, spinner).await;
            }
        }
        Command::Close { ids } => {
            for id in ids {
                close(&mut session, *id);
            }
        }
        Command::Search { text } => search(&mut session, text, spinner).await,
        Command::Reset => {
            let n = session.reset().map_err(|e| e.to_string())?;
            print_status("OK", true, &format!("removed {n} favourite(s)"));
        }
        Command::Shell => {
            run_shell(&mut session, &run, spinner).await?;
        }
    }

    let snapshot = DisplaySnapshot::capture(session.state());
    if run.command != Command::Shell {
        print_snapshot(&snapshot, &run)?;
    }
    if let Some(path) = run.output.as_deref() {
        write_output(path, &snapshot, &run).await?;
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{e}");
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let config_path = user_config_path.clone().or_else(config::default_config_path);
    if args.init_config {
        if let Some(path) = config_path.as_ref() {
            if config::ensure_default_config_file(path)? {
                eprintln!("wrote default config to {}", path.display());
            }
        }
    }
    let cfg = match (user_config_path.as_ref(), config_path.as_ref()) {
        (Some(path), _) => config::load_config(path, false)?,
        (None, Some(path)) => config::load_config(path, true)?,
        (None, None) => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    crate::logging::init(run.verbose, run.quiet, run.no_color);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("disneycards").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_list_with_builtin_values() {
        let run = build_run_config(parse(&[]), ConfigFile::default()).unwrap();
        assert_eq!(run.command, Command::List);
        assert_eq!(run.api_url, DEFAULT_API_URL);
        assert_eq!(run.page_size, 50);
        assert_eq!(run.search_mode, SearchMode::Replace);
        assert_eq!(run.output_format, OutputFormat::Text);
    }

    #[test]
    fn cli_flags_override_config_file() {
        let cfg = ConfigFile {
            page_size: Some(10),
            search_mode: Some("swap".to_string()),
            api_url: Some("http://localhost:9000".to_string()),
            ..ConfigFile::default()
        };
        let run = build_run_config(parse(&["-n", "5", "search", "mick"]), cfg).unwrap();
        assert_eq!(run.page_size, 5);
        assert_eq!(run.search_mode, SearchMode::Swap);
        assert_eq!(run.api_url, "http://localhost:9000");
        assert_eq!(
            run.command,
            Command::Search {
                text: "mick".to_string()
            }
        );
    }

    #[test]
    fn output_format_is_inferred_from_output_path() {
        let run = build_run_config(parse(&["-o", "faves.json"]), ConfigFile::default()).unwrap();
        assert_eq!(run.output_format, OutputFormat::Json);
        let run = build_run_config(
            parse(&["-o", "faves.json", "--output-format", "html"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);
    }

    #[test]
    fn invalid_config_search_mode_is_rejected() {
        let cfg = ConfigFile {
            search_mode: Some("sideways".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(parse(&[]), cfg).is_err());
    }

    #[test]
    fn fav_accepts_several_ids() {
        let run = build_run_config(parse(&["fav", "1", "2"]), ConfigFile::default()).unwrap();
        assert_eq!(run.command, Command::Fav { ids: vec![1, 2] });
    }

    #[test]
    fn shell_commands_parse() {
        assert_eq!(parse_shell_command("fav 12"), Ok(ShellCommand::Fav(12)));
        assert_eq!(parse_shell_command(" x 3 "), Ok(ShellCommand::Close(3)));
        assert_eq!(
            parse_shell_command("search Mickey Mouse"),
            Ok(ShellCommand::Search("Mickey Mouse".to_string()))
        );
        assert_eq!(
            parse_shell_command("search"),
            Ok(ShellCommand::Search(String::new()))
        );
        assert_eq!(parse_shell_command(""), Ok(ShellCommand::Nothing));
        assert!(parse_shell_command("fav mickey").is_err());
        assert!(parse_shell_command("dance").is_err());
    }
}
