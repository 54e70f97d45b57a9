use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tasksync::config::{self, Config};
use tasksync::console::{self, ConsoleSurface};
use tasksync::html::HtmlSurface;
use tasksync::surface::CreateForm;
use tasksync::{ui, Controller, Filter, HttpTaskApi, Priority, Status, TaskId};
use tokio::runtime::Runtime;

const LOG_ENV: &str = "TASKSYNC_LOG";

fn cli() -> Command {
    let id = || {
        Arg::new("id")
            .required(true)
            .value_parser(value_parser!(TaskId))
            .help("Task id")
    };
    let priority = || {
        Arg::new("priority")
            .long("priority")
            .short('p')
            .value_parser(["low", "medium", "high"])
            .help("Task priority")
    };

    Command::new("tasksync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal client for a task server")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .default_value(config::DEFAULT_CONFIG_FILE)
                .help("Config file"),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .short('s')
                .global(true)
                .help("Server base URL, overrides config and TASKSYNC_SERVER"),
        )
        .subcommand(Command::new("init").about("Write a default config file"))
        .subcommand(Command::new("show").about("Open the task board (default)"))
        .subcommand(
            Command::new("list")
                .about("List tasks")
                .arg(
                    Arg::new("status")
                        .long("status")
                        .value_parser(["all", "pending", "completed"])
                        .default_value("all"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "html"])
                        .default_value("text")
                        .help("Print plain lines or escaped markup fragments"),
                ),
        )
        .subcommand(Command::new("stats").about("Show task counts"))
        .subcommand(
            Command::new("add")
                .about("Add a new task")
                .arg(Arg::new("title").required(true).help("Task title"))
                .arg(Arg::new("description").long("description").short('d'))
                .arg(priority().default_value("medium")),
        )
        .subcommand(Command::new("toggle").about("Flip a task between pending and completed").arg(id()))
        .subcommand(
            Command::new("edit")
                .about("Replace a task's fields")
                .arg(id())
                .arg(Arg::new("title").long("title").short('t'))
                .arg(Arg::new("description").long("description").short('d'))
                .arg(priority())
                .arg(Arg::new("status").long("status").value_parser(["pending", "completed"])),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a task")
                .arg(id())
                .arg(Arg::new("yes").long("yes").short('y').action(ArgAction::SetTrue).help("Skip confirmation")),
        )
        .subcommand(Command::new("check").about("Check that the task server is reachable and consistent"))
}

/// The board logs to a file, so it can afford `info`; one-shot commands share
/// stderr with their output and stay at `warn`.
fn default_log_level(log_file: Option<&Path>) -> &'static str {
    if log_file.is_some() {
        "info"
    } else {
        "warn"
    }
}

fn init_logger(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env = env_logger::Env::new().filter_or(LOG_ENV, default_log_level(log_file));
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let path = matches
        .get_one::<PathBuf>("config")
        .ok_or_else(|| anyhow!("missing config path"))?;
    let config = Config::load(path)?.with_overrides(
        std::env::var(config::SERVER_ENV).ok(),
        matches.get_one::<String>("server").map(String::as_str),
    );
    Ok(config)
}

fn parse_opt<T>(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .get_one::<String>(name)
        .map(|raw| raw.parse::<T>())
        .transpose()
        .map_err(Into::into)
}

fn required_id(matches: &ArgMatches) -> anyhow::Result<TaskId> {
    matches
        .get_one::<TaskId>("id")
        .copied()
        .ok_or_else(|| anyhow!("missing task id"))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();

    if let Some(("init", _)) = matches.subcommand() {
        let path = matches
            .get_one::<PathBuf>("config")
            .ok_or_else(|| anyhow!("missing config path"))?;
        Config::init(path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&matches)?;
    let board_mode = matches!(matches.subcommand(), None | Some(("show", _)));
    init_logger(board_mode.then_some(config.log_file.as_path()))?;

    let rt: Runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let api = HttpTaskApi::new(&config.server_url, config.request_timeout())?;

    let console_surface = || ConsoleSurface::new(io::stdin().lock(), io::stdout());
    let ok = match matches.subcommand() {
        None | Some(("show", _)) => {
            ui::run_board(&rt, api, config.toggle_failures)?;
            true
        }
        Some(("list", sub)) => {
            let filter = parse_opt::<Filter>(sub, "status")?.unwrap_or_default();
            if sub.get_one::<String>("format").is_some_and(|format| format == "html") {
                let mut controller = Controller::new(api, HtmlSurface::new(io::stdout()));
                rt.block_on(controller.set_filter(filter))
            } else {
                let mut controller = Controller::new(api, console_surface());
                rt.block_on(controller.set_filter(filter))
            }
        }
        Some(("stats", _)) => {
            let mut controller = Controller::new(api, console_surface().hide_list());
            rt.block_on(controller.reload())
        }
        Some(("add", sub)) => {
            let form = CreateForm {
                title: sub.get_one::<String>("title").cloned().unwrap_or_default(),
                description: sub.get_one::<String>("description").cloned().unwrap_or_default(),
                priority: parse_opt::<Priority>(sub, "priority")?.unwrap_or_default(),
            };
            let mut controller = Controller::new(api, console_surface());
            rt.block_on(controller.create(&form))
        }
        Some(("toggle", sub)) => {
            let id = required_id(sub)?;
            let mut controller = Controller::new(api, console_surface()).with_toggle_failures(config.toggle_failures);
            rt.block_on(controller.toggle(id))
        }
        Some(("edit", sub)) => {
            let id = required_id(sub)?;
            let mut controller = Controller::new(api, console_surface());
            if !rt.block_on(controller.open_edit(id)) {
                eprintln!("Could not open task {id} for editing");
                return Ok(ExitCode::FAILURE);
            }
            let mut form = controller.surface_mut().edit.take().unwrap_or_default();
            if let Some(title) = sub.get_one::<String>("title") {
                form.title = title.clone();
            }
            if let Some(description) = sub.get_one::<String>("description") {
                form.description = description.clone();
            }
            if let Some(priority) = parse_opt::<Priority>(sub, "priority")? {
                form.priority = priority;
            }
            if let Some(status) = parse_opt::<Status>(sub, "status")? {
                form.status = status;
            }
            rt.block_on(controller.submit_edit(&form))
        }
        Some(("delete", sub)) => {
            let id = required_id(sub)?;
            let mut controller = Controller::new(api, console_surface().assume_yes(sub.get_flag("yes")));
            rt.block_on(controller.delete(id))
        }
        Some(("check", _)) => rt.block_on(console::check(&api, &config.server_url, &mut io::stdout()))?,
        Some((other, _)) => return Err(anyhow!("unknown command {other}")),
    };
    Ok(exit_code(ok))
}
