//! `snapkeep console` – line-based control panel on stdin.
//! Protocol: one command per line: `url <URL>`, `dest <DIR>`, `clear`, `start`,
//! `stop`, `status`, `help`, `quit`. The job log is printed as it arrives.

use anyhow::Result;
use snapkeep_core::config::SnapkeepConfig;
use snapkeep_core::fetcher::Fetcher;
use snapkeep_core::scheduler::{RunState, SnapshotJob};
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::log_view::{shutdown, spawn_log_printer};

const HELP: &str = "commands:
  url <URL>    set the source URL (http/https)
  dest <DIR>   set the destination directory
  clear        unset URL and destination
  start        start the periodic job
  stop         stop the periodic job
  status       show state and settings
  help         show this text
  quit         stop the job and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    Url(String),
    Dest(PathBuf),
    Clear,
    Start,
    Stop,
    Status,
    Help,
    Quit,
}

/// Parses one input line. `Ok(None)` for blank lines.
pub(crate) fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let no_arg = |cmd: ConsoleCommand| {
        if rest.is_empty() {
            Ok(Some(cmd))
        } else {
            Err(format!("`{}` takes no argument", word))
        }
    };
    match word.to_ascii_lowercase().as_str() {
        "url" if rest.is_empty() => Err("usage: url <URL>".to_string()),
        "url" => Ok(Some(ConsoleCommand::Url(rest.to_string()))),
        "dest" if rest.is_empty() => Err("usage: dest <DIR>".to_string()),
        "dest" => Ok(Some(ConsoleCommand::Dest(PathBuf::from(rest)))),
        "clear" => no_arg(ConsoleCommand::Clear),
        "start" => no_arg(ConsoleCommand::Start),
        "stop" => no_arg(ConsoleCommand::Stop),
        "status" => no_arg(ConsoleCommand::Status),
        "help" | "?" => no_arg(ConsoleCommand::Help),
        "quit" | "exit" => no_arg(ConsoleCommand::Quit),
        other => Err(format!("unknown command `{}` (try `help`)", other)),
    }
}

fn print_status(job: &SnapshotJob) {
    let cfg = job.config();
    let schedule = job.schedule();
    let state = match job.state() {
        RunState::Idle => "idle",
        RunState::Running => "running",
    };
    println!("state:       {}", state);
    println!("url:         {}", cfg.url.as_deref().unwrap_or("-"));
    println!(
        "destination: {}",
        cfg.destination
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "interval:    {}s, retention: {} days",
        schedule.interval.as_secs(),
        schedule.retention_days
    );
}

/// Reads stdin on a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Applies one command. Returns false when the console should exit.
fn dispatch(job: &SnapshotJob, cmd: ConsoleCommand) -> bool {
    match cmd {
        ConsoleCommand::Url(url) => match job.set_url(&url) {
            Ok(()) => println!("url set"),
            Err(e) => eprintln!("error: {}", e),
        },
        ConsoleCommand::Dest(dir) => match job.set_destination(dir) {
            Ok(()) => println!("destination set"),
            Err(e) => eprintln!("error: {}", e),
        },
        ConsoleCommand::Clear => {
            job.clear_config();
            println!("settings cleared");
        }
        ConsoleCommand::Start => {
            if let Err(e) = job.start() {
                eprintln!("start rejected: {}", e);
            }
        }
        ConsoleCommand::Stop => {
            if job.state() == RunState::Idle {
                println!("job is not running");
            } else {
                job.stop();
            }
        }
        ConsoleCommand::Status => print_status(job),
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => return false,
    }
    true
}

pub async fn run_console(
    cfg: &SnapkeepConfig,
    url: Option<&str>,
    dest: Option<PathBuf>,
) -> Result<()> {
    let (job, rx) = SnapshotJob::new(cfg.schedule(), Fetcher::new(cfg.fetch_config()));
    if let Some(url) = url {
        job.set_url(url)?;
    }
    if let Some(dest) = dest {
        job.set_destination(dest)?;
    }
    let printer = spawn_log_printer(rx);

    println!("snapkeep console. Type `help` for commands.");
    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line.transpose()? else { break };
                match parse_line(&line) {
                    Ok(Some(cmd)) => {
                        if !dispatch(&job, cmd) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => eprintln!("{}", msg),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    shutdown(job, printer).await
}
