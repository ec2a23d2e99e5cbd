//! Console host for the tactor dispatch layer.
//!
//! Reads one command per line from a script file or stdin and dispatches it
//! against the configured driver. Usage:
//!
//!   tactor [--config <path>] [--json] [script]

mod script;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use tactor_dispatch::{CommandOutput, Dispatcher, SharedDispatcher, WeakDispatcher};
use tactor_driver::{SimDriver, TactorDriver};
use tactor_types::config::{DriverKind, TactorConfig};
use tactor_types::error::TactorError;

type BoxedDriver = Box<dyn TactorDriver + Send>;

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    json: bool,
    script: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut opts = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                opts.config = Some(PathBuf::from(path));
            },
            "--json" => opts.json = true,
            s if s.starts_with('-') && s != "-" => bail!("unknown option: {s}"),
            _ => {
                if opts.script.is_some() {
                    bail!("only one script may be given");
                }
                if arg != "-" {
                    opts.script = Some(PathBuf::from(arg));
                }
            },
        }
    }
    Ok(opts)
}

/// One JSON line per dispatched command.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply<'a> {
    Ok {
        line: usize,
        output: &'a CommandOutput,
    },
    Error {
        line: usize,
        id: &'static str,
        message: String,
    },
}

fn report(
    out: &mut impl Write,
    json: bool,
    line: usize,
    result: &tactor_types::error::Result<CommandOutput>,
) -> Result<()> {
    if json {
        let reply = match result {
            Ok(output) => Reply::Ok { line, output },
            Err(e) => Reply::Error {
                line,
                id: e.id(),
                message: e.to_string(),
            },
        };
        writeln!(out, "{}", serde_json::to_string(&reply)?)?;
        return Ok(());
    }
    match result {
        Ok(CommandOutput::None) => {},
        Ok(output) => writeln!(out, "{output}")?,
        Err(e) => report_error(line, e),
    }
    Ok(())
}

fn report_error(line: usize, e: &TactorError) {
    eprintln!("line {line}: {}: {e}", e.id());
    if let Some(help) = e.help() {
        eprintln!("{help}");
    }
}

/// Run every line of `input`. Returns the number of failed lines.
fn run<D: TactorDriver>(
    dispatcher: &SharedDispatcher<D>,
    input: impl BufRead,
    out: &mut impl Write,
    json: bool,
) -> Result<usize> {
    let mut failures = 0;
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.context("failed to read input")?;
        let values = match script::parse_line(&line) {
            Ok(Some(values)) => values,
            Ok(None) => continue,
            Err(msg) => {
                log::warn!("line {line_no}: {msg}");
                eprintln!("line {line_no}: {msg}");
                failures += 1;
                continue;
            },
        };
        let result = dispatcher.invoke(&values);
        if result.is_err() {
            failures += 1;
        }
        report(out, json, line_no, &result)?;
    }
    Ok(failures)
}

fn build_driver(config: &TactorConfig) -> Result<BoxedDriver> {
    match config.driver {
        DriverKind::Sim => Ok(Box::new(SimDriver::new(config.simulator.clone()))),
        DriverKind::Vendor => vendor_driver(config),
    }
}

#[cfg(feature = "vendor")]
fn vendor_driver(config: &TactorConfig) -> Result<BoxedDriver> {
    let driver = tactor_driver::VendorDriver::load(&config.vendor.library)?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "vendor"))]
fn vendor_driver(_config: &TactorConfig) -> Result<BoxedDriver> {
    bail!("driver = \"vendor\" needs a build with the `vendor` feature")
}

/// Shut the session down from the interrupt handler. Returns `false` when
/// the session is already gone.
fn interrupt_shutdown<D: TactorDriver>(session: &WeakDispatcher<D>) -> bool {
    let Some(shared) = session.upgrade() else {
        return false;
    };
    if let Err(e) = shared.shutdown() {
        log::warn!("Shutdown on interrupt failed: {e}");
    }
    true
}

fn main() -> Result<()> {
    let opts = parse_args(std::env::args().skip(1))?;
    let config = TactorConfig::resolve(opts.config.as_deref())?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    log::info!("Starting tactor host ({:?} driver)", config.driver);

    let driver = build_driver(&config)?;
    let dispatcher = SharedDispatcher::new(Dispatcher::with_config(driver, config));

    // SIGINT would otherwise end the process without running the finalizer.
    let weak = dispatcher.downgrade();
    ctrlc::set_handler(move || {
        log::info!("Interrupted; shutting down");
        interrupt_shutdown(&weak);
        std::process::exit(130);
    })
    .context("failed to install interrupt handler")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let failures = match &opts.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run(&dispatcher, BufReader::new(file), &mut out, opts.json)?
        },
        None => run(&dispatcher, io::stdin().lock(), &mut out, opts.json)?,
    };
    out.flush()?;

    // Last strong handle: closes any open device and shuts the interface down.
    drop(dispatcher);

    if failures > 0 {
        bail!("{failures} command(s) failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tactor_driver::func;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run_script(text: &str, json: bool) -> (SharedDispatcher<SimDriver>, String, usize) {
        let d = SharedDispatcher::new(Dispatcher::new(SimDriver::default()));
        let mut out = Vec::new();
        let failures = run(&d, text.as_bytes(), &mut out, json).unwrap();
        (d, String::from_utf8(out).unwrap(), failures)
    }

    #[test]
    fn parses_options() {
        let opts = parse_args(args(&["--json", "-c", "tactor.toml", "demo.tdk"])).unwrap();
        assert!(opts.json);
        assert_eq!(opts.config, Some(PathBuf::from("tactor.toml")));
        assert_eq!(opts.script, Some(PathBuf::from("demo.tdk")));

        let opts = parse_args(args(&["-"])).unwrap();
        assert!(opts.script.is_none());
    }

    #[test]
    fn rejects_bad_options() {
        assert!(parse_args(args(&["--verbose"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["a", "b"])).is_err());
    }

    #[test]
    fn runs_a_session_script() {
        let script = "\
# bring up one device
initialize
3 1
connect 'DEV0' 1
pulse 0 1 100 0
checkConnection
";
        let (d, out, failures) = run_script(script, false);
        assert_eq!(failures, 0);
        assert_eq!(out, "1\n0\ntrue\n");
        let journal = d.lock().session().driver().journal();
        assert_eq!(journal.count(func::PULSE), 1);
        drop(d);
        assert_eq!(journal.count(func::CLOSE), 1);
        assert_eq!(journal.count(func::SHUTDOWN), 1);
    }

    #[test]
    fn counts_failures_and_keeps_going() {
        let script = "connect DEV0 1\nbogus\npulse 0\n'unterminated\ninitialize\n";
        let (d, out, failures) = run_script(script, false);
        assert_eq!(failures, 4);
        assert!(out.is_empty());
        assert!(d.lock().session().is_initialized());
    }

    #[test]
    fn json_lines() {
        let (_d, out, failures) = run_script("initialize\nconnect DEV0 1\nfoo\n", true);
        assert_eq!(failures, 1);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["output"]["kind"], "none");
        assert_eq!(lines[1]["output"]["kind"], "device_id");
        assert_eq!(lines[1]["output"]["value"], 0);
        assert_eq!(lines[2]["status"], "error");
        assert_eq!(lines[2]["id"], "TDK:UnknownCommand");
        assert_eq!(lines[2]["line"], 3);
    }

    #[test]
    fn interrupt_then_exit_cleans_up_once() {
        let (d, _out, failures) = run_script("initialize\nconnect DEV0 1\n", false);
        assert_eq!(failures, 0);
        let journal = d.lock().session().driver().journal();
        let weak = d.downgrade();

        assert!(interrupt_shutdown(&weak));
        assert!(!d.lock().session().is_connected());
        drop(d);

        assert!(!interrupt_shutdown(&weak));
        assert_eq!(journal.count(func::CLOSE), 1);
        assert_eq!(journal.count(func::SHUTDOWN), 1);
    }

    #[test]
    fn default_config_builds_sim_driver() {
        let mut driver = build_driver(&TactorConfig::default()).unwrap();
        assert_eq!(driver.initialize(), 0);
        assert_eq!(driver.discover(1), 1);
    }

    #[cfg(not(feature = "vendor"))]
    #[test]
    fn vendor_driver_needs_feature() {
        let config = TactorConfig {
            driver: DriverKind::Vendor,
            ..TactorConfig::default()
        };
        let err = build_driver(&config).err().expect("vendor driver should fail without feature");
        assert!(err.to_string().contains("vendor"));
    }
}
