//! Demo of the single-flight executor against a simulated controller.
//!
//! The controller owns a thread, accepts one command at a time and reports
//! completion through `notify_completion`, as a device driver callback would.
//! Several caller threads submit operations concurrently; the executor keeps
//! at most one command outstanding.
//!
//! # Usage
//!
//! ```sh
//! oneflight-demo --ops 20 --callers 4 --latency-ms 5 --fail-every 7
//! RUST_LOG=oneflight=debug cargo run --features tracing --bin oneflight-demo -- --timeout-ms 2
//! ```

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use oneflight::{
    ExecError, Executor, ExecutorConfig, ExecutorError, OK_STATUS, Operation, OperationError,
    OperationId,
};

/// Default number of operations per caller.
const DEFAULT_OPS: usize = 10;

/// Default number of caller threads.
const DEFAULT_CALLERS: usize = 2;

/// Default simulated command latency in milliseconds.
const DEFAULT_LATENCY_MS: u64 = 5;

/// Status the simulated controller reports for a failed command.
const FAILURE_STATUS: i32 = -5;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("invalid arguments: {0}")]
    Args(String),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("failed to spawn {0} thread: {1}")]
    Spawn(&'static str, std::io::Error),
}

struct DemoConfig {
    ops: usize,
    callers: usize,
    latency: Duration,
    /// Fail every n-th command (0 disables failures).
    fail_every: u64,
    /// Per-call caller timeout; `None` waits indefinitely.
    timeout: Option<Duration>,
    /// Watchdog bound for commands the controller drops.
    stuck_timeout: Option<Duration>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("oneflight-demo: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    oneflight::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let demo = parse_args(&args)?;

    let executor = Executor::<u64>::new(ExecutorConfig {
        name: "demo".into(),
        stuck_timeout: demo.stuck_timeout,
        ..ExecutorConfig::default()
    })?;
    eprintln!(
        "oneflight-demo: executor {} with {} caller(s) x {} op(s)",
        executor.id(),
        demo.callers,
        demo.ops
    );

    let (commands, controller) = spawn_controller(executor.clone(), demo.latency, demo.fail_every)?;

    let mut callers = Vec::with_capacity(demo.callers);
    for caller in 0..demo.callers {
        let executor = executor.clone();
        let commands = commands.clone();
        let ops = demo.ops;
        let timeout = demo.timeout;
        let handle = thread::Builder::new()
            .name(format!("caller-{caller}"))
            .spawn(move || run_caller(caller, &executor, &commands, ops, timeout))
            .map_err(|e| DemoError::Spawn("caller", e))?;
        callers.push(handle);
    }
    drop(commands);

    let mut tally = Tally::default();
    for handle in callers {
        if let Ok(t) = handle.join() {
            tally.merge(t);
        }
    }
    let served = controller.join().unwrap_or(0);

    let stats = executor.stats();
    executor.shutdown();
    println!(
        "ok={} failed={} timed_out={} served={} admitted={} completed={} ignored={} abandoned={}",
        tally.ok,
        tally.failed,
        tally.timed_out,
        served,
        stats.admitted,
        stats.completed,
        stats.ignored_notifications,
        stats.abandoned
    );
    Ok(())
}

#[derive(Debug, Default)]
struct Tally {
    ok: usize,
    failed: usize,
    timed_out: usize,
}

impl Tally {
    fn merge(&mut self, other: Self) {
        self.ok += other.ok;
        self.failed += other.failed;
        self.timed_out += other.timed_out;
    }
}

fn run_caller(
    caller: usize,
    executor: &Executor<u64>,
    commands: &mpsc::Sender<OperationId>,
    ops: usize,
    timeout: Option<Duration>,
) -> Tally {
    let mut tally = Tally::default();
    for _ in 0..ops {
        let commands = commands.clone();
        let op = Operation::asynchronous(move |id| {
            commands
                .send(id)
                .map_err(|e| OperationError::with_source("controller stopped", e))
        });
        let result = match timeout {
            Some(t) => executor.execute_timeout(op, t),
            None => executor.execute(op),
        };
        match result {
            Ok(value) => {
                tally.ok += 1;
                println!("caller-{caller}: ok {value}");
            }
            Err(ExecError::Timeout(d)) => {
                tally.timed_out += 1;
                println!("caller-{caller}: gave up after {d:?}");
            }
            Err(e) => {
                tally.failed += 1;
                println!("caller-{caller}: {e}");
            }
        }
    }
    tally
}

/// Spawns the simulated controller. Returns the command sender and a handle
/// yielding the number of commands served.
fn spawn_controller(
    executor: Executor<u64>,
    latency: Duration,
    fail_every: u64,
) -> Result<(mpsc::Sender<OperationId>, thread::JoinHandle<usize>), DemoError> {
    let (tx, rx) = mpsc::channel::<OperationId>();
    let handle = thread::Builder::new()
        .name("controller".into())
        .spawn(move || {
            let mut served = 0;
            for id in rx {
                thread::sleep(latency);
                let status = if fail_every != 0 && id.get() % fail_every == 0 {
                    FAILURE_STATUS
                } else {
                    OK_STATUS
                };
                executor.notify_completion_with(id, status, id.get());
                served += 1;
            }
            served
        })
        .map_err(|e| DemoError::Spawn("controller", e))?;
    Ok((tx, handle))
}

/// Parses command line arguments into a `DemoConfig`.
fn parse_args(args: &[String]) -> Result<DemoConfig, DemoError> {
    let mut demo = DemoConfig {
        ops: DEFAULT_OPS,
        callers: DEFAULT_CALLERS,
        latency: Duration::from_millis(DEFAULT_LATENCY_MS),
        fail_every: 0,
        timeout: None,
        stuck_timeout: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            print_usage();
            std::process::exit(0);
        }
        i += 1;
        let value = args
            .get(i)
            .ok_or_else(|| DemoError::Args(format!("missing value for {flag}")))?;
        match flag {
            "--ops" | "-n" => demo.ops = parse_num(flag, value)?,
            "--callers" | "-c" => demo.callers = parse_num(flag, value)?,
            "--latency-ms" | "-l" => demo.latency = Duration::from_millis(parse_num(flag, value)?),
            "--fail-every" | "-f" => demo.fail_every = parse_num(flag, value)?,
            "--timeout-ms" | "-t" => {
                demo.timeout = Some(Duration::from_millis(parse_num(flag, value)?));
            }
            "--stuck-ms" | "-s" => {
                demo.stuck_timeout = Some(Duration::from_millis(parse_num(flag, value)?));
            }
            _ => return Err(DemoError::Args(format!("unknown argument: {flag}"))),
        }
        i += 1;
    }
    Ok(demo)
}

fn parse_num<N: std::str::FromStr>(flag: &str, value: &str) -> Result<N, DemoError>
where
    N::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DemoError::Args(format!("{flag} {value}: {e}")))
}

fn print_usage() {
    eprintln!(
        r#"oneflight-demo - single-flight executor against a simulated controller

USAGE:
    oneflight-demo [OPTIONS]

OPTIONS:
    -n, --ops <N>            Operations per caller (default: 10)
    -c, --callers <N>        Concurrent caller threads (default: 2)
    -l, --latency-ms <MS>    Simulated command latency (default: 5)
    -f, --fail-every <N>     Fail every N-th command id (default: never)
    -t, --timeout-ms <MS>    Per-call caller timeout (default: wait forever)
    -s, --stuck-ms <MS>      Watchdog bound for unanswered commands (default: off)
    -h, --help               Print this help message

EXAMPLE:
    oneflight-demo --ops 20 --callers 4 --fail-every 7
"#
    );
}
