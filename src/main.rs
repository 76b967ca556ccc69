use std::cell::Cell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use kairos::{
    logging, Periodic, RunSummary, SimConfig, SimDuration, SimError, SimResult, SimTime,
    Simulation,
};

/// Deterministic discrete-event simulation demos.
#[derive(Parser, Debug)]
#[command(name = "kairos", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Record an execution trace and print its hash
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,

    /// Write the execution trace to this file (implies --trace)
    #[arg(long, global = true)]
    trace_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a greeting every simulated second
    Hello(HelloArgs),
    /// Echo clients sending a few packets each to one server
    EchoApps(EchoArgs),
}

#[derive(Args, Debug)]
struct HelloArgs {
    #[arg(long, default_value = "kairos")]
    name: String,

    #[arg(long, default_value = "0")]
    number: String,

    /// Stop time in simulated seconds (inclusive)
    #[arg(long, value_parser = parse_stop_secs)]
    stop: Option<f64>,
}

#[derive(Args, Debug)]
struct EchoArgs {
    #[arg(long, default_value_t = 6)]
    clients: u64,

    /// Stop time in simulated seconds (inclusive)
    #[arg(long, value_parser = parse_stop_secs)]
    stop: Option<f64>,
}

const ECHO_INTERVAL: SimDuration = SimDuration::from_millis(100);
const ECHO_MAX_PACKETS: u64 = 4;
const ECHO_LINK_DELAY: SimDuration = SimDuration::from_millis(2);

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };
    logging::init(&config.log.filter);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "simulation failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &SimConfig) -> SimResult<()> {
    let mut sim = Simulation::from_config(config)?;
    if cli.trace || cli.trace_out.is_some() {
        sim.enable_trace_with_checkpoints(config.trace.checkpoint_interval.unwrap_or(100));
    }

    let summary = match &cli.command {
        Command::Hello(args) => {
            apply_stop(&mut sim, args.stop, 5.0)?;
            hello(&mut sim, args)?
        }
        Command::EchoApps(args) => {
            apply_stop(&mut sim, args.stop, 20.0)?;
            echo_apps(&mut sim, args)?
        }
    };
    tracing::debug!(?summary, "run summary");

    if let Some(trace) = sim.trace() {
        println!(
            "trace: {} events, {} checkpoints, hash {:016x}",
            trace.len(),
            trace.checkpoints().len(),
            trace.trace_hash()
        );
        if let Some(path) = &cli.trace_out {
            trace.export_to_file(path).map_err(|source| {
                SimError::Config(kairos::ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            })?;
        }
    }

    sim.destroy();
    Ok(())
}

fn parse_stop_secs(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a number of seconds"))?;
    match SimDuration::try_from_secs_f64(secs) {
        Some(delay) if !delay.is_negative() => Ok(secs),
        _ => Err(format!("`{s}` is not a non-negative stop time the clock can hold")),
    }
}

/// A `--stop` flag wins over the config file, which wins over `default_secs`.
fn apply_stop(sim: &mut Simulation, flag: Option<f64>, default_secs: f64) -> SimResult<()> {
    if let Some(secs) = flag {
        sim.stop_after(SimDuration::from_secs_f64(secs))
    } else if sim.stop_time().is_none() {
        sim.stop_after(SimDuration::from_secs_f64(default_secs))
    } else {
        Ok(())
    }
}

fn hello(sim: &mut Simulation, args: &HelloArgs) -> SimResult<RunSummary> {
    let name = args.name.clone();
    let number = args.number.clone();
    sim.schedule_periodic(Periodic::every(SimDuration::from_secs(1)), move |ctx| {
        println!("{} {}  {}", ctx.now(), name, number);
    })?;
    sim.run()
}

fn echo_apps(sim: &mut Simulation, args: &EchoArgs) -> SimResult<RunSummary> {
    let sent = Rc::new(Cell::new(0u64));
    let echoed = Rc::new(Cell::new(0u64));

    for client in 0..args.clients {
        let offset = i64::try_from(client).unwrap_or(i64::MAX);
        let start = SimDuration::from_secs(offset.saturating_add(2));
        let stop = SimTime::from_secs(client.saturating_add(10));
        let sent = Rc::clone(&sent);
        let echoed = Rc::clone(&echoed);
        let mut seq = 0u64;

        sim.schedule_periodic(
            Periodic::every(ECHO_INTERVAL)
                .starting_in(start)
                .until(stop)
                .max_runs(ECHO_MAX_PACKETS),
            move |ctx| -> SimResult<()> {
                seq += 1;
                sent.set(sent.get() + 1);
                println!("{} client {client} sent packet {seq}", ctx.now());

                let echoed = Rc::clone(&echoed);
                let packet = seq;
                ctx.schedule(ECHO_LINK_DELAY, move |ctx| -> SimResult<()> {
                    println!("{} server echoed packet {packet} to client {client}", ctx.now());
                    ctx.schedule(ECHO_LINK_DELAY, move |ctx| {
                        echoed.set(echoed.get() + 1);
                        println!("{} client {client} received echo {packet}", ctx.now());
                    })?;
                    Ok(())
                })?;
                Ok(())
            },
        )?;
    }

    let summary = sim.run()?;
    println!(
        "{} clients, {} packets sent, {} echoes received, finished at {}",
        args.clients,
        sent.get(),
        echoed.get(),
        summary.now
    );
    Ok(summary)
}
