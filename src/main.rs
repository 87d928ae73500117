#![deny(clippy::unwrap_used)]

use chrono::Local;
use clap::{arg, command, value_parser};
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use xdmctrl::cli::{self, positive_seconds, seconds};
use xdmctrl::output::{self, CONSOLE_HEADER};
use xdmctrl::sampler::{Sampler, SamplerConfig, State, StopReason};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = command!() // requires `cargo` feature
        .about("Log voltage (and current) from an OWON XDM multimeter at a fixed interval")
        .args(cli::connection_args())
        .arg(
            arg!(
                --duration <SECS> "Total measurement time in seconds, 0 runs until stopped"
            )
            .default_value("60")
            .value_parser(seconds),
        )
        .arg(
            arg!(
                --interval <SECS> "Interval between measurements in seconds"
            )
            .default_value("1.0")
            .value_parser(positive_seconds),
        )
        .arg(arg!(
            --current "Also measure DC current each cycle"
        ))
        .arg(
            arg!(
                --settle <MS> "Delay after switching the measurement function"
            )
            .default_value("0")
            .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(
                -o --output <DIR> "Directory for the CSV file"
            )
            .default_value("logs")
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(
            --"no-csv" "Do not write a CSV file"
        ))
        .arg(arg!(
            --detach "Do not watch stdin for 'q'"
        ))
        .get_matches();

    cli::init_logging(matches.get_count("debug"));
    let resource = cli::resource(&matches);

    let config = SamplerConfig {
        interval: matches
            .get_one::<Duration>("interval")
            .copied()
            .unwrap_or(Duration::from_secs(1)),
        duration: matches
            .get_one::<Duration>("duration")
            .copied()
            .filter(|d| !d.is_zero()),
        log_current: matches.get_flag("current"),
        settle: Duration::from_millis(*matches.get_one::<u64>("settle").unwrap_or(&0)),
    };

    let device = match cli::open_device(&matches).await {
        Ok(device) => device,
        Err(err) => cli::report_error(&err, &resource),
    };
    eprintln!("Connected to: {}", resource);

    let mut sampler = Sampler::new(device, config);
    match sampler.connect().await {
        Ok(id) => println!("Device ID: {}", id),
        Err(err) => cli::report_error(&err, &resource),
    }

    let stop = CancellationToken::new();
    watch_interrupt(stop.clone());
    if !matches.get_flag("detach") {
        eprintln!("Press 'q' and Enter to stop.");
        watch_stdin(stop.clone());
    }

    let started = Local::now();
    println!("{}", CONSOLE_HEADER);
    let run = sampler.run(stop, |sample| println!("{}", sample)).await;

    match run.state {
        State::Stopped(StopReason::DurationElapsed) => println!("Measurements completed."),
        State::Stopped(StopReason::StopRequested) => println!("Stopped, measurement ended early."),
        _ => {
            if let Some(err) = &run.error {
                eprintln!("Error: {}", err);
            }
        }
    }
    if run.skipped > 0 {
        eprintln!("{} of {} cycles failed and were skipped", run.skipped, run.cycles);
    }

    if !matches.get_flag("no-csv") {
        let dir = matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("logs"));
        match output::save_csv(&dir, started, run.samples.as_slice()) {
            Ok(path) => println!("{} samples saved to {}", run.samples.len(), path.display()),
            Err(err) => {
                eprintln!("Failed to save CSV in {}: {}", dir.display(), err);
                exit(-1);
            }
        }
    }

    // stdin is read on a blocking thread that cannot be cancelled, so leave
    // without waiting for the runtime to shut down.
    exit(if run.state == State::Failed { -1 } else { 0 });
}

fn watch_interrupt(stop: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            stop.cancel();
        }
    });
}

fn watch_stdin(stop: CancellationToken) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("q") => {
                    info!("stop key pressed");
                    break;
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!("end of input");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "cannot read stdin, stop key disabled");
                    return;
                }
            }
        }
        stop.cancel();
    });
}
