#![deny(clippy::unwrap_used)]

use clap::builder::BoolishValueParser;
use clap::{arg, command, value_parser, ArgMatches};
use std::process::exit;

use xdmctrl::cli;
use xdmctrl::proto::command::{
    Command, CurrentRange, RawCommand, Screen, Speed, TemperatureUnit, VoltageRange,
};
use xdmctrl::{Device, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = build_cli().get_matches();

    cli::init_logging(matches.get_count("debug"));
    let resource = cli::resource(&matches);

    let mut device = match cli::open_device(&matches).await {
        Ok(device) => device,
        Err(err) => cli::report_error(&err, &resource),
    };
    eprintln!("Connected to: {}\n", resource);

    if let Err(err) = handle_args(&mut device, &matches).await {
        cli::report_error(&err, &resource);
    }
    exit(0);
}

fn build_cli() -> clap::Command {
    command!() // requires `cargo` feature
        .about("Send single commands to an OWON XDM multimeter")
        .args(cli::connection_args())
        .subcommand(clap::Command::new("ident").about("Device identification"))
        .subcommand(clap::Command::new("remote").about("Lock the front panel (remote mode)"))
        .subcommand(clap::Command::new("local").about("Unlock the front panel (local mode)"))
        .subcommand(
            clap::Command::new("beeper")
                .about("Beeper")
                .arg(arg!([state] "Set beeper").value_parser(BoolishValueParser::new())),
        )
        .subcommand(
            clap::Command::new("rate")
                .about("Measurement rate")
                .arg(arg!([speed] "Set rate: S, M or F").value_parser(value_parser!(Speed))),
        )
        .subcommand(
            clap::Command::new("function")
                .about("Function on the main display")
                .arg(arg!([display] "Numbered display: 1 or 2").value_parser(value_parser!(Screen))),
        )
        .subcommand(
            clap::Command::new("temperature-unit")
                .about("Unit of RTD temperature readings")
                .arg(arg!([unit] "Set unit: C, F or K").value_parser(value_parser!(TemperatureUnit))),
        )
        .subcommand(
            clap::Command::new("configure")
                .about("Select the measurement function")
                .subcommand_required(true)
                .subcommand(
                    clap::Command::new("voltage-dc").arg(
                        arg!([range] "Range, e.g. 5V (default auto)")
                            .value_parser(value_parser!(VoltageRange)),
                    ),
                )
                .subcommand(
                    clap::Command::new("voltage-ac").arg(
                        arg!([range] "Range, e.g. 50V (default auto)")
                            .value_parser(value_parser!(VoltageRange)),
                    ),
                )
                .subcommand(
                    clap::Command::new("current-dc").arg(
                        arg!([range] "Range, e.g. 500mA (default auto)")
                            .value_parser(value_parser!(CurrentRange)),
                    ),
                )
                .subcommand(
                    clap::Command::new("current-ac").arg(
                        arg!([range] "Range, e.g. 5A (default auto)")
                            .value_parser(value_parser!(CurrentRange)),
                    ),
                )
                .subcommand(clap::Command::new("resistance"))
                .subcommand(clap::Command::new("capacitance"))
                .subcommand(clap::Command::new("frequency"))
                .subcommand(clap::Command::new("period"))
                .subcommand(clap::Command::new("diode"))
                .subcommand(clap::Command::new("continuity"))
                .subcommand(clap::Command::new("temperature")),
        )
        .subcommand(
            clap::Command::new("measure")
                .about("Read the meter")
                .arg(
                    arg!([quantity] "What to read")
                        .value_parser(["voltage", "current", "display", "display1", "display2"])
                        .default_value("display"),
                ),
        )
        .subcommand(clap::Command::new("reset").about("Reset device"))
        .subcommand(
            clap::Command::new("send")
                .about("Send a raw SCPI command, queries print their reply")
                .arg(arg!(<command> "SCPI command").value_parser(value_parser!(RawCommand))),
        )
        .subcommand_required(true)
}

async fn handle_args(device: &mut Device, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("ident", _args)) => {
            let ident = device.ident().await?;
            println!("Manufacturer: {}", ident.manufacturer);
            println!("Model: {}", ident.model);
            println!("Serial: {}", ident.serial);
            println!("Firmware: {}", ident.firmware);
        }
        Some(("remote", _args)) => {
            device.set_remote().await?;
            println!("OK");
        }
        Some(("local", _args)) => {
            device.set_local().await?;
            println!("OK");
        }
        Some(("beeper", args)) => {
            if let Some(state) = args.get_one::<bool>("state") {
                device.set_beeper(*state).await?;
                println!("OK");
            } else {
                let state = device.beeper().await?;
                println!("Beeper: {}", if state { "ON" } else { "OFF" });
            }
        }
        Some(("rate", args)) => {
            if let Some(speed) = args.get_one::<Speed>("speed") {
                device.set_rate(*speed).await?;
                println!("OK");
            } else {
                println!("Rate: {:?}", device.rate().await?);
            }
        }
        Some(("function", args)) => {
            let function = match args.get_one::<Screen>("display") {
                Some(screen) => device.function_of(*screen).await?,
                None => device.function().await?,
            };
            println!("Function: {}", function);
        }
        Some(("temperature-unit", args)) => {
            if let Some(unit) = args.get_one::<TemperatureUnit>("unit") {
                device.set_temperature_unit(*unit).await?;
                println!("OK");
            } else {
                println!("Temperature unit: {}", device.temperature_unit().await?);
            }
        }
        Some(("configure", args)) => {
            match args.subcommand() {
                Some(("voltage-dc", args)) => {
                    device
                        .configure_voltage_dc(args.get_one::<VoltageRange>("range").copied())
                        .await?
                }
                Some(("voltage-ac", args)) => {
                    device
                        .configure_voltage_ac(args.get_one::<VoltageRange>("range").copied())
                        .await?
                }
                Some(("current-dc", args)) => {
                    device
                        .configure_current_dc(args.get_one::<CurrentRange>("range").copied())
                        .await?
                }
                Some(("current-ac", args)) => {
                    device
                        .configure_current_ac(args.get_one::<CurrentRange>("range").copied())
                        .await?
                }
                Some(("resistance", _args)) => device.configure_resistance().await?,
                Some(("capacitance", _args)) => device.configure_capacitance().await?,
                Some(("frequency", _args)) => device.configure_frequency().await?,
                Some(("period", _args)) => device.configure_period().await?,
                Some(("diode", _args)) => device.configure_diode().await?,
                Some(("continuity", _args)) => device.configure_continuity().await?,
                Some(("temperature", _args)) => device.configure_temperature().await?,
                _ => {
                    eprintln!("Unknown function");
                    exit(-1);
                }
            }
            println!("OK");
        }
        Some(("measure", args)) => {
            match args.get_one::<String>("quantity").map(String::as_str) {
                Some("voltage") => println!("{:.5} V", device.measure_voltage().await?),
                Some("current") => println!("{:.5} A", device.measure_current().await?),
                Some("display1") => println!("{}", device.measure_screen(Screen::First).await?),
                Some("display2") => println!("{}", device.measure_screen(Screen::Second).await?),
                _ => println!("{}", device.measure().await?),
            }
        }
        Some(("reset", _args)) => {
            device.reset().await?;
            println!("OK");
        }
        Some(("send", args)) => {
            if let Some(raw) = args.get_one::<RawCommand>("command") {
                let command = Command::Raw(raw.clone());
                let query = command.is_query();
                match device.send(command, query).await? {
                    Some(reply) => println!("{}", reply),
                    None => println!("OK"),
                }
            }
        }
        _ => {
            eprintln!("Unknown command");
            exit(-1);
        }
    }

    Ok(())
}
