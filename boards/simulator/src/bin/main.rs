#[macro_use]
extern crate log;

use std::str::FromStr;

use env_logger::Env;
use serde::Serialize;

use heli_flight::{config::Config, fcs::out::Telemetry};
use simulator::{mission::Mission, Options, Simulator};

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Report {
    time: f32,
    #[serde(flatten)]
    telemetry: Telemetry,
    rig_altitude: f32,
    rig_bearing: f32,
}

fn parse<T: FromStr>(matches: &clap::ArgMatches, name: &str, default: T) -> Result<T, String> {
    match matches.value_of(name) {
        Some(value) => value.parse().map_err(|_| format!("Invalid {}: {}", name, value)),
        None => Ok(default),
    }
}

fn run(matches: &clap::ArgMatches) -> Result<(), String> {
    let config = Config::default();
    if matches.is_present("dump-config") {
        let dump = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
        println!("{}", dump);
        return Ok(());
    }

    let start_yaw: u16 = parse(matches, "start-yaw", 200)?;
    let duration: u64 = parse(matches, "duration", 60)?;
    let report_interval: u64 = parse(matches, "report-interval", 100)?;

    let options = Options { start_yaw: start_yaw % 360 };
    let mut simulator = Simulator::new(config, options).map_err(|e| e.to_string())?;
    let mut mission = Mission::new();
    let mut next_report = 0;
    while !mission.is_done() && simulator.elapsed_ms() < duration * 1000 {
        let now = simulator.elapsed_ms();
        mission.step(now, simulator.telemetry(), simulator.panel());
        simulator.step();
        if now < next_report {
            continue;
        }
        next_report = now + report_interval;
        if let Some(telemetry) = simulator.telemetry() {
            let plant = simulator.plant();
            let report = Report {
                time: now as f32 / 1000.0,
                telemetry,
                rig_altitude: plant.altitude(),
                rig_bearing: plant.bearing(),
            };
            println!("{}", serde_json::to_string(&report).map_err(|e| e.to_string())?);
        }
    }
    match mission.is_done() {
        true => info!("Mission completed in {}ms", simulator.elapsed_ms()),
        false => warn!("Mission stopped at {:?} after {}s", mission.phase(), duration),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let matches = clap::App::new("simulator")
        .version("0.1")
        .author("qiuchengxuan")
        .about("Helicopter rig flight controller simulator")
        .arg(
            clap::Arg::with_name("start-yaw")
                .long("start-yaw")
                .help("Mechanical yaw at power on, degrees")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("duration")
                .long("duration")
                .help("Give up after this many simulated seconds")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("report-interval")
                .long("report-interval")
                .help("Telemetry interval, milliseconds")
                .takes_value(true),
        )
        .arg(clap::Arg::with_name("dump-config").long("dump-config").help("Print configuration"))
        .get_matches();
    if let Some(error) = run(&matches).err() {
        println!("{}", error);
        std::process::exit(1);
    }
}
