use atcommander::config::{ConfigError, ConfigLoader, LogFormat, LoggingConfig};
use atcommander::port::{list_ports, SyncSerialPort};
use atcommander::{AtCommander, AtResult, DeviceFamily, SessionReport, TracingSink};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Configure AT-command serial modules without knowing their baud rate.",
    long_about = "Finds the line rate a Bluetooth or radio module is listening at, puts it into command mode and changes, stores or reboots its configuration."
)]
struct Args {
    /// Configuration file. Defaults to the standard search path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port to use, overriding the configuration.
    #[arg(short, long)]
    port: Option<String>,

    /// Device family (rn42, xbee), overriding the configuration.
    #[arg(short, long)]
    family: Option<DeviceFamily>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// List serial ports on this machine.
    Ports,
    /// Find the device, enter command mode and leave it again.
    Probe,
    /// Change the device baud rate and store it where supported.
    SetBaud { baud: u32 },
    /// Store the current settings.
    Store,
    /// Reboot the device.
    Reboot,
}

/// Result of one command, as printed with `--json`.
#[derive(Debug, Serialize)]
struct Outcome {
    command: String,
    ok: bool,
    error: Option<String>,
    session: SessionReport,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    if let Some(port) = &args.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(family) = args.family {
        config.device.family = family;
        config.device.profile = None;
    }

    init_tracing(&config.logging);
    debug!("Effective configuration: {:?}", config);

    if let Command::Ports = args.command {
        let ports = list_ports()?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&ports)?);
        } else if ports.is_empty() {
            println!("No serial ports found.");
        } else {
            for port in ports {
                let label = port.product.or(port.manufacturer).unwrap_or_default();
                println!("{:<20} {:<16} {}", port.name, port.kind, label);
            }
        }
        return Ok(());
    }

    let port_name = config
        .serial
        .port
        .as_deref()
        .map(|p| config.serial.resolve_port(p))
        .ok_or_else(|| ConfigError::MissingRequired("serial.port (or --port)".to_string()))?;
    let initial_baud = config
        .discovery
        .candidate_bauds
        .first()
        .copied()
        .unwrap_or(atcommander::CANDIDATE_BAUD_RATES[0]);

    let port = SyncSerialPort::open(&port_name, initial_baud, config.serial.read_timeout())?;
    let mut session = AtCommander::new(port, config.platform_profile())
        .with_candidate_bauds(config.discovery.candidate_bauds.iter().copied())
        .with_uart_baud(initial_baud)
        .with_diagnostics(TracingSink);

    let result = run(&mut session, args.command);
    let outcome = Outcome {
        command: format!("{:?}", args.command),
        ok: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
        session: session.report(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if let Err(e) = result {
        error!("{} failed: {}", outcome.command, e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(session: &mut AtCommander<SyncSerialPort>, command: Command) -> AtResult<()> {
    match command {
        Command::Probe => {
            session.enter_command_mode()?;
            session.exit_command_mode()
        }
        Command::SetBaud { baud } => session.set_baud_rate(baud),
        Command::Store => {
            session.enter_command_mode()?;
            session.store_settings()
        }
        Command::Reboot => session.reboot(),
        Command::Ports => Ok(()),
    }
}

fn print_outcome(outcome: &Outcome) {
    let report = &outcome.session;
    match &outcome.error {
        None => println!("{}: ok", outcome.command),
        Some(e) => println!("{}: failed - {}", outcome.command, e),
    }
    println!("  profile:     {}", report.profile);
    println!("  state:       {:?}", report.state);
    if let Some(baud) = report.uart_baud {
        println!("  uart baud:   {}", baud);
    }
    if let Some(baud) = report.device_baud {
        println!("  device baud: {}", baud);
    }
}

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_is_parsed_by_name() {
        let args = Args::try_parse_from(["atcommander", "--family", "RN-42", "probe"]).unwrap();
        assert_eq!(args.family, Some(DeviceFamily::Rn42));

        let args = Args::try_parse_from(["atcommander", "-f", "xbee", "store"]).unwrap();
        assert_eq!(args.family, Some(DeviceFamily::Xbee));
    }

    #[test]
    fn test_unknown_family_is_rejected() {
        assert!(Args::try_parse_from(["atcommander", "--family", "hc05", "probe"]).is_err());
    }
}
