//! Rovio CLI - Main entry point
//!
//! Drives a single Rovio from the command line: movement, path recording,
//! homing, status reports and camera snapshots.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rovio_client::{CommandArgs, DeviceClient};
use rovio_core::{lookup, CommandSpec, Endpoint, ParamKind, ResponseCode, Value};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rovio")]
#[command(about = "Control a Rovio mobile webcam over its HTTP interface")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "rovio.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the navigation report as JSON
    Report,
    /// Print the navigation state
    Status,
    /// Print the decoded MCU packet as JSON
    Mcu,
    /// Report whether the IR sensor sees an obstacle
    Obstacle,
    /// Move one step in a direction
    Drive {
        direction: Direction,
        /// 1 (fastest) to 10 (slowest); the configured default otherwise
        #[arg(short, long)]
        speed: Option<u8>,
    },
    /// Move the camera head
    Head { position: Head },
    /// Stop all movement
    Stop,
    /// Drive back to the home location
    Home {
        /// Also dock on the charger
        #[arg(long)]
        dock: bool,
    },
    /// Save a camera snapshot
    Image {
        #[arg(long)]
        id: Option<u32>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Recorded path management
    Paths {
        #[command(subcommand)]
        action: PathAction,
    },
    /// Print the navigation library version
    Version,
    /// Send any catalog command by name, e.g. `raw ChangeFramerate 25`
    Raw {
        name: String,
        values: Vec<String>,
        #[arg(short, long)]
        speed: Option<u8>,
    },
}

#[derive(Subcommand, Debug)]
enum PathAction {
    List,
    /// Start recording a new path
    Record,
    /// Stop recording and discard
    Abort,
    /// Stop recording and save under NAME
    Save { name: String },
    Play {
        name: String,
        #[arg(long)]
        backward: bool,
    },
    Stop,
    Pause,
    Delete { name: String },
    Rename { old: String, new: String },
    /// Delete every stored path
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    RotateLeft,
    RotateRight,
    ForwardLeft,
    ForwardRight,
    BackLeft,
    BackRight,
    /// Rotate 20 degrees left
    TurnLeft,
    /// Rotate 20 degrees right
    TurnRight,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Head {
    Up,
    Down,
    Middle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Rovio CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;
    let device = &config.device;
    info!(
        device = %device.name,
        host = %device.connection.host,
        port = device.connection.port,
        "Configuration loaded"
    );

    let client = DeviceClient::new(device.name.clone(), device.client_config()?)?;
    run(&client, args.command).await
}

async fn run(client: &DeviceClient, command: Cmd) -> Result<()> {
    match command {
        Cmd::Report => {
            let report = client.get_report().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Status => {
            let state = client.get_status().await?;
            println!("{:?}", state);
        }
        Cmd::Mcu => {
            let telemetry = client.get_mcu_report().await?.decode()?;
            println!("{}", serde_json::to_string_pretty(&telemetry)?);
        }
        Cmd::Obstacle => {
            let obstacle = client.obstacle().await?;
            println!("{}", if obstacle { "obstacle" } else { "clear" });
        }
        Cmd::Drive { direction, speed } => {
            let code = match direction {
                Direction::Forward => client.forward(speed).await?,
                Direction::Backward => client.backward(speed).await?,
                Direction::Left => client.left(speed).await?,
                Direction::Right => client.right(speed).await?,
                Direction::RotateLeft => client.rotate_left(speed).await?,
                Direction::RotateRight => client.rotate_right(speed).await?,
                Direction::ForwardLeft => client.diag_forward_left(speed).await?,
                Direction::ForwardRight => client.diag_forward_right(speed).await?,
                Direction::BackLeft => client.diag_back_left(speed).await?,
                Direction::BackRight => client.diag_back_right(speed).await?,
                Direction::TurnLeft => client.rotate_left_20().await?,
                Direction::TurnRight => client.rotate_right_20().await?,
            };
            print_code(code);
        }
        Cmd::Head { position } => {
            let code = match position {
                Head::Up => client.head_up().await?,
                Head::Down => client.head_down().await?,
                Head::Middle => client.head_middle().await?,
            };
            print_code(code);
        }
        Cmd::Stop => print_code(client.stop().await?),
        Cmd::Home { dock } => {
            let code = if dock {
                client.go_home_and_dock().await?
            } else {
                client.go_home().await?
            };
            print_code(code);
        }
        Cmd::Image { id, output } => {
            let jpeg = client.get_image(id).await?;
            std::fs::write(&output, &jpeg)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(path = %output.display(), bytes = jpeg.len(), "Saved image");
        }
        Cmd::Paths { action } => run_paths(client, action).await?,
        Cmd::Version => {
            let version = client.get_lib_ns_version().await?;
            println!("{}", serde_json::to_string_pretty(&version)?);
        }
        Cmd::Raw { name, values, speed } => {
            let spec = lookup(&name)?;
            let args = CommandArgs {
                speed,
                values: raw_values(spec, &values),
            };

            if spec.returns_key_values() {
                let map = client.query(spec.command, &args).await?;
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                let body = client.send(spec.command, &args).await?;
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&body)?;
                if !matches!(spec.endpoint, Endpoint::Image) {
                    writeln!(stdout)?;
                }
            }
        }
    }

    Ok(())
}

async fn run_paths(client: &DeviceClient, action: PathAction) -> Result<()> {
    let code = match action {
        PathAction::List => {
            println!("{}", client.get_path_list().await?);
            return Ok(());
        }
        PathAction::Record => client.start_recording().await?,
        PathAction::Abort => client.abort_recording().await?,
        PathAction::Save { name } => client.stop_recording(&name).await?,
        PathAction::Play { name, backward } => {
            if backward {
                client.play_path_backward(&name).await?
            } else {
                client.play_path_forward(&name).await?
            }
        }
        PathAction::Stop => client.stop_playing().await?,
        PathAction::Pause => client.pause_playing().await?,
        PathAction::Delete { name } => client.delete_path(&name).await?,
        PathAction::Rename { old, new } => client.rename_path(&old, &new).await?,
        PathAction::Clear => client.clear_all_paths().await?,
    };
    print_code(code);
    Ok(())
}

/// Command-line strings as catalog values: text parameters stay verbatim,
/// everything else is read as an integer when it looks like one
fn raw_values(spec: &CommandSpec, values: &[String]) -> Vec<Value> {
    values
        .iter()
        .enumerate()
        .map(|(i, raw)| match spec.params.get(i).map(|p| p.kind) {
            Some(ParamKind::PathName | ParamKind::Text) => Value::Text(raw.clone()),
            _ => Value::parse(raw),
        })
        .collect()
}

fn print_code(code: ResponseCode) {
    println!("{}", code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drive() {
        let args = Args::try_parse_from(["rovio", "drive", "rotate-left", "--speed", "3"]).unwrap();
        match args.command {
            Cmd::Drive { direction, speed } => {
                assert!(matches!(direction, Direction::RotateLeft));
                assert_eq!(speed, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.config, PathBuf::from("rovio.toml"));
    }

    #[test]
    fn test_parse_paths() {
        let args = Args::try_parse_from(["rovio", "paths", "rename", "kitchen", "hall"]).unwrap();
        match args.command {
            Cmd::Paths {
                action: PathAction::Rename { old, new },
            } => {
                assert_eq!(old, "kitchen");
                assert_eq!(new, "hall");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let args = Args::try_parse_from(["rovio", "paths", "play", "hall", "--backward"]).unwrap();
        assert!(matches!(
            args.command,
            Cmd::Paths { action: PathAction::Play { backward: true, .. } }
        ));
    }

    #[test]
    fn test_image_requires_output() {
        assert!(Args::try_parse_from(["rovio", "image"]).is_err());
        let argv = ["rovio", "-c", "/etc/rovio.toml", "image", "-o", "snap.jpg"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/rovio.toml"));
    }

    #[test]
    fn test_raw_values_keep_path_names_verbatim() {
        let spec = lookup("DeletePath").unwrap();
        let values = raw_values(spec, &["007".to_string()]);
        assert_eq!(values, vec![Value::Text("007".to_string())]);
        assert_eq!(spec.render_params(&values).unwrap()[0].1, "007");

        let spec = lookup("SaveParameter").unwrap();
        let values = raw_values(spec, &["3".to_string(), "-7".to_string()]);
        assert_eq!(values, vec![Value::Integer(3), Value::Integer(-7)]);

        let spec = lookup("ChangeBrightness").unwrap();
        let values = raw_values(spec, &["4".to_string(), "/index.htm".to_string()]);
        assert_eq!(values[0], Value::Integer(4));
        assert_eq!(values[1], Value::Text("/index.htm".to_string()));
    }

    #[test]
    fn test_raw_values() {
        let argv = ["rovio", "raw", "SaveParameter", "--", "3", "-7"];
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Cmd::Raw { name, values, .. } => {
                assert_eq!(name, "SaveParameter");
                assert_eq!(values, vec!["3", "-7"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
