mod communication;
mod registry;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use communication::CommunicationLayer;
use kinematics::JointState;
use log::{info, warn};
use registry::{ControlRegistry, PartsConfig};
use rig::{Conversion, ImportConfig, RigPose, convert_file};
use tokio::time::sleep;

/// Robot description to rig converter and joint-target streamer
#[derive(Parser)]
#[command(name = "interface")]
#[command(about = "Convert robot descriptions into rigs and stream rig poses", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a robot description and write the rig as JSON
    Convert {
        /// Robot description file
        #[arg(long)]
        urdf: PathBuf,

        /// Import configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Stream a rig pose to the control boards of the selected parts
    Stream {
        /// Robot description file
        #[arg(long)]
        urdf: PathBuf,

        /// Parts document (JSON)
        #[arg(long)]
        parts: PathBuf,

        /// Part to connect, repeatable
        #[arg(long = "part", required = true)]
        part: Vec<String>,

        /// Import configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pose to stream (JSON map of joint name to radians or metres)
        #[arg(long)]
        pose: Option<PathBuf>,

        /// Number of times the pose is sent
        #[arg(long, default_value_t = 1)]
        cycles: u32,

        /// Delay between two sends
        #[arg(long, default_value_t = 100)]
        period_ms: u64,
    },
}

fn load_conversion(urdf: &Path, config: Option<&Path>) -> Result<Conversion, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => ImportConfig::from_file(path)?,
        None => ImportConfig::default(),
    };
    let conversion = convert_file(urdf, &config)?;
    if !conversion.warnings.is_empty() {
        warn!("{} warnings recorded while converting {}", conversion.warnings.len(), urdf.display());
    }
    Ok(conversion)
}

fn convert(urdf: &Path, config: Option<&Path>, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let conversion = load_conversion(urdf, config)?;
    let json = serde_json::to_string_pretty(&conversion)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("rig {} written to {}", conversion.rig.name(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn stream(
    urdf: &Path,
    parts: &Path,
    selected: &[String],
    config: Option<&Path>,
    pose: Option<&Path>,
    cycles: u32,
    period: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let conversion = load_conversion(urdf, config)?;
    let rig = &conversion.rig;
    let parts = PartsConfig::from_file(parts)?;

    let pose = match pose {
        Some(path) => {
            let raw: RigPose = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            raw.validated(rig)?
        }
        None => RigPose::rest(rig),
    };

    let mut registry = ControlRegistry::new();
    for part in selected {
        registry.connect(&parts, part, rig)?;
    }

    let comms = CommunicationLayer::new(&parts.robot).await?;
    let feedback: Arc<Mutex<Vec<(String, JointState)>>> = Arc::new(Mutex::new(Vec::new()));
    for board in registry.boards() {
        let feedback = Arc::clone(&feedback);
        comms
            .subscribe_joint_state(board.part(), move |joints| {
                if let Ok(mut latest) = feedback.lock() {
                    *latest = joints;
                }
            })
            .await?;
    }

    for cycle in 0..cycles {
        for board in registry.boards() {
            let targets = board.targets(&pose);
            comms.publish_joint_targets(board.part(), &targets).await?;
        }
        info!("cycle {} of {cycles} sent", cycle + 1);
        sleep(period).await;
    }

    if let Ok(latest) = feedback.lock() {
        for (name, state) in latest.iter() {
            info!("encoder {name}: {:.3}", state.angle);
        }
    }

    for part in registry.close_all() {
        info!("disconnected {part}");
    }
    comms.close().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert { urdf, config, output } => {
            convert(&urdf, config.as_deref(), output.as_deref())
        }
        Commands::Stream {
            urdf,
            parts,
            part,
            config,
            pose,
            cycles,
            period_ms,
        } => {
            stream(
                &urdf,
                &parts,
                &part,
                config.as_deref(),
                pose.as_deref(),
                cycles,
                Duration::from_millis(period_ms),
            )
            .await
        }
    }
}
