use std::path::{Path, PathBuf};

use arkhe_core::config::ArkheConfig;
use arkhe_core::panel::{self, readout_text, Operation, Slot, VectorAlgebraPanel};
use arkhe_core::scheduler::{FrameStatus, ManualFrameSource};
use arkhe_core::space::{Role, SemanticVector, SemanticVectorSpace, SpaceSnapshot};
use arkhe_core::surface::RecordingSurface;
use arkhe_projectors::AlgebraReadout;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "arkhe", about = "Semantic vector algebra on a torus")]
struct Cli {
    /// JSON snapshot of the vector space (built-in demo when omitted)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arkhe norm of one vector
    Norm { id: String },
    /// Inner product of two vectors
    Inner { a: String, b: String },
    /// Gated addition of two vectors
    Add { a: String, b: String },
    /// Screen placement of every vector at a given time
    Layout {
        #[arg(long, default_value_t = 0.0)]
        time: f64,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Run the render loop headless for a number of frames
    Render {
        #[arg(long, default_value_t = 60)]
        frames: u64,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Print the effective configuration
    Config,
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = "arkhe_core=info".parse() {
        filter = filter.add_directive(d);
    }
    if let Ok(d) = "arkhe=info".parse() {
        filter = filter.add_directive(d);
    }

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<ArkheConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => ArkheConfig::from_file_with_env(p)?,
        None => ArkheConfig::load_layered(None, None)?,
    };
    Ok(config)
}

fn load_snapshot(path: Option<&Path>) -> Result<SpaceSnapshot, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(demo_snapshot()),
    }
}

fn demo_snapshot() -> SpaceSnapshot {
    let v = |id: &str, role: Role, coords: [f64; 3], omega: f64, phase: f64, c: f64, satoshi: f64| {
        let mut name = id.to_string();
        name[..1].make_ascii_uppercase();
        SemanticVector {
            id: id.to_string(),
            name,
            role,
            coords,
            omega,
            phase,
            c,
            f: 1.0 - c,
            satoshi,
        }
    };
    SpaceSnapshot {
        vectors: vec![
            v("genesis", Role::Anchor, [1.0, 0.0, 0.0], 0.00, 0.0, 1.00, 100.0),
            v("lattice", Role::Node, [0.6, 0.8, 0.0], 0.05, 0.9, 0.86, 42.0),
            v("relay", Role::Bridge, [0.0, 1.0, 0.3], 0.11, 1.8, 0.74, 21.0),
            v("mirror", Role::Observer, [0.2, 0.4, 0.9], 0.19, 3.1, 0.61, 8.0),
            v("horizon", Role::Node, [-0.5, 0.3, 0.7], 0.27, 4.4, 0.52, 3.0),
            v("omega", Role::Anchor, [-1.0, 0.0, 0.2], 0.33, 5.6, 0.45, 1.0),
        ],
        ..Default::default()
    }
}

fn evaluate(
    panel: &mut VectorAlgebraPanel,
    operation: Operation,
    left: &str,
    right: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    panel.select(Slot::Left, left)?;
    if let Some(id) = right {
        panel.select(Slot::Right, id)?;
    }
    panel.set_operation(operation);
    let result = panel.evaluate();

    let mut readout = AlgebraReadout::default();
    readout.apply_all(&panel.drain_events());

    if json {
        println!("{}", serde_json::to_string_pretty(&readout)?);
    } else {
        println!("{}", readout_text(&result));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    if let Commands::Config = cli.cmd {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let snapshot = load_snapshot(cli.snapshot.as_deref())?;
    let space = SemanticVectorSpace::from_snapshot(snapshot, &config.space)?;
    info!("loaded {} vectors", space.len());
    let mut view = VectorAlgebraPanel::new(space, &config);

    match cli.cmd {
        Commands::Norm { id } => evaluate(&mut view, Operation::Norm, &id, None, cli.json)?,
        Commands::Inner { a, b } => {
            evaluate(&mut view, Operation::InnerProduct, &a, Some(&b), cli.json)?
        }
        Commands::Add { a, b } => evaluate(&mut view, Operation::Add, &a, Some(&b), cli.json)?,
        Commands::Layout {
            time,
            width,
            height,
        } => {
            let layout = view.frame_layout(time, width, height);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                for p in &layout {
                    println!(
                        "{:<12} {:>9.2} {:>9.2}  scale={:.3} r={:.2}",
                        p.id, p.screen_x, p.screen_y, p.projected_scale, p.radius
                    );
                }
            }
        }
        Commands::Render {
            frames,
            width,
            height,
        } => {
            let mut scheduler = panel::mount(
                view,
                RecordingSurface::new(width, height),
                ManualFrameSource::default(),
                &config.scheduler,
            );
            let mut readout = AlgebraReadout::default();
            for _ in 0..frames {
                match scheduler.pump()? {
                    FrameStatus::Drawn(info) if info.resized => {
                        info!("frame {}: backing buffer resized", info.frame)
                    }
                    FrameStatus::Drawn(_) => {}
                    other => {
                        warn!("render loop went quiet: {:?}", other);
                        break;
                    }
                }
            }
            if let Some(p) = scheduler.renderer_mut() {
                readout.apply_all(&p.drain_events());
            }
            scheduler.stop();

            let commands = scheduler.surface().commands();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(commands)?);
            } else {
                println!(
                    "{} vectors, {} frames, t={:.3}, {} draw commands in last frame",
                    readout.vectors,
                    scheduler.frame_count(),
                    scheduler.time(),
                    commands.len()
                );
            }
        }
        Commands::Config => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_snapshot_is_admissible() {
        let cfg = ArkheConfig::default();
        let space = SemanticVectorSpace::from_snapshot(demo_snapshot(), &cfg.space).unwrap();
        assert_eq!(space.len(), 6);
        // neighbours in omega can be added, the ends of the band cannot
        assert!(space.add_by_id("genesis", "lattice").is_ok());
        assert!(space.add_by_id("genesis", "omega").is_err());
    }

    #[test]
    fn snapshot_loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("space.json");
        std::fs::write(
            &path,
            r#"{"vectors":[{"id":"a","name":"A","coords":[1,2,2],"omega":0.1,"c":1.0,"f":0.0}]}"#,
        )
        .unwrap();
        let snapshot = load_snapshot(Some(path.as_path())).unwrap();
        assert_eq!(snapshot.vectors.len(), 1);
        assert_eq!(snapshot.vectors[0].role, Role::Node);
    }

    #[test]
    fn missing_config_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("nope.toml").as_path())).is_err());
        assert!(load_config(None).is_ok());
    }
}
