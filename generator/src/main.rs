use clap::Parser;
use std::path::PathBuf;

use scg::config::GenConfig;
use scg::generate::{Generator, ShaderKind};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// Full harness text (shader + buffers + pipeline + dispatch)
    Amber,
    /// Bare GLSL source
    Glsl,
    /// Provenance JSON
    BuildInfo,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StageArg {
    Compute,
    Vertex,
    Fragment,
}

impl From<StageArg> for ShaderKind {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Compute => ShaderKind::Compute,
            StageArg::Vertex => ShaderKind::Vertex,
            StageArg::Fragment => ShaderKind::Fragment,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "scg",
    version,
    about = "scg - synthesizes deterministic GLSL compute shaders for differential testing"
)]
struct Cli {
    /// Random seed; a fixed seed reproduces programs byte-for-byte
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of programs to generate
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Configuration file (JSON, partial fields allowed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file, or directory when --count > 1 (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Amber)]
    emit: EmitStage,

    /// Shader stage to generate
    #[arg(long, value_enum, default_value_t = StageArg::Compute)]
    stage: StageArg,

    /// Print generation details
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match GenConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("scg: error: {}", e);
                std::process::exit(1);
            }
        },
        None => GenConfig::default(),
    };

    if cli.verbose {
        eprintln!("scg: seed  = {}", cli.seed);
        eprintln!("scg: count = {}", cli.count);
        eprintln!("scg: emit  = {:?}", cli.emit);
    }

    let mut generator = Generator::new(cli.seed, config);
    for index in 0..cli.count {
        let program = match generator.generate(cli.stage.into()) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("scg: error: {}", e);
                std::process::exit(1);
            }
        };

        if cli.verbose {
            eprintln!(
                "scg: program {}: {} buffers, shader hash {}",
                index,
                program.state.buffers.len(),
                program.provenance.shader_hash_hex()
            );
        }

        let (text, extension) = match cli.emit {
            EmitStage::Amber => (program.harness.clone(), "amber"),
            EmitStage::Glsl => (program.glsl.clone(), "comp"),
            EmitStage::BuildInfo => (program.provenance.to_json(), "json"),
        };

        match &cli.output {
            None => print!("{}", text),
            Some(path) => {
                let target = if cli.count > 1 {
                    path.join(format!("prog{}.{}", index, extension))
                } else {
                    path.clone()
                };
                if let Err(e) = std::fs::write(&target, &text) {
                    eprintln!("scg: error: {}: {}", target.display(), e);
                    std::process::exit(2);
                }
            }
        }
    }
}
