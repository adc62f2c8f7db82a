use clap::Parser;
use ns3lab_rs::generator::{ScriptGenerator, ScriptOptions};
use ns3lab_rs::model::{FailureScenario, NetworkModel, SimulationConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "script-gen",
    about = "Generate an ns-3 Python script from a topology and flow config"
)]
struct Args {
    /// Path to topology.json
    #[arg(long)]
    topology: PathBuf,

    /// Path to flows.json; defaults apply when omitted
    #[arg(long)]
    flows: Option<PathBuf>,

    /// Path to failures.json
    #[arg(long)]
    failures: Option<PathBuf>,

    /// Output script path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory the running script writes traces into
    #[arg(long, default_value = "results")]
    out_dir: String,

    /// Override simulation duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Enable pcap capture in the generated script
    #[arg(long)]
    pcap: bool,

    /// Disable the ASCII trace
    #[arg(long)]
    no_ascii: bool,

    /// Disable FlowMonitor and the results section
    #[arg(long)]
    no_flow_monitor: bool,

    /// Pin the header timestamp (for reproducible output)
    #[arg(long)]
    generated_at: Option<String>,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let network = NetworkModel::load(&args.topology)?;
    let mut config = match &args.flows {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(duration) = args.duration {
        config.duration_s = duration;
    }
    if args.pcap {
        config.enable_pcap = true;
    }
    if args.no_ascii {
        config.enable_ascii_trace = false;
    }
    if args.no_flow_monitor {
        config.enable_flow_monitor = false;
    }
    let failures = match &args.failures {
        Some(path) => Some(FailureScenario::load(path)?),
        None => None,
    };

    let mut generator = ScriptGenerator::new(&network, &config).with_options(ScriptOptions {
        output_dir: args.out_dir.clone(),
        generated_at: args.generated_at.clone(),
    });
    if let Some(failures) = &failures {
        generator = generator.with_failures(failures);
    }

    let script = match &args.output {
        Some(path) => generator.write_to(path)?,
        None => {
            let script = generator.generate()?;
            print!("{}", script.code);
            script
        }
    };
    for warning in &script.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
