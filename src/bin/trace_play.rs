use clap::Parser;
use ns3lab_rs::play::TracePlayer;
use ns3lab_rs::trace::{self, PacketEvent};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "trace-play",
    about = "Parse, inspect and replay ns-3 trace files"
)]
struct Args {
    /// Trace file (PKT lines, ASCII trace, or raw console output)
    #[arg(long)]
    trace: PathBuf,

    /// Print summary statistics
    #[arg(long)]
    stats: bool,

    /// Write parsed events as JSON
    #[arg(long)]
    events_json: Option<PathBuf>,

    /// Replay events through the virtual clock, printing each one
    #[arg(long)]
    replay: bool,

    /// Replay speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Virtual tick size in milliseconds
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Only show events at or after this time (seconds)
    #[arg(long)]
    from: Option<f64>,

    /// Only show events at or before this time (seconds)
    #[arg(long)]
    to: Option<f64>,
}

fn print_event(event: &PacketEvent) {
    println!(
        "{:.9} {} node={} dev={} size={}",
        event.time_s(),
        event.kind.as_str(),
        event.node,
        event.device,
        event.size
    );
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.trace)?;
    let events = trace::parse_str(&text)?;

    if let Some(path) = &args.events_json {
        std::fs::write(path, serde_json::to_string_pretty(&events)?)?;
    }

    if args.stats {
        let stats = trace::compute_stats(&events);
        println!("events:   {}", stats.total_events);
        println!("tx:       {} ({} bytes)", stats.packets_tx, stats.bytes_tx);
        println!("rx:       {} ({} bytes)", stats.packets_rx, stats.bytes_rx);
        println!("dropped:  {}", stats.packets_dropped);
        println!("duration: {:.3} s", stats.duration_s());
        let flows = trace::parse_console_stats(&text);
        for flow in &flows {
            println!(
                "flow {} ({}): {} -> {}, loss {:.1}%, {:.3} Mbps",
                flow.flow_id,
                flow.protocol,
                flow.source,
                flow.target,
                flow.packet_loss_percent(),
                flow.throughput_mbps
            );
        }
    }

    if args.replay {
        let mut player = TracePlayer::load_events(events)?;
        player.set_speed(args.speed);
        if let Some(from) = args.from {
            player.seek((from * 1e9).round() as u64);
        }
        let stop_ns = args.to.map(|to| (to * 1e9).round() as u64);
        player.play();
        let tick = Duration::from_millis(args.tick_ms);
        while player.state() == ns3lab_rs::play::PlayerState::Playing {
            player.advance(tick, print_event);
            if let Some(stop) = stop_ns {
                if player.current_time_ns() >= stop {
                    player.pause();
                }
            }
        }
    } else if !args.stats && args.events_json.is_none() {
        // plain listing, optionally windowed
        let from_ns = args.from.map(|v| (v * 1e9).round() as u64).unwrap_or(0);
        let to_ns = args.to.map(|v| (v * 1e9).round() as u64).unwrap_or(u64::MAX);
        for event in events.iter().filter(|e| e.time_ns >= from_ns && e.time_ns <= to_ns) {
            print_event(event);
        }
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
