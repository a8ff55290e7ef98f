/// Story Linter: validates a story graph and checks ending coverage.
///
/// Usage: story_linter <story.ron> [--simulate <n>] [--seed <n>] [--max-steps <n>]

use std::collections::BTreeMap;
use std::path::Path;
use std::process;

use story_engine::core::autoplay::Autoplayer;
use story_engine::core::engine::StoryEngine;
use story_engine::core::graph::{GraphError, StoryGraph, ValidationReport};
use story_engine::schema::node::NodeId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        process::exit(0);
    }

    init_logging();

    let story_path = &args[1];
    let mut simulate = 0usize;
    let mut seed: u64 = 42;
    let mut max_steps = 500usize;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--simulate" if i + 1 < args.len() => {
                i += 1;
                simulate = args[i].parse().unwrap_or(0);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--max-steps" if i + 1 < args.len() => {
                i += 1;
                max_steps = args[i].parse().unwrap_or(500);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let graph = match StoryGraph::load_from_ron(Path::new(story_path)) {
        Ok(graph) => graph,
        Err(GraphError::Invalid(report)) => {
            println!("\n=== Story Lint Report ===\n");
            print_report(&report);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: Failed to load story file: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} nodes from {} (start: '{}')",
        graph.len(),
        story_path,
        graph.start()
    );

    let report = graph.validate();
    println!("\n=== Story Lint Report ===\n");
    print_report(&report);

    let endings = graph.endings();
    let reachable = graph.reachable();
    println!("\n=== Endings ({}) ===\n", endings.len());
    for id in &endings {
        let marker = if reachable.contains(*id) { " " } else { "!" };
        let title = graph
            .get(id)
            .ok()
            .and_then(|node| node.text.lines().next())
            .unwrap_or_default();
        println!("{} {:<28} {}", marker, id.as_str(), title);
    }

    if simulate > 0 {
        let endings: Vec<NodeId> = endings.into_iter().cloned().collect();
        simulate_coverage(graph, &endings, simulate, seed, max_steps);
    }

    if report.is_ok() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn print_usage() {
    println!("Usage: story_linter <story.ron> [--simulate <n>] [--seed <n>] [--max-steps <n>]");
    println!();
    println!("  --simulate <n>   play n random playthroughs and report ending coverage");
    println!("  --seed <n>       base RNG seed for simulation (default 42)");
    println!("  --max-steps <n>  abandon a playthrough after n choices (default 500)");
}

/// Used when `RUST_LOG` is unset, so story graph warnings still show.
const DEFAULT_LOG_FILTER: &str = "warn";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_report(report: &ValidationReport) {
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }
    for error in &report.errors {
        println!("ERROR: {}", error);
    }
    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );
}

fn simulate_coverage(
    graph: StoryGraph,
    endings: &[NodeId],
    runs: usize,
    seed: u64,
    max_steps: usize,
) {
    let mut engine = match StoryEngine::builder().graph(graph).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: Failed to start engine: {}", e);
            process::exit(1);
        }
    };

    let mut hits: BTreeMap<&str, usize> = endings.iter().map(|id| (id.as_str(), 0)).collect();
    let mut abandoned = 0usize;
    let mut total_steps = 0usize;

    for run in 0..runs {
        let mut player = Autoplayer::new(seed.wrapping_add(run as u64));
        let playthrough = match player.play(&mut engine, max_steps) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("ERROR: Playthrough {} failed: {}", run, e);
                process::exit(1);
            }
        };
        total_steps += playthrough.steps;
        match playthrough.ending {
            Some(ref id) => {
                if let Some(count) = hits.get_mut(id.as_str()) {
                    *count += 1;
                }
            }
            None => abandoned += 1,
        }
    }

    println!("\n=== Simulation ({} runs, seed {}) ===\n", runs, seed);
    for (id, count) in &hits {
        let pct = *count as f64 / runs as f64 * 100.0;
        println!("  {:<28} {:>6} ({:.1}%)", id, count, pct);
    }

    let missed: Vec<&str> = hits
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    println!(
        "\nCovered {}/{} endings, {} runs abandoned, {:.1} choices per run",
        hits.len() - missed.len(),
        hits.len(),
        abandoned,
        total_steps as f64 / runs as f64
    );
    if !missed.is_empty() {
        println!("Never reached: {}", missed.join(", "));
    }
}
