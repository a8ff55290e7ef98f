/// Play: interactive terminal frontend for story files.
///
/// Usage: play [--story <path>] [--config <path>] [--instant]
///
/// Without --story the bundled story is played.
///
/// Commands:
///   <n>      take choice n
///   status   show sanity, weapon and act
///   restart  start over
///   quit     exit

use std::io::{self, BufRead, Write};
use std::process;
use std::thread;

use story_engine::core::engine::{ChoiceOutcome, EngineError, RejectReason, StoryEngine};
use story_engine::core::hooks::{NodeView, PresentationHooks, StatusView};
use story_engine::core::reveal::RevealEvent;
use story_engine::story;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prints nodes as they are entered and streams revealed text to stdout.
#[derive(Default)]
struct TerminalHooks {
    printed: usize,
}

impl PresentationHooks for TerminalHooks {
    fn on_node(&mut self, view: &NodeView) {
        self.printed = 0;
        println!();
        if let Some(ref chapter) = view.chapter {
            println!("=== {} ===", chapter);
        }
        println!("[{}]", view.tags().join(" "));
        println!();
    }

    fn on_reveal(&mut self, event: &RevealEvent) {
        if let RevealEvent::Progress { revealed, .. } = event {
            if revealed.len() > self.printed {
                print!("{}", &revealed[self.printed..]);
                io::stdout().flush().ok();
                self.printed = revealed.len();
            }
        }
    }

    fn on_ending(&mut self, view: &NodeView) {
        tracing::info!(ending = %view.id, "ending shown");
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut story_path = None;
    let mut config_path = None;
    let mut instant = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--story" if i + 1 < args.len() => {
                i += 1;
                story_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--instant" => instant = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    init_logging();

    let mut builder = StoryEngine::builder().hooks(Box::new(TerminalHooks::default()));
    builder = match story_path {
        Some(ref path) => builder.story_file(path),
        None => match story::sculptor() {
            Ok(graph) => builder.graph(graph),
            Err(e) => {
                eprintln!("ERROR: Bundled story failed to load: {}", e);
                process::exit(1);
            }
        },
    };
    if let Some(ref path) = config_path {
        builder = builder.config_file(path);
    }

    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        reveal(&mut engine, instant);
        println!("\n");

        if engine.is_ending() {
            println!("  [restart] play again    [quit] exit");
        } else {
            print_status(&engine.status());
            match engine.selectable_choices() {
                Ok(choices) => {
                    for (n, choice) in choices.iter().enumerate() {
                        match choice.countdown {
                            Some(secs) => println!("  {}. {} ({}s!)", n + 1, choice.text, secs),
                            None => println!("  {}. {}", n + 1, choice.text),
                        }
                    }
                }
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    process::exit(1);
                }
            }
        }

        let command = loop {
            print!("> ");
            stdout.flush().ok();

            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
                println!("Goodbye.");
                return;
            }
            let line = line.trim().to_lowercase();
            if !line.is_empty() {
                break line;
            }
        };

        let result = match command.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                return;
            }
            "restart" | "r" => engine.restart().map(|_| None),
            "status" | "s" => {
                print_status(&engine.status());
                continue;
            }
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => take_choice(&mut engine, n - 1),
                _ => {
                    println!("Unknown command: {}", other);
                    continue;
                }
            },
        };

        match result {
            Ok(Some(reason)) => println!("{}", describe(&reason)),
            Ok(None) => {}
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("Usage: play [--story <path>] [--config <path>] [--instant]");
    println!();
    println!("  --story <path>   story file to play (default: the bundled story)");
    println!("  --config <path>  engine config file");
    println!("  --instant        show node text at once instead of typing it out");
}

/// Used when `RUST_LOG` is unset, so story graph warnings still show.
const DEFAULT_LOG_FILTER: &str = "warn";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Type out the current node in real time, or all at once.
fn reveal(engine: &mut StoryEngine, instant: bool) {
    if instant {
        engine.fast_forward();
        return;
    }
    let cadence = engine.config().reveal_cadence();
    while engine.is_typing() {
        thread::sleep(cadence);
        engine.advance_reveal(cadence);
    }
}

/// Map a 0-based position in the shown list to the node's choice index.
/// At an ending nothing is shown, so the engine reports why directly.
fn take_choice(
    engine: &mut StoryEngine,
    shown: usize,
) -> Result<Option<RejectReason>, EngineError> {
    let index = if engine.is_ending() {
        shown
    } else {
        let choices = engine.selectable_choices()?;
        match choices.get(shown) {
            Some(choice) => choice.index,
            None => {
                return Ok(Some(RejectReason::OutOfRange {
                    index: shown,
                    len: choices.len(),
                }));
            }
        }
    };
    match engine.choose(index)? {
        ChoiceOutcome::Moved { .. } => Ok(None),
        ChoiceOutcome::Rejected(reason) => Ok(Some(reason)),
    }
}

fn print_status(status: &StatusView) {
    let pulse = if status.sanity_critical { " (!)" } else { "" };
    let weapon = if status.armed { "  [armed]" } else { "" };
    println!("SANITY {}%{}  ACT {}{}", status.sanity, pulse, status.act, weapon);
}

fn describe(reason: &RejectReason) -> String {
    match reason {
        RejectReason::OutOfRange { len, .. } => format!("Pick a number from 1 to {}.", len),
        RejectReason::Unavailable { .. } => "You can't do that now.".to_string(),
        RejectReason::UnknownText(text) => format!("No choice called '{}'.", text),
        RejectReason::Ended => "The story is over. Type 'restart' to play again.".to_string(),
        RejectReason::RevealInProgress => "Wait for the text to finish.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    fn mini_engine() -> StoryEngine {
        StoryEngine::builder()
            .story_file("tests/fixtures/mini_story.ron")
            .build()
            .unwrap()
    }

    #[test]
    fn number_at_an_ending_says_the_story_is_over() {
        let mut engine = mini_engine();
        for shown in [0, 1, 0] {
            engine.fast_forward();
            assert_eq!(take_choice(&mut engine, shown).unwrap(), None);
        }
        assert!(engine.is_ending());

        let reason = take_choice(&mut engine, 0).unwrap();
        assert_eq!(reason, Some(RejectReason::Ended));
        assert_eq!(
            describe(&RejectReason::Ended),
            "The story is over. Type 'restart' to play again."
        );
    }

    #[test]
    fn number_past_the_list_is_out_of_range() {
        let mut engine = mini_engine();
        engine.fast_forward();
        assert_eq!(
            take_choice(&mut engine, 5).unwrap(),
            Some(RejectReason::OutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn default_filter_shows_warnings() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
