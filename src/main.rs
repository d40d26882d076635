// A100: an assembly-like teaching language with a stepping interpreter

use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;

use log::{debug, info, LevelFilter};
use simple_logger::SimpleLogger;

use a100::config::MachineConfig;
use a100::interpreter::{Engine, Mode, Worker};
use a100::observer::Observer;

/// Console host: program output goes to stdout, errors to stderr, and
/// execution tracing to the logger.
struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn on_register_changed(&self, name: &str, value: i32) {
        debug!("{} = {}", name, value);
    }

    fn on_memory_changed(&self, address: usize, value: i32) {
        debug!("M[{}] = {}", address, value);
    }

    fn on_string_buffer_changed(&self, index: usize, text: &str) {
        debug!("S[{}] = \"{}\"", index, text);
    }

    fn on_line_focus(&self, line: usize) {
        debug!("executing line {}", line);
    }

    fn on_memory_focus(&self, address: usize) {
        debug!("memory head at {}", address);
    }

    fn on_output(&self, text: &str) {
        println!("{}", text);
    }

    fn on_error(&self, line: usize, message: &str) {
        eprintln!("Line #{}: {}", line, message);
    }

    fn on_halted(&self) {
        info!("execution halted");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("a100");

    let trace = args.iter().any(|a| a == "--trace");
    let source_file = args.iter().skip(1).find(|a| !a.starts_with("--"));

    let Some(source_file) = source_file else {
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} [--trace] <file.A1>", program_name);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} demos/countdown.A1       # Run a loop with branches", program_name);
        eprintln!("  {} --trace demos/greet.A1   # Log every state change", program_name);
        process::exit(1);
    };

    SimpleLogger::new()
        .with_level(if trace {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .init()?;

    if !Path::new(source_file).exists() {
        eprintln!("Error: File '{}' not found", source_file);
        process::exit(1);
    }

    let source = fs::read_to_string(source_file)?;

    let mut engine = Engine::new(MachineConfig::default(), Arc::new(ConsoleObserver))?;

    // A syntax error is already reported through the observer; the run
    // never starts.
    if engine.start(source.as_str()) != Mode::Running {
        process::exit(1);
    }

    // Continuous run on the worker thread, exactly as an interactive
    // host would do it; this host has nothing to cancel, so it just
    // joins.
    let worker = Worker::spawn(engine);
    let engine = worker.join();

    if engine.last_error().is_some() {
        process::exit(1);
    }

    Ok(())
}
