// Tests for the engine's execution disciplines: single-step versus
// continuous run, reset behavior, and cooperative cancellation.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use a100::config::MachineConfig;
use a100::interpreter::{Engine, Mode, Worker};
use a100::observer::Observer;

/// Minimal observer capturing output lines and halt notifications.
#[derive(Default)]
struct OutputLog {
    lines: Mutex<Vec<String>>,
    halted: Mutex<usize>,
}

impl Observer for OutputLog {
    fn on_output(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }

    fn on_halted(&self) {
        *self.halted.lock().unwrap() += 1;
    }
}

fn new_engine() -> (Engine, Arc<OutputLog>) {
    let log = Arc::new(OutputLog::default());
    let observer: Arc<dyn Observer> = log.clone();
    let engine = Engine::new(MachineConfig::default(), observer).expect("engine creation failed");
    (engine, log)
}

const COUNTDOWN: &str = "\
R0 = 3
LOOP:
PRINT R0
R0 = R0 - 1
JUMPZ R0 DONE
JUMP LOOP
DONE:
PRINT \"Done\"
HALT
";

#[test]
fn stepping_and_running_reach_the_same_final_state() {
    let (mut stepped, stepped_log) = new_engine();
    assert_eq!(stepped.start(COUNTDOWN), Mode::Running);
    let mut steps = 0;
    while stepped.step() == Mode::Running {
        steps += 1;
        assert!(steps < 1000, "program failed to halt");
    }

    let (mut ran, ran_log) = new_engine();
    assert_eq!(ran.start(COUNTDOWN), Mode::Running);
    assert_eq!(ran.run(), Mode::Halted);

    for name in stepped.state().register_names() {
        assert_eq!(
            stepped.state().register(name).unwrap(),
            ran.state().register(name).unwrap(),
            "register {} diverged",
            name
        );
    }
    assert_eq!(
        *stepped_log.lines.lock().unwrap(),
        *ran_log.lines.lock().unwrap()
    );
    assert_eq!(*stepped_log.halted.lock().unwrap(), 1);
    assert_eq!(*ran_log.halted.lock().unwrap(), 1);
}

#[test]
fn starting_again_resets_the_registers() {
    // If reset were skipped, the second run would leave R0 at 2.
    let source = "R0 = R0 + 1\n";
    let (mut engine, _log) = new_engine();

    engine.start(source);
    engine.run();
    assert_eq!(engine.state().register("R0").unwrap(), 1);

    engine.edit();
    assert_eq!(engine.mode(), Mode::Idle);
    engine.start(source);
    engine.run();
    assert_eq!(engine.state().register("R0").unwrap(), 1);
}

#[test]
fn step_is_a_no_op_outside_running_mode() {
    let (mut engine, log) = new_engine();
    assert_eq!(engine.step(), Mode::Idle);
    assert_eq!(*log.halted.lock().unwrap(), 0);

    engine.start("HALT\n");
    engine.run();
    assert_eq!(engine.step(), Mode::Halted);
    assert_eq!(*log.halted.lock().unwrap(), 1);
}

#[test]
fn cancellation_stops_an_endless_run() {
    let (mut engine, log) = new_engine();
    assert_eq!(engine.start("LOOP:\nR0 = 0\nJUMP LOOP\n"), Mode::Running);

    let worker = Worker::spawn(engine);
    thread::sleep(Duration::from_millis(20));
    assert!(!worker.is_finished(), "endless program finished on its own");

    worker.cancel();
    let engine = worker.join();

    assert_eq!(engine.mode(), Mode::Halted);
    assert!(engine.last_error().is_none());
    assert_eq!(*log.halted.lock().unwrap(), 1);
}

#[test]
fn cancellation_requested_before_the_run_executes_nothing() {
    let (mut engine, log) = new_engine();
    assert_eq!(engine.start("PRINT \"TICK\"\nHALT\n"), Mode::Running);
    engine.request_cancel();

    let engine = Worker::spawn(engine).join();

    assert_eq!(engine.mode(), Mode::Halted);
    assert!(log.lines.lock().unwrap().is_empty());
    assert_eq!(engine.state().register("PC").unwrap(), 0);
}

#[test]
fn cancel_request_outside_running_mode_does_not_poison_the_next_run() {
    let (mut engine, log) = new_engine();
    // Not running yet; must have no effect.
    engine.request_cancel();

    engine.start("PRINT \"OK\"\nHALT\n");
    engine.run();

    assert_eq!(*log.lines.lock().unwrap(), vec!["OK"]);
    assert_eq!(*log.halted.lock().unwrap(), 1);
}

#[test]
fn worker_returns_the_engine_after_natural_termination() {
    let (mut engine, log) = new_engine();
    engine.start(COUNTDOWN);

    let worker = Worker::spawn(engine);
    let engine = worker.join();

    assert_eq!(engine.mode(), Mode::Halted);
    assert_eq!(
        *log.lines.lock().unwrap(),
        vec!["3", "2", "1", "Done"]
    );
}
