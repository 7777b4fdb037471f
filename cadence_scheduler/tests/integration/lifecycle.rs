//! Integration test: command lifecycle.
//!
//! Validates natural completion and that a fault in a command body reaches
//! the caller of `run()`, while faults in event sinks stay contained.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use cadence_scheduler::command::basic::{instant, run};
use cadence_scheduler::scheduler::events::{CommandEvent, EventSink, SinkResult};
use cadence_scheduler::testing::{RecordingCommand, call_log};

use super::Rig;

#[test]
fn instant_command_completes_in_one_tick() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let fired = Rc::new(Cell::new(0u32));
    let f = fired.clone();
    let once = rig
        .scheduler
        .register(instant(move || f.set(f.get() + 1)).requiring(drive));

    rig.scheduler.schedule(once).unwrap();
    rig.tick();

    assert!(!rig.scheduler.is_running(once));
    assert_eq!(rig.scheduler.owner_of(drive), None);
    assert_eq!(fired.get(), 1);

    rig.tick();
    assert_eq!(fired.get(), 1);
}

#[test]
fn finish_after_one_ends_without_interruption() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig
        .scheduler
        .register(RecordingCommand::new("A", &log).finish_after(1));

    rig.scheduler.schedule(a).unwrap();
    rig.tick();

    assert!(!rig.scheduler.is_running(a));
    assert_eq!(*log.borrow(), ["A.initialize", "A.execute", "A.end(false)"]);
}

#[test]
#[should_panic(expected = "boom")]
fn command_body_fault_reaches_the_caller() {
    let mut rig = Rig::new();
    let boom = rig.scheduler.register(run(|| panic!("boom")));

    rig.scheduler.schedule(boom).unwrap();
    rig.tick();
}

struct Panicking;

impl EventSink for Panicking {
    fn on_execute(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        panic!("sink bug");
    }
}

#[test]
fn sink_faults_are_contained_but_command_faults_abort_the_tick() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig.scheduler.register(RecordingCommand::new("A", &log));
    rig.scheduler.add_event_sink(Panicking);

    rig.scheduler.schedule(a).unwrap();
    let sink_tick = catch_unwind(AssertUnwindSafe(|| rig.tick()));
    assert!(sink_tick.is_ok());
    assert_eq!(*log.borrow(), ["A.initialize", "A.execute"]);

    let mut rig = Rig::new();
    let log = call_log();
    let boom = rig.scheduler.register(run(|| panic!("boom")));
    let b = rig.scheduler.register(RecordingCommand::new("B", &log));

    rig.scheduler.schedule(boom).unwrap();
    rig.scheduler.schedule(b).unwrap();
    let command_tick = catch_unwind(AssertUnwindSafe(|| rig.tick()));

    assert!(command_tick.is_err());
    // B was started ahead of the execute phase but never executed.
    assert_eq!(*log.borrow(), ["B.initialize"]);
}
