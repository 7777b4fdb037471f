//! Integration test: lifecycle events.
//!
//! Validates event order across a preemption, interruptor attribution,
//! timestamps, and isolation of failing sinks.

use std::time::Duration;

use cadence_common::event::EventKind;
use cadence_scheduler::scheduler::events::{CommandEvent, EventSink, SinkResult};
use cadence_scheduler::testing::{RecordingCommand, RecordingSink, call_log};

use super::Rig;

#[test]
fn preemption_reports_the_interruptor() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let log = call_log();
    let a = rig
        .scheduler
        .register(RecordingCommand::new("A", &log).requiring(drive));
    let b = rig
        .scheduler
        .register(RecordingCommand::new("B", &log).requiring(drive).finish_after(1));
    let sink = RecordingSink::new();
    rig.scheduler.add_event_sink(sink.clone());

    rig.scheduler.schedule(a).unwrap();
    rig.tick();
    rig.scheduler.schedule(b).unwrap();
    rig.tick();

    let kinds: Vec<(EventKind, &str)> = sink
        .events()
        .iter()
        .map(|e| (e.kind, if e.command == a { "A" } else { "B" }))
        .collect();
    assert_eq!(
        kinds,
        [
            (EventKind::Initialize, "A"),
            (EventKind::Execute, "A"),
            (EventKind::Interrupt, "A"),
            (EventKind::Initialize, "B"),
            (EventKind::Execute, "B"),
            (EventKind::Finish, "B"),
        ]
    );
    assert_eq!(sink.of_kind(EventKind::Interrupt), [(a, Some(b))]);
    assert_eq!(sink.of_kind(EventKind::Finish), [(b, None)]);
}

#[test]
fn explicit_cancel_has_no_interruptor() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig.scheduler.register(RecordingCommand::new("A", &log));
    let sink = RecordingSink::new();
    rig.scheduler.add_event_sink(sink.clone());

    rig.scheduler.schedule(a).unwrap();
    rig.tick();
    rig.scheduler.cancel(a);
    rig.tick();

    assert_eq!(sink.of_kind(EventKind::Interrupt), [(a, None)]);
    let names: Vec<String> = sink.events().into_iter().map(|e| e.name).collect();
    assert!(names.iter().all(|n| n == "A"));
}

struct Timestamps(std::rc::Rc<std::cell::RefCell<Vec<Duration>>>);

impl EventSink for Timestamps {
    fn on_execute(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        self.0.borrow_mut().push(event.timestamp);
        Ok(())
    }
}

#[test]
fn events_carry_the_tick_timestamp() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig.scheduler.register(RecordingCommand::new("A", &log));
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    rig.scheduler.add_event_sink(Timestamps(seen.clone()));

    rig.scheduler.schedule(a).unwrap();
    rig.ticks(3);

    assert_eq!(
        *seen.borrow(),
        [
            Duration::from_millis(20),
            Duration::from_millis(40),
            Duration::from_millis(60)
        ]
    );
}

struct Failing;

impl EventSink for Failing {
    fn on_initialize(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        Err("sink offline".into())
    }
}

struct Panicking;

impl EventSink for Panicking {
    fn on_execute(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        panic!("sink bug");
    }
}

#[test]
fn failing_sinks_do_not_affect_scheduling_or_other_sinks() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig
        .scheduler
        .register(RecordingCommand::new("A", &log).finish_after(2));
    let sink = RecordingSink::new();
    rig.scheduler.add_event_sink(Failing);
    rig.scheduler.add_event_sink(Panicking);
    rig.scheduler.add_event_sink(sink.clone());

    rig.scheduler.schedule(a).unwrap();
    rig.ticks(2);

    assert_eq!(
        *log.borrow(),
        ["A.initialize", "A.execute", "A.execute", "A.end(false)"]
    );
    assert_eq!(sink.events().len(), 4);
    assert_eq!(sink.of_kind(EventKind::Finish), [(a, None)]);
}
