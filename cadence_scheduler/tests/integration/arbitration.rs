//! Integration test: subsystem arbitration.
//!
//! Validates exclusive ownership, both interruption behaviors, per-request
//! behavior overrides and multi-subsystem takeovers.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};
use cadence_scheduler::testing::{RecordingCommand, call_log};

use super::Rig;

#[test]
fn newcomer_interrupts_cancel_self_holder() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let log = call_log();
    let a = rig
        .scheduler
        .register(RecordingCommand::new("A", &log).requiring(drive));
    let b = rig
        .scheduler
        .register(RecordingCommand::new("B", &log).requiring(drive));

    rig.scheduler.schedule(a).unwrap();
    rig.tick();
    assert_eq!(rig.scheduler.owner_of(drive), Some(a));

    rig.scheduler.schedule(b).unwrap();
    rig.tick();

    assert_eq!(
        *log.borrow(),
        [
            "A.initialize",
            "A.execute",
            "A.end(true)",
            "B.initialize",
            "B.execute"
        ]
    );
    assert!(!rig.scheduler.is_running(a));
    assert_eq!(rig.scheduler.owner_of(drive), Some(b));
    assert_eq!(rig.scheduler.running_commands(), [b]);
}

#[test]
fn cancel_incoming_holder_keeps_subsystem() {
    let mut rig = Rig::new();
    let arm = rig.subsystem("arm");
    let log = call_log();
    let hold = rig.scheduler.register(
        RecordingCommand::new("Hold", &log)
            .requiring(arm)
            .interruption(InterruptionBehavior::CancelIncoming),
    );
    let raise = rig
        .scheduler
        .register(RecordingCommand::new("Raise", &log).requiring(arm));

    rig.scheduler.schedule(hold).unwrap();
    rig.tick();
    rig.scheduler.schedule(raise).unwrap();
    rig.tick();

    assert!(rig.scheduler.is_running(hold));
    assert!(!rig.scheduler.is_running(raise));
    assert!(log.borrow().iter().all(|line| !line.starts_with("Raise")));
    assert!(rig.scheduler.pending_requests().is_empty());
}

#[test]
fn behavior_override_applies_to_one_activation() {
    let mut rig = Rig::new();
    let arm = rig.subsystem("arm");
    let log = call_log();
    let hold = rig
        .scheduler
        .register(RecordingCommand::new("Hold", &log).requiring(arm).finish_after(3));
    let raise = rig
        .scheduler
        .register(RecordingCommand::new("Raise", &log).requiring(arm));

    rig.scheduler
        .schedule_with_behavior(hold, InterruptionBehavior::CancelIncoming)
        .unwrap();
    rig.tick();
    assert_eq!(
        rig.scheduler.active_behavior(hold),
        Some(InterruptionBehavior::CancelIncoming)
    );

    rig.scheduler.schedule(raise).unwrap();
    rig.tick();
    assert!(!rig.scheduler.is_running(raise));

    // Third execute finishes Hold; the next plain schedule uses the default.
    rig.tick();
    assert!(!rig.scheduler.is_running(hold));
    rig.scheduler.schedule(hold).unwrap();
    rig.tick();
    assert_eq!(
        rig.scheduler.active_behavior(hold),
        Some(InterruptionBehavior::CancelSelf)
    );

    rig.scheduler.schedule(raise).unwrap();
    rig.tick();
    assert!(rig.scheduler.is_running(raise));
    assert!(!rig.scheduler.is_running(hold));
}

#[test]
fn rescheduling_with_new_behavior_restarts() {
    let mut rig = Rig::new();
    let arm = rig.subsystem("arm");
    let log = call_log();
    let hold = rig
        .scheduler
        .register(RecordingCommand::new("Hold", &log).requiring(arm));

    rig.scheduler.schedule(hold).unwrap();
    rig.tick();
    log.borrow_mut().clear();

    // Same behavior: no-op.
    rig.scheduler
        .schedule_with_behavior(hold, InterruptionBehavior::CancelSelf)
        .unwrap();
    rig.tick();
    assert_eq!(*log.borrow(), ["Hold.execute"]);
    log.borrow_mut().clear();

    rig.scheduler
        .schedule_with_behavior(hold, InterruptionBehavior::CancelIncoming)
        .unwrap();
    rig.tick();
    assert_eq!(
        *log.borrow(),
        ["Hold.end(true)", "Hold.initialize", "Hold.execute"]
    );
    assert_eq!(rig.scheduler.owner_of(arm), Some(hold));
}

#[test]
fn takeover_of_several_subsystems() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let intake = rig.subsystem("intake");
    let log = call_log();
    let a = rig
        .scheduler
        .register(RecordingCommand::new("A", &log).requiring(drive));
    let b = rig
        .scheduler
        .register(RecordingCommand::new("B", &log).requiring(intake));
    let c = rig
        .scheduler
        .register(RecordingCommand::new("C", &log).requiring(SubsystemSet::of(drive).with(intake)));

    rig.scheduler.schedule(a).unwrap();
    rig.scheduler.schedule(b).unwrap();
    rig.tick();
    assert_eq!(rig.scheduler.running_commands(), [a, b]);

    rig.scheduler.schedule(c).unwrap();
    rig.tick();
    assert_eq!(rig.scheduler.running_commands(), [c]);
    assert_eq!(rig.scheduler.owner_of(drive), Some(c));
    assert_eq!(rig.scheduler.owner_of(intake), Some(c));
}

#[test]
fn one_refusing_holder_blocks_the_whole_request() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let intake = rig.subsystem("intake");
    let log = call_log();
    let a = rig
        .scheduler
        .register(RecordingCommand::new("A", &log).requiring(drive));
    let b = rig.scheduler.register(
        RecordingCommand::new("B", &log)
            .requiring(intake)
            .interruption(InterruptionBehavior::CancelIncoming),
    );
    let c = rig
        .scheduler
        .register(RecordingCommand::new("C", &log).requiring(SubsystemSet::of(drive).with(intake)));

    rig.scheduler.schedule(a).unwrap();
    rig.scheduler.schedule(b).unwrap();
    rig.tick();
    rig.scheduler.schedule(c).unwrap();
    rig.tick();

    // Nothing is interrupted when any holder refuses.
    assert_eq!(rig.scheduler.running_commands(), [a, b]);
    assert!(!log.borrow().contains(&"A.end(true)".to_string()));
}

#[test]
fn duplicate_requests_in_one_tick_start_once() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig.scheduler.register(RecordingCommand::new("A", &log));

    rig.scheduler.schedule(a).unwrap();
    rig.scheduler.schedule(a).unwrap();
    rig.tick();

    assert_eq!(*log.borrow(), ["A.initialize", "A.execute"]);
}

#[test]
fn cancel_of_idle_command_is_a_no_op() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig.scheduler.register(RecordingCommand::new("A", &log));

    rig.scheduler.cancel(a);
    rig.tick();

    assert!(log.borrow().is_empty());
    assert!(rig.scheduler.running_commands().is_empty());
}

#[test]
fn behavior_override_does_not_restart_while_disabled() {
    let mut rig = Rig::new();
    let log = call_log();
    let a = rig.scheduler.register(RecordingCommand::new("A", &log));

    rig.scheduler.schedule(a).unwrap();
    rig.tick();
    rig.scheduler.set_disabled(true);
    rig.scheduler
        .schedule_with_behavior(a, InterruptionBehavior::CancelIncoming)
        .unwrap();
    rig.tick();

    assert_eq!(*log.borrow(), ["A.initialize", "A.execute", "A.end(true)"]);
    assert!(!rig.scheduler.is_running(a));
}
