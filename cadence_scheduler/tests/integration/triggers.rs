//! Integration test: trigger bindings driving the scheduler.
//!
//! A shared `Cell<bool>` stands in for an operator button; every binding
//! kind is exercised across press and release edges.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use cadence_common::command::InterruptionBehavior;
use cadence_scheduler::testing::{RecordingCommand, call_log};
use cadence_scheduler::trigger::{DebounceType, Trigger};

use super::Rig;

fn button() -> (Rc<Cell<bool>>, impl FnMut() -> bool + 'static) {
    let state = Rc::new(Cell::new(false));
    let s = state.clone();
    (state, move || s.get())
}

#[test]
fn on_true_starts_once_per_press() {
    let mut rig = Rig::new();
    let log = call_log();
    let shoot = rig.scheduler.register(RecordingCommand::new("Shoot", &log));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).on_true(shoot));

    rig.tick();
    assert!(!rig.scheduler.is_running(shoot));

    pressed.set(true);
    rig.ticks(3);
    pressed.set(false);
    rig.tick();

    // Release does not cancel an on-true binding.
    assert!(rig.scheduler.is_running(shoot));
    let inits = log.borrow().iter().filter(|l| *l == "Shoot.initialize").count();
    assert_eq!(inits, 1);
}

#[test]
fn while_true_follows_the_button() {
    let mut rig = Rig::new();
    let arm = rig.subsystem("arm");
    let log = call_log();
    let raise = rig
        .scheduler
        .register(RecordingCommand::new("Raise", &log).requiring(arm));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).while_true(raise));

    pressed.set(true);
    rig.tick();
    assert!(rig.scheduler.is_running(raise));

    pressed.set(false);
    rig.tick();
    assert!(!rig.scheduler.is_running(raise));
    assert_eq!(
        *log.borrow(),
        ["Raise.initialize", "Raise.execute", "Raise.end(true)"]
    );
}

#[test]
fn while_true_does_not_restart_a_finished_command() {
    let mut rig = Rig::new();
    let log = call_log();
    let pulse = rig
        .scheduler
        .register(RecordingCommand::new("Pulse", &log).finish_after(1));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).while_true(pulse));

    pressed.set(true);
    rig.ticks(4);

    assert!(!rig.scheduler.is_running(pulse));
    assert_eq!(
        *log.borrow(),
        ["Pulse.initialize", "Pulse.execute", "Pulse.end(false)"]
    );
}

#[test]
fn toggle_on_true_alternates() {
    let mut rig = Rig::new();
    let log = call_log();
    let spin = rig.scheduler.register(RecordingCommand::new("Spin", &log));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).toggle_on_true(spin));

    let press = |rig: &mut Rig| {
        pressed.set(true);
        rig.tick();
        pressed.set(false);
        rig.tick();
    };

    press(&mut rig);
    assert!(rig.scheduler.is_running(spin));
    press(&mut rig);
    assert!(!rig.scheduler.is_running(spin));
    press(&mut rig);
    assert!(rig.scheduler.is_running(spin));
}

#[test]
fn on_false_needs_a_real_falling_edge() {
    let mut rig = Rig::new();
    let log = call_log();
    let stow = rig.scheduler.register(RecordingCommand::new("Stow", &log));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).on_false(stow));

    // Starts false: no edge.
    rig.ticks(2);
    assert!(!rig.scheduler.is_running(stow));

    pressed.set(true);
    rig.tick();
    pressed.set(false);
    rig.tick();
    assert!(rig.scheduler.is_running(stow));
}

#[test]
fn while_false_runs_between_presses() {
    let mut rig = Rig::new();
    let log = call_log();
    let idle = rig.scheduler.register(RecordingCommand::new("Idle", &log));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).while_false(idle));

    pressed.set(true);
    rig.tick();
    assert!(!rig.scheduler.is_running(idle));
    pressed.set(false);
    rig.tick();
    assert!(rig.scheduler.is_running(idle));
    pressed.set(true);
    rig.tick();
    assert!(!rig.scheduler.is_running(idle));
}

#[test]
fn debounced_press_fires_after_hold_time() {
    let mut rig = Rig::new();
    let log = call_log();
    let fire = rig.scheduler.register(RecordingCommand::new("Fire", &log));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(
        Trigger::new(read)
            .debounce(Duration::from_millis(60), DebounceType::Rising)
            .on_true(fire),
    );

    pressed.set(true);
    rig.ticks(3);
    assert!(!rig.scheduler.is_running(fire));
    rig.tick();
    assert!(rig.scheduler.is_running(fire));
}

#[test]
fn bounce_shorter_than_debounce_is_ignored() {
    let mut rig = Rig::new();
    let log = call_log();
    let fire = rig.scheduler.register(RecordingCommand::new("Fire", &log));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(
        Trigger::new(read)
            .debounce(Duration::from_millis(60), DebounceType::Rising)
            .on_true(fire),
    );

    for _ in 0..5 {
        pressed.set(true);
        rig.tick();
        pressed.set(false);
        rig.tick();
    }
    assert!(log.borrow().is_empty());
}

#[test]
fn combined_conditions() {
    let mut rig = Rig::new();
    let log = call_log();
    let score = rig.scheduler.register(RecordingCommand::new("Score", &log));
    let (aimed, read_aimed) = button();
    let (pressed, read_pressed) = button();
    rig.scheduler
        .register_trigger(Trigger::new(read_pressed).and(read_aimed).on_true(score));

    pressed.set(true);
    rig.tick();
    assert!(!rig.scheduler.is_running(score));

    aimed.set(true);
    rig.tick();
    assert!(rig.scheduler.is_running(score));
}

#[test]
fn trigger_request_loses_to_cancel_incoming_holder() {
    let mut rig = Rig::new();
    let arm = rig.subsystem("arm");
    let log = call_log();
    let climb = rig.scheduler.register(
        RecordingCommand::new("Climb", &log)
            .requiring(arm)
            .interruption(InterruptionBehavior::CancelIncoming),
    );
    let raise = rig
        .scheduler
        .register(RecordingCommand::new("Raise", &log).requiring(arm));
    let (pressed, read) = button();
    rig.scheduler.register_trigger(Trigger::new(read).on_true(raise));

    rig.scheduler.schedule(climb).unwrap();
    rig.tick();
    pressed.set(true);
    rig.tick();

    assert!(rig.scheduler.is_running(climb));
    assert!(!rig.scheduler.is_running(raise));
}
