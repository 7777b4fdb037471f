//! Integration test: default commands and disabled mode.
//!
//! Validates idle fallback, hand-back after a command finishes, and which
//! commands survive or start while the scheduler is disabled.

use cadence_common::command::SubsystemSet;
use cadence_scheduler::error::RegistrationError;
use cadence_scheduler::testing::{RecordingCommand, call_log};

use super::Rig;

#[test]
fn default_fills_idle_subsystem_and_returns_after_use() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let log = call_log();
    let coast = rig
        .scheduler
        .register(RecordingCommand::new("Coast", &log).requiring(drive));
    let turn = rig
        .scheduler
        .register(RecordingCommand::new("Turn", &log).requiring(drive).finish_after(1));
    rig.scheduler.set_default_command(drive, coast).unwrap();

    // Defaults start in the last phase and first execute on the next tick.
    rig.tick();
    assert_eq!(*log.borrow(), ["Coast.initialize"]);
    rig.tick();
    log.borrow_mut().clear();

    rig.scheduler.schedule(turn).unwrap();
    rig.tick();
    assert_eq!(
        *log.borrow(),
        [
            "Coast.end(true)",
            "Turn.initialize",
            "Turn.execute",
            "Turn.end(false)",
            "Coast.initialize",
        ]
    );
    assert_eq!(rig.scheduler.owner_of(drive), Some(coast));
}

#[test]
fn default_must_require_exactly_its_subsystem() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let intake = rig.subsystem("intake");
    let log = call_log();
    let wide = rig.scheduler.register(
        RecordingCommand::new("Wide", &log).requiring(SubsystemSet::of(drive).with(intake)),
    );
    let bare = rig.scheduler.register(RecordingCommand::new("Bare", &log));

    assert!(matches!(
        rig.scheduler.set_default_command(drive, wide),
        Err(RegistrationError::InvalidDefaultCommand { .. })
    ));
    assert!(matches!(
        rig.scheduler.set_default_command(drive, bare),
        Err(RegistrationError::InvalidDefaultCommand { .. })
    ));
    assert_eq!(rig.scheduler.default_command(drive), None);
}

#[test]
fn cleared_default_no_longer_starts() {
    let mut rig = Rig::new();
    let drive = rig.subsystem("drive");
    let log = call_log();
    let coast = rig
        .scheduler
        .register(RecordingCommand::new("Coast", &log).requiring(drive));
    rig.scheduler.set_default_command(drive, coast).unwrap();

    assert_eq!(rig.scheduler.clear_default_command(drive), Ok(Some(coast)));
    rig.ticks(2);
    assert!(log.borrow().is_empty());
}

#[test]
fn disabling_interrupts_ineligible_commands() {
    let mut rig = Rig::new();
    let log = call_log();
    let drive = rig.scheduler.register(RecordingCommand::new("Drive", &log));
    let leds = rig
        .scheduler
        .register(RecordingCommand::new("Leds", &log).run_when_disabled(true));

    rig.scheduler.schedule(drive).unwrap();
    rig.scheduler.schedule(leds).unwrap();
    rig.tick();

    rig.scheduler.set_disabled(true);
    rig.tick();

    assert!(!rig.scheduler.is_running(drive));
    assert!(rig.scheduler.is_running(leds));
    assert!(log.borrow().contains(&"Drive.end(true)".to_string()));
}

#[test]
fn disabled_mode_drops_ineligible_requests_and_defaults() {
    let mut rig = Rig::new();
    let arm = rig.subsystem("arm");
    let log = call_log();
    let hold = rig
        .scheduler
        .register(RecordingCommand::new("Hold", &log).requiring(arm));
    let raise = rig
        .scheduler
        .register(RecordingCommand::new("Raise", &log).requiring(arm));
    rig.scheduler.set_default_command(arm, hold).unwrap();
    rig.scheduler.set_disabled(true);

    rig.scheduler.schedule(raise).unwrap();
    rig.ticks(2);
    assert!(log.borrow().is_empty());
    assert!(rig.scheduler.pending_requests().is_empty());

    rig.scheduler.set_disabled(false);
    rig.tick();
    assert!(rig.scheduler.is_running(hold));
    // The dropped request is not replayed.
    assert!(!rig.scheduler.is_running(raise));
}

#[test]
fn ignoring_disable_lets_a_command_run_while_disabled() {
    let mut rig = Rig::new();
    let log = call_log();
    let calibrate = rig
        .scheduler
        .register(RecordingCommand::new("Calibrate", &log).finish_after(2));
    let calibrate = rig.scheduler.ignoring_disable(calibrate).unwrap();
    rig.scheduler.set_disabled(true);

    rig.scheduler.schedule(calibrate).unwrap();
    rig.ticks(2);

    assert_eq!(
        *log.borrow(),
        [
            "Calibrate.initialize",
            "Calibrate.execute",
            "Calibrate.execute",
            "Calibrate.end(false)",
        ]
    );
}
