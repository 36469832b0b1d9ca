//! Scheduler behaviour across ticks: pre-emption order, disable, fault
//! isolation and the single-holder guarantee.

use std::collections::BTreeSet;
use std::time::Duration;

use gigan_hal::sim::Journal;
use gigan_runtime::layout::{sim_hardware, tag, tags};
use gigan_runtime::scheduler::Scheduler;
use gigan_runtime::task::{Task, TaskContext, factory, hold};
use gigan_runtime::trigger::{BindingKind, Trigger};
use gigan_types::{Action, GiganError, InputSnapshot, ResourceTag};

/// Records every lifecycle callback to a journal and drives one resource
/// forward each tick.
struct Recorder {
    name: &'static str,
    requirements: Vec<ResourceTag>,
    log: Journal,
    ticks: u32,
    fail_on_tick: Option<u32>,
    fail_on_start: bool,
    fail_on_end: bool,
}

impl Recorder {
    fn new(name: &'static str, resource: &str, log: &Journal) -> Self {
        Self {
            name,
            requirements: vec![tag(resource)],
            log: log.clone(),
            ticks: 0,
            fail_on_tick: None,
            fail_on_start: false,
            fail_on_end: false,
        }
    }

    fn failing_on(mut self, tick: u32) -> Self {
        self.fail_on_tick = Some(tick);
        self
    }

    fn failing_start(mut self) -> Self {
        self.fail_on_start = true;
        self
    }

    fn failing_end(mut self) -> Self {
        self.fail_on_end = true;
        self
    }

    fn fault(&self, details: &str) -> GiganError {
        self.log.record(format!("{}:fault", self.name));
        GiganError::TaskFault {
            task: self.name.to_string(),
            details: details.into(),
        }
    }
}

impl Task for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn requirements(&self) -> &[ResourceTag] {
        &self.requirements
    }

    fn on_start(&mut self, _ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        if self.fail_on_start {
            return Err(self.fault("calibration failed"));
        }
        self.log.record(format!("{}:start", self.name));
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), GiganError> {
        self.ticks += 1;
        if self.fail_on_tick == Some(self.ticks) {
            return Err(self.fault("sensor read failed"));
        }
        self.log.record(format!("{}:tick", self.name));
        ctx.apply(&self.requirements[0], Action::Forward)
    }

    fn on_end(&mut self, _ctx: &mut TaskContext<'_>, interrupted: bool) -> Result<(), GiganError> {
        self.log.record(format!("{}:end({interrupted})", self.name));
        if self.fail_on_end {
            return Err(self.fault("brake release failed"));
        }
        Ok(())
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn count(entries: &[String], entry: &str) -> usize {
    entries.iter().filter(|e| *e == entry).count()
}

fn lifecycle(journal: &Journal) -> Vec<String> {
    journal
        .entries()
        .into_iter()
        .filter(|e| e.contains(':'))
        .collect()
}

#[test]
fn later_press_wins_and_loser_ends_before_winner_starts() {
    let journal = Journal::default();
    let mut hw = sim_hardware(Some(&journal)).unwrap().registry;
    let mut scheduler = Scheduler::new();

    let log = journal.clone();
    scheduler.bind(
        Trigger::button("a"),
        BindingKind::WhileTrue,
        factory(move || Box::new(Recorder::new("a", tags::INTAKE_FRONT, &log))),
    );
    let log = journal.clone();
    scheduler.bind(
        Trigger::button("b"),
        BindingKind::WhileTrue,
        factory(move || Box::new(Recorder::new("b", tags::INTAKE_FRONT, &log))),
    );

    let a = InputSnapshot::new().with_button("a", true);
    let both = a.clone().with_button("b", true);

    scheduler.tick(&mut hw, &a, ms(0), true);
    let report = scheduler.tick(&mut hw, &both, ms(20), true);

    assert_eq!(report.interrupted, vec!["a"]);
    assert_eq!(report.started, vec!["b"]);
    assert_eq!(
        lifecycle(&journal),
        vec!["a:start", "a:tick", "a:end(true)", "b:start", "b:tick"]
    );
    assert_eq!(scheduler.holder_of(&tag(tags::INTAKE_FRONT)), Some("b"));
}

#[test]
fn same_tick_presses_resolve_in_binding_order() {
    let journal = Journal::default();
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    for name in ["a", "b"] {
        let log = journal.clone();
        scheduler.bind(
            Trigger::button(name),
            BindingKind::OnTrue,
            factory(move || Box::new(Recorder::new(name, tags::CONVEYOR, &log))),
        );
    }

    let both = InputSnapshot::new().with_button("a", true).with_button("b", true);
    scheduler.tick(&mut hw, &both, ms(0), true);

    assert_eq!(
        lifecycle(&journal),
        vec!["a:start", "a:end(true)", "b:start", "b:tick"]
    );
}

#[test]
fn released_task_ends_normally_after_its_last_tick() {
    let journal = Journal::default();
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    let log = journal.clone();
    scheduler.bind(
        Trigger::button("a"),
        BindingKind::WhileTrue,
        factory(move || Box::new(Recorder::new("a", tags::CONVEYOR, &log))),
    );

    scheduler.tick(&mut hw, &InputSnapshot::new().with_button("a", true), ms(0), true);
    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);

    assert_eq!(report.finished, vec!["a"]);
    assert_eq!(
        lifecycle(&journal),
        vec!["a:start", "a:tick", "a:tick", "a:end(false)"]
    );
}

#[test]
fn disabling_ends_every_task_before_any_write() {
    let journal = Journal::default();
    let mut hw = sim_hardware(Some(&journal)).unwrap().registry;
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Box::new(Recorder::new("feed", tags::CONVEYOR, &journal)));
    scheduler.schedule(Box::new(Recorder::new("spin", tags::FLYWHEEL, &journal)));
    scheduler
        .set_default_task(factory(|| hold("dump_hold", tags::DUMP, Action::Retract).boxed()))
        .unwrap();
    scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
    journal.clear();

    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), false);

    assert_eq!(report.interrupted, vec!["feed", "spin", "dump_hold"]);
    assert_eq!(journal.entries(), vec!["feed:end(true)", "spin:end(true)"]);
    assert!(scheduler.arbiter_snapshot().holders.is_empty());

    // Nothing restarts while disabled.
    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(40), false);
    assert!(report.started.is_empty());
    assert_eq!(journal.entries().len(), 2);
}

#[test]
fn faulting_task_is_retired_alone() {
    let journal = Journal::default();
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Box::new(
        Recorder::new("flaky", tags::CONVEYOR, &journal).failing_on(2),
    ));
    scheduler.schedule(Box::new(Recorder::new("steady", tags::FLYWHEEL, &journal)));

    scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);
    assert_eq!(report.faulted, vec!["flaky"]);

    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(40), true);
    assert!(report.faulted.is_empty());

    let entries = lifecycle(&journal);
    assert!(entries.contains(&"flaky:end(true)".to_string()));
    let steady_ticks = entries.iter().filter(|e| *e == "steady:tick").count();
    assert_eq!(steady_ticks, 3);
    assert_eq!(scheduler.holder_of(&tag(tags::CONVEYOR)), None);
    assert_eq!(scheduler.holder_of(&tag(tags::FLYWHEEL)), Some("steady"));
}

#[test]
fn start_fault_retires_the_task_and_frees_its_resources() {
    let journal = Journal::default();
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Box::new(
        Recorder::new("flaky", tags::CONVEYOR, &journal).failing_start(),
    ));
    scheduler.schedule(Box::new(Recorder::new("steady", tags::FLYWHEEL, &journal)));

    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
    assert_eq!(report.faulted, vec!["flaky"]);
    assert_eq!(report.started, vec!["steady"]);
    assert_eq!(scheduler.holder_of(&tag(tags::CONVEYOR)), None);
    assert_eq!(hw.last_action(&tag(tags::CONVEYOR)), None);

    scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);
    let entries = lifecycle(&journal);
    assert_eq!(count(&entries, "flaky:end(true)"), 1);
    assert_eq!(count(&entries, "flaky:tick"), 0);
    assert_eq!(count(&entries, "steady:tick"), 2);

    scheduler.cancel_all();
    scheduler.tick(&mut hw, &InputSnapshot::new(), ms(40), true);
    assert!(scheduler.arbiter_snapshot().holders.is_empty());
}

#[test]
fn end_fault_is_reported_and_resources_are_still_released() {
    let journal = Journal::default();
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    let sticky = scheduler.schedule(Box::new(
        Recorder::new("sticky", tags::CONVEYOR, &journal).failing_end(),
    ));
    scheduler.schedule(Box::new(Recorder::new("steady", tags::FLYWHEEL, &journal)));
    scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);

    scheduler.cancel(sticky);
    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(20), true);
    assert_eq!(report.interrupted, vec!["sticky"]);
    assert_eq!(report.faulted, vec!["sticky"]);
    assert_eq!(scheduler.holder_of(&tag(tags::CONVEYOR)), None);
    assert_eq!(scheduler.holder_of(&tag(tags::FLYWHEEL)), Some("steady"));

    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(40), true);
    assert!(report.faulted.is_empty());
    let entries = lifecycle(&journal);
    assert_eq!(count(&entries, "sticky:end(true)"), 1);
    assert_eq!(count(&entries, "sticky:tick"), 1);
    assert_eq!(count(&entries, "steady:tick"), 3);

    scheduler.cancel_all();
    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(60), true);
    assert_eq!(report.interrupted, vec!["steady"]);
    assert!(report.faulted.is_empty());
    assert!(scheduler.arbiter_snapshot().holders.is_empty());
}

#[test]
fn writing_an_unheld_resource_faults_only_the_writer() {
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    let rogue = tag(tags::CLIMBER);
    scheduler.schedule(
        gigan_runtime::task::FnTask::new("rogue")
            .requires(tags::DUMP)
            .on_tick(move |ctx| ctx.apply(&rogue, Action::Extend))
            .boxed(),
    );
    scheduler.schedule(hold("feed", tags::CONVEYOR, Action::Forward).boxed());

    let report = scheduler.tick(&mut hw, &InputSnapshot::new(), ms(0), true);
    assert_eq!(report.faulted, vec!["rogue"]);
    assert_eq!(hw.last_action(&tag(tags::CLIMBER)), None);
    assert_eq!(hw.last_action(&tag(tags::CONVEYOR)), Some(&Action::Forward));
}

#[test]
fn at_most_one_holder_under_button_mashing() {
    let mut hw = sim_hardware(None).unwrap().registry;
    let mut scheduler = Scheduler::new();
    let buttons = ["front", "sushi", "feed", "spin", "both"];
    let shapes: [&[&str]; 5] = [
        &[tags::INTAKE_FRONT, tags::CONVEYOR],
        &[tags::INTAKE_SUSHI, tags::CONVEYOR],
        &[tags::CONVEYOR],
        &[tags::FLYWHEEL],
        &[tags::CONVEYOR, tags::FLYWHEEL],
    ];
    for (button, resources) in buttons.into_iter().zip(shapes) {
        let writes: Vec<(ResourceTag, Action)> =
            resources.iter().map(|r| (tag(r), Action::Forward)).collect();
        scheduler.bind(
            Trigger::button(button),
            BindingKind::WhileTrue,
            factory(move || gigan_runtime::task::hold_all(button, writes.clone()).boxed()),
        );
    }

    // Deterministic pseudo-random press pattern.
    let mut seed: u32 = 0x2545_f491;
    for tick in 0..500u64 {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let mut input = InputSnapshot::new();
        for (bit, button) in buttons.iter().enumerate() {
            input.set_button(*button, (seed >> (bit + 11)) & 1 == 1);
        }
        scheduler.tick(&mut hw, &input, ms(tick * 20), true);

        let running = scheduler.running();
        let mut seen = BTreeSet::new();
        for task in &running {
            for resource in &task.resources {
                assert!(
                    seen.insert(resource.clone()),
                    "{resource} held twice at tick {tick}"
                );
            }
        }
        let snapshot = scheduler.arbiter_snapshot();
        assert_eq!(snapshot.holders.len(), seen.len());
    }
}
