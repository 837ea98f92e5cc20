use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Deserialize;
use vizij_test_fixtures::{scenarios, tweens};
use vizij_tween_core::{
    EventArgs, EventListener, EventRecorder, ManagerConfig, Tween, TweenConfig, TweenEvent,
    TweenId, TweenManager,
};

#[derive(Debug, Deserialize)]
struct Expectation {
    tick: f64,
    ticks: usize,
    total_duration: f64,
    total_elapsed: f64,
    unit_events: Vec<TimedEvent>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct TimedEvent {
    tick: usize,
    event: TweenEvent,
}

/// Records unit-level events stamped with the tick they fired on.
struct TickLog {
    tick: Rc<Cell<usize>>,
    out: Rc<RefCell<Vec<TimedEvent>>>,
}

impl EventListener for TickLog {
    fn on_event(&mut self, args: &EventArgs<'_>) {
        if args.event.is_unit_level() {
            self.out.borrow_mut().push(TimedEvent {
                tick: self.tick.get(),
                event: args.event,
            });
        }
    }
}

#[test]
fn every_tween_fixture_validates() {
    for name in tweens::keys() {
        let raw = tweens::json(&name).unwrap();
        let cfg = TweenConfig::from_json(&raw)
            .unwrap_or_else(|e| panic!("fixture {name} failed validation: {e}"));
        Tween::from_config(TweenId(0), &cfg).unwrap();
    }
}

#[test]
fn scenarios_match_expected_timeline() {
    let names = scenarios::keys();
    assert!(names.contains(&"loop_with_delays".to_string()));
    for name in names {
        let cfg: TweenConfig = scenarios::tween(&name).unwrap();
        let expect: Expectation = scenarios::expect(&name).unwrap();

        let mut tween = Tween::from_config(TweenId(0), &cfg).unwrap();
        assert_eq!(tween.total_duration(), expect.total_duration, "{name}");

        let tick = Rc::new(Cell::new(0));
        let log = Rc::new(RefCell::new(Vec::new()));
        tween
            .subscribe(Box::new(TickLog {
                tick: tick.clone(),
                out: log.clone(),
            }))
            .unwrap();

        tween.make_active();
        for i in 1..=expect.ticks {
            tick.set(i);
            let done = tween.update(expect.tick);
            assert_eq!(done, i == expect.ticks, "{name}: finished flag on tick {i}");
        }

        assert_eq!(log.borrow().as_slice(), expect.unit_events.as_slice(), "{name}");
        assert_eq!(tween.total_elapsed(), expect.total_elapsed, "{name}");
        assert_eq!(tween.total_progress(), 1.0, "{name}");
    }
}

#[test]
fn staggered_tracks_through_manager() {
    let cfg: TweenConfig = tweens::load("staggered_tracks").unwrap();
    let mut mgr = TweenManager::new(ManagerConfig::default());
    let id = mgr.create(&cfg).unwrap();
    let rec = EventRecorder::new();
    mgr.get_mut(id).unwrap().subscribe(rec.listener()).unwrap();
    assert_eq!(mgr.get(id).unwrap().duration(), 500.0);

    // Start delay.
    let out = mgr.update(100.0);
    assert_eq!(out.activated, vec![id]);
    assert!(mgr.get(id).unwrap().has_started());
    assert_eq!(mgr.get(id).unwrap().elapsed(), 0.0);

    for _ in 0..2 {
        mgr.update(100.0);
    }
    let out = mgr.update(100.0);
    assert_eq!(out.value(id, "x"), Some(10.0));
    let y = out.value(id, "y").unwrap();
    assert!((y - (10.0 - 10.0 / 3.0)).abs() < 1e-9);
    assert_eq!(out.value(id, "scale"), Some(1.0));

    mgr.update(100.0);
    let out = mgr.update(100.0);
    assert_eq!(out.finished, vec![id]);
    assert_eq!(out.removed, vec![id]);
    assert_eq!(out.value(id, "y"), Some(0.0));
    assert!(mgr.is_empty());
    assert_eq!(rec.count(TweenEvent::OnRepeat), 2);
    assert_eq!(rec.count(TweenEvent::OnComplete), 1);
}

#[test]
fn paused_start_defers_on_start_until_resume() {
    let cfg: TweenConfig = tweens::load("paused_start").unwrap();
    let mut mgr = TweenManager::default();
    let id = mgr.create(&cfg).unwrap();
    let rec = EventRecorder::new();
    mgr.get_mut(id).unwrap().subscribe(rec.listener()).unwrap();

    let out = mgr.update(100.0);
    assert_eq!(out.activated, vec![id]);
    assert!(out.changes.is_empty());
    assert_eq!(rec.events(), vec![TweenEvent::OnActive]);

    mgr.get_mut(id).unwrap().resume();
    mgr.update(100.0);
    assert_eq!(mgr.get(id).unwrap().elapsed(), 200.0);
    assert_eq!(rec.count(TweenEvent::OnStart), 1);

    let out = mgr.update(150.0);
    assert_eq!(out.finished, vec![id]);
    assert!(out.removed.is_empty());
    assert!(mgr.get(id).unwrap().is_finished());
}

#[test]
fn infinite_yoyo_runs_until_killed() {
    let cfg: TweenConfig = tweens::load("infinite_yoyo").unwrap();
    let mut mgr = TweenManager::default();
    let id = mgr.create(&cfg).unwrap();
    let rec = EventRecorder::new();
    mgr.get_mut(id).unwrap().subscribe(rec.listener()).unwrap();

    for _ in 0..100 {
        let out = mgr.update(100.0);
        assert!(out.finished.is_empty());
    }
    // 900ms per playthrough over 10s.
    assert_eq!(rec.count(TweenEvent::OnLoop), 11);
    assert_eq!(rec.count(TweenEvent::OnYoyo), 11);
    assert_eq!(rec.count(TweenEvent::OnComplete), 0);
    assert!(mgr.get(id).unwrap().total_duration().is_infinite());

    mgr.kill_all();
    assert!(mgr.is_empty());
    assert_eq!(rec.count(TweenEvent::OnStop), 0);
}
