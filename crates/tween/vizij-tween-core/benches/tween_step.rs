use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use vizij_tween_core::{ManagerConfig, PropertyTrackConfig, TweenConfig, TweenManager};

fn looping_config(tracks: usize) -> TweenConfig {
    let mut cfg = TweenConfig {
        loop_count: -1,
        loop_delay: 50.0,
        persist: true,
        ..TweenConfig::default()
    };
    for i in 0..tracks {
        let track = PropertyTrackConfig {
            yoyo: i % 2 == 0,
            hold: 20.0,
            ..PropertyTrackConfig::new(format!("prop{i}"), 0.0, 1.0, 300.0 + i as f64 * 25.0)
        };
        cfg.tracks.push(track);
    }
    cfg
}

fn populated(count: usize, tracks: usize) -> TweenManager {
    let mut mgr = TweenManager::new(ManagerConfig::default());
    let cfg = looping_config(tracks);
    for _ in 0..count {
        mgr.create(&cfg).expect("bench config is valid");
    }
    // Admit everything before measuring.
    mgr.update(1.0);
    mgr
}

fn bench_tween_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("tween_step");

    for &count in &[10usize, 100, 1000] {
        group.bench_function(format!("manager_{count}x4"), |b| {
            let mut mgr = populated(count, 4);
            b.iter(|| {
                let out = mgr.update(black_box(16.6));
                black_box(out.changes.len());
            });
        });
    }

    group.bench_function("admit_and_finish_100", |b| {
        let cfg = TweenConfig::default()
            .with_track(PropertyTrackConfig::new("x", 0.0, 1.0, 10.0));
        b.iter_batched(
            || {
                let mut mgr = TweenManager::default();
                for _ in 0..100 {
                    mgr.create(&cfg).expect("bench config is valid");
                }
                mgr
            },
            |mut mgr| {
                mgr.update(16.6);
                black_box(mgr.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_tween_step);
criterion_main!(benches);
