use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use trellis::utils::{Logical, Rectangle};
use trellis::wayland::shell::xdg::{Anchor, ConstraintAdjustment, Gravity, PositionerState};

const ANCHORS: [Anchor; 9] = [
    Anchor::None,
    Anchor::Top,
    Anchor::Bottom,
    Anchor::Left,
    Anchor::Right,
    Anchor::TopLeft,
    Anchor::BottomLeft,
    Anchor::TopRight,
    Anchor::BottomRight,
];

const GRAVITIES: [Gravity; 9] = [
    Gravity::None,
    Gravity::Top,
    Gravity::Bottom,
    Gravity::Left,
    Gravity::Right,
    Gravity::TopLeft,
    Gravity::BottomLeft,
    Gravity::TopRight,
    Gravity::BottomRight,
];

fn criterion_benchmark(c: &mut Criterion) {
    let target: Rectangle<i32, Logical> = Rectangle::from((-200, -100, 1920, 1080));
    let mut rand = rand::thread_rng();

    let positioners = (0..1024)
        .map(|_| PositionerState {
            rect_size: (rand.gen_range(10..600), rand.gen_range(10..400)).into(),
            anchor_rect: Rectangle::from((
                rand.gen_range(-300..1900),
                rand.gen_range(-200..1100),
                rand.gen_range(1..200),
                rand.gen_range(1..200),
            )),
            anchor_edges: ANCHORS[rand.gen_range(0..ANCHORS.len())],
            gravity: GRAVITIES[rand.gen_range(0..GRAVITIES.len())],
            constraint_adjustment: ConstraintAdjustment::from_bits_truncate(rand.gen_range(0..64)),
            offset: (rand.gen_range(-20..20), rand.gen_range(-20..20)).into(),
            ..Default::default()
        })
        .collect::<Vec<_>>();

    c.bench_function("positioner_geometry", |b| {
        b.iter(|| {
            for positioner in &positioners {
                criterion::black_box(positioner.get_geometry());
            }
        });
    });

    c.bench_function("positioner_unconstrained_geometry", |b| {
        b.iter(|| {
            for positioner in &positioners {
                criterion::black_box(positioner.get_unconstrained_geometry(target));
            }
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
