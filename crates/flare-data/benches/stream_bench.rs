use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flare_core::math::Vec3;
use flare_core::HashedString;
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDataType, StreamGroup, StreamId, StreamLayout,
    StreamProcessor,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const ELEMENTS: usize = 10_000;

/// Integrates position from velocity and kills every element past a plane.
struct Integrate {
    position: Option<StreamId>,
    velocity: Option<StreamId>,
}

impl StreamProcessor<f32> for Integrate {
    fn name(&self) -> &str {
        "Integrate"
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.position = Some(layout.find(&HashedString::new("Position"), StreamDataType::Float3)?);
        self.velocity = Some(layout.find(&HashedString::new("Velocity"), StreamDataType::Float3)?);
        Ok(())
    }

    fn initialize_elements(&mut self, frame: &mut ProcessorFrame<'_, f32>, range: std::ops::Range<usize>) {
        let Some(velocity) = self.velocity else { return };
        for (offset, v) in frame.slice_mut::<Vec3>(velocity)[range].iter_mut().enumerate() {
            *v = Vec3::new(0.0, 1.0 + (offset % 7) as f32, 0.0);
        }
    }

    fn process(&mut self, frame: &mut ProcessorFrame<'_, f32>, active_count: usize) {
        let (Some(position), Some(velocity)) = (self.position, self.velocity) else {
            return;
        };
        let dt = *frame.env;
        let (velocities, positions) = frame.read_write::<Vec3, Vec3>(velocity, position);
        let mut dead = Vec::new();
        for i in 0..active_count {
            positions[i] += velocities[i] * dt;
            if positions[i].y > 10.0 {
                dead.push(i);
            }
        }
        for i in dead {
            frame.remove_element(i);
        }
    }
}

fn filled_group() -> StreamGroup<f32> {
    let mut group = StreamGroup::new(ELEMENTS);
    group.add_stream("Position", StreamDataType::Float3).expect("Position");
    group.add_stream("Velocity", StreamDataType::Float3).expect("Velocity");
    group.add_stream("Color", StreamDataType::Float4).expect("Color");
    group.set_size(ELEMENTS);
    group.add_processor(Box::new(Integrate {
        position: None,
        velocity: None,
    }));
    group
}

fn bench_stream_group(c: &mut Criterion) {
    let mut group_bench = c.benchmark_group("Stream Group");

    group_bench.bench_function("spawn + process (10k)", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        let mut group = filled_group();
        let mut dt = 1.0 / 60.0;
        b.iter(|| {
            group.spawn(ELEMENTS / 20, &mut dt, &mut rng);
            group.process(&mut dt, &mut rng);
            black_box(group.active());
        });
    });

    group_bench.bench_function("swap-remove (10k)", |b| {
        let mut rng = StdRng::seed_from_u64(2);
        let mut group = filled_group();
        let mut dt = 0.0;
        b.iter(|| {
            group.spawn(ELEMENTS, &mut dt, &mut rng);
            while group.active() > 0 {
                group.remove_element(0);
            }
            black_box(group.generation());
        });
    });

    group_bench.finish();
}

criterion_group!(benches, bench_stream_group);
criterion_main!(benches);
