use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

use glam::DVec3;
use saxs_engine::kernel::Accumulator;
use saxs_engine::kernel::PairwiseKernel;
use saxs_engine::Axis;
use saxs_engine::AtomRecord;
use saxs_engine::CompactCoords;
use saxs_engine::FormFactorType;
use saxs_engine::OverflowPolicy;

struct Sink(f64);

impl Accumulator for Sink {
    fn add(&mut self, _ff_a: FormFactorType, _ff_b: FormFactorType, _bin: usize, value: f64) {
        self.0 += value;
    }
}

fn random_coords(n: usize) -> CompactCoords {
    let atoms: Vec<AtomRecord> = (0..n)
        .map(|i| {
            let t = i as f64;
            AtomRecord::new(
                DVec3::new((t * 0.37).sin() * 20.0, (t * 0.71).cos() * 20.0, (t * 1.13).sin() * 20.0),
                1.0,
                FormFactorType::CarbonAliphatic,
            )
        })
        .collect();
    CompactCoords::from_atoms(&atoms)
}

fn bench_evaluate_all(c: &mut Criterion) {
    let axis = Axis::new(0.0, 50.0, 200).unwrap();
    let kernel = PairwiseKernel::new(&axis, OverflowPolicy::Discard, false);
    let coords = random_coords(500);

    c.bench_function("kernel/evaluate_all_same_array_500", |b| {
        b.iter(|| {
            let mut sink = Sink(0.0);
            kernel.evaluate_all(&mut sink, black_box(&coords), black_box(&coords), true, 2.0);
            sink.0
        })
    });
}

criterion_group!(benches, bench_evaluate_all);
criterion_main!(benches);
