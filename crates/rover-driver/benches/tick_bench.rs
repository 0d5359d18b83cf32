//! 调度循环性能基准测试
//!
//! - 单个 tick 的分派开销（不含休眠）
//! - 快照单元的读取开销

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rover_bus::Value;
use rover_driver::{FnPart, PartDescriptor, SnapshotCell, Vehicle};

fn build_vehicle(parts: usize) -> Vehicle {
    let mut vehicle = Vehicle::new();
    vehicle.bus_mut().put_one("stage/0", 0.0);
    for i in 0..parts {
        let input = format!("stage/{}", i);
        let output = format!("stage/{}", i + 1);
        vehicle
            .add(
                FnPart::new(|inputs: &[Option<Value>]| {
                    let x = rover_driver::part::input_f64(inputs, 0).unwrap_or(0.0);
                    Ok(vec![Value::Float(x + 1.0)])
                }),
                PartDescriptor::new(format!("stage-{}", i))
                    .inputs([input])
                    .outputs([output]),
            )
            .unwrap();
    }
    vehicle
}

fn bench_update_parts(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_parts");
    for parts in [1usize, 8, 32] {
        let mut vehicle = build_vehicle(parts);
        group.bench_with_input(BenchmarkId::from_parameter(parts), &parts, |b, _| {
            b.iter(|| vehicle.update_parts().unwrap());
        });
    }
    group.finish();
}

fn bench_snapshot_load(c: &mut Criterion) {
    let cell = SnapshotCell::new([0.0f64; 16]);
    c.bench_function("snapshot_load", |b| {
        b.iter(|| black_box(cell.load()));
    });
}

criterion_group!(benches, bench_update_parts, bench_snapshot_load);
criterion_main!(benches);
