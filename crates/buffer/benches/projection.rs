use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, NaiveDate};
use ddmrp_buffer::{
    BufferProfile, BufferZoneSet, ProjectionInput, ReceiptCalendar, ZoneInputs, project_daily,
    project_weekly,
};

fn sample_input(horizon_days: u32) -> ProjectionInput {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let zones = BufferZoneSet::calculate(&ZoneInputs::from_profile(
        10.0,
        Some(7.0),
        &BufferProfile::default(),
    ))
    .unwrap_or_else(|_| BufferZoneSet::zero());

    let mut receipts = ReceiptCalendar::new();
    for week in 0..(horizon_days / 7) {
        receipts.add(start + Duration::days(i64::from(week) * 7 + 3), 70.0);
    }

    ProjectionInput {
        start_date: start,
        on_hand: 140.0,
        on_order: receipts.total(),
        qualified_demand: 12.0,
        adu: 10.0,
        zones,
        receipts,
        moq: 25.0,
        rounding_multiple: 5.0,
        horizon_days,
    }
}

fn bench_zone_calculation(c: &mut Criterion) {
    let profile = BufferProfile::default();
    c.bench_function("zone_calculation", |b| {
        b.iter(|| {
            let inputs = ZoneInputs::from_profile(black_box(12.5), Some(9.0), &profile);
            black_box(BufferZoneSet::calculate(&inputs))
        });
    });
}

fn bench_daily_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_projection");

    for horizon in [14u32, 90, 365].iter() {
        group.throughput(Throughput::Elements(u64::from(*horizon)));
        let input = sample_input(*horizon);
        group.bench_with_input(BenchmarkId::new("days", horizon), &input, |b, input| {
            b.iter(|| black_box(project_daily(input)));
        });
    }

    group.finish();
}

fn bench_weekly_projection(c: &mut Criterion) {
    let input = sample_input(28);
    c.bench_function("weekly_projection_4w", |b| {
        b.iter(|| black_box(project_weekly(&input, 4)));
    });
}

criterion_group!(
    benches,
    bench_zone_calculation,
    bench_daily_projection,
    bench_weekly_projection
);
criterion_main!(benches);
