use criterion::{black_box, criterion_group, criterion_main, Criterion};
use payment_allocator::allocation::allocator::PaymentAllocator;
use payment_allocator::allocation::policy::AllocationPolicy;
use payment_allocator::core::party::PartyKind;
use payment_allocator::simulation::generator::{generate_random_account, ScenarioConfig};

fn bench_allocation_50_obligations(c: &mut Criterion) {
    let config = ScenarioConfig {
        obligation_count: 50,
        transfer_count: 40,
        ..Default::default()
    };
    let account = generate_random_account(&config);
    let allocator = PaymentAllocator::default();

    c.bench_function("allocation_50_obligations", |b| {
        b.iter(|| allocator.reevaluate(black_box(&account)))
    });
}

fn bench_allocation_1000_obligations(c: &mut Criterion) {
    let config = ScenarioConfig {
        obligation_count: 1000,
        transfer_count: 800,
        span_days: 720,
        ..Default::default()
    };
    let account = generate_random_account(&config);
    let allocator = PaymentAllocator::default();

    c.bench_function("allocation_1000_obligations", |b| {
        b.iter(|| allocator.reevaluate(black_box(&account)))
    });
}

fn bench_allocation_per_transfer_10000(c: &mut Criterion) {
    let config = ScenarioConfig {
        kind: PartyKind::FreightAgency,
        obligation_count: 10_000,
        transfer_count: 10_000,
        span_days: 1800,
        ..Default::default()
    };
    let account = generate_random_account(&config);
    let allocator = PaymentAllocator::new(AllocationPolicy::legacy(PartyKind::FreightAgency));

    c.bench_function("allocation_per_transfer_10000", |b| {
        b.iter(|| allocator.reevaluate(black_box(&account)))
    });
}

criterion_group!(
    benches,
    bench_allocation_50_obligations,
    bench_allocation_1000_obligations,
    bench_allocation_per_transfer_10000
);
criterion_main!(benches);
