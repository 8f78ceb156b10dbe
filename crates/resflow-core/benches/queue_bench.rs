use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use resflow_core::event::EventQueue;
use resflow_core::test_utils::{priority_from, tagged_event};

fn bench_push_pop(c: &mut Criterion) {
    c.bench_function("queue_push_pop_1k", |b| {
        let queue = EventQueue::new();
        b.iter(|| {
            for i in 0..1000u32 {
                queue.push(tagged_event(priority_from(i as u8), i));
            }
            while let Some(event) = queue.pop() {
                black_box(event);
            }
        });
    });
}

fn bench_drain(c: &mut Criterion) {
    c.bench_function("queue_drain_1k", |b| {
        let queue = EventQueue::new();
        b.iter(|| {
            for i in 0..1000u32 {
                queue.push(tagged_event(priority_from(i as u8), i));
            }
            black_box(queue.drain());
        });
    });
}

criterion_group!(benches, bench_push_pop, bench_drain);
criterion_main!(benches);
