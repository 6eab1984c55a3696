use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use ringcast::Queue;
use std::hint;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

const ITEMS: u64 = 100_000;

/// Payload tiers, as written by real feeds.
type Small = u64;
type Medium = [u64; 8];

/// 512-byte payload.
#[derive(Clone, Copy)]
struct Large {
    values: [u64; 64],
}

impl Default for Large {
    fn default() -> Self {
        Self { values: [0; 64] }
    }
}

/// One SPSC pass: a consumer thread drains while the bench thread
/// writes `ITEMS` payloads built by `make`.
fn spsc_pass<T, const N: usize>(make: fn(u64) -> T)
where
    T: Clone + Default + Send + 'static,
{
    let queue = Queue::<T, N>::new();
    let mut writer = queue.create_writer().unwrap();
    let mut reader = queue.create_reader().unwrap();

    let consumer = thread::spawn(move || {
        for _ in 0..ITEMS {
            black_box(reader.read());
        }
    });

    for i in 0..ITEMS {
        writer.write(make(i));
    }
    consumer.join().unwrap();
}

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(ITEMS));

    // Throughput vs payload size at a fixed capacity.
    group.bench_function("small_cap1024", |b| {
        b.iter(|| spsc_pass::<Small, 1024>(|i| i));
    });
    group.bench_function("medium_cap1024", |b| {
        b.iter(|| spsc_pass::<Medium, 1024>(|i| [i; 8]));
    });
    group.bench_function("large_cap1024", |b| {
        b.iter(|| spsc_pass::<Large, 1024>(|i| Large { values: [i; 64] }));
    });

    // Throughput vs capacity for the small payload.
    group.bench_function("small_cap256", |b| {
        b.iter(|| spsc_pass::<Small, 256>(|i| i));
    });
    group.bench_function("small_cap4096", |b| {
        b.iter(|| spsc_pass::<Small, 4096>(|i| i));
    });
    group.bench_function("small_cap65536", |b| {
        b.iter(|| spsc_pass::<Small, 65536>(|i| i));
    });

    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout");

    for num_readers in [2usize, 4] {
        group.throughput(Throughput::Elements(ITEMS * num_readers as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("1W_{}R", num_readers)),
            &num_readers,
            |b, &n| {
                b.iter(|| {
                    let queue = Queue::<Small, 1024>::new();
                    let mut writer = queue.create_writer().unwrap();
                    let readers: Vec<_> =
                        (0..n).map(|_| queue.create_reader().unwrap()).collect();

                    let consumers: Vec<_> = readers
                        .into_iter()
                        .map(|mut reader| {
                            thread::spawn(move || {
                                for _ in 0..ITEMS {
                                    black_box(reader.read());
                                }
                            })
                        })
                        .collect();

                    for i in 0..ITEMS {
                        writer.write(i);
                    }
                    for consumer in consumers {
                        consumer.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_writer_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanin");

    // Constant total work split across the writers.
    for num_writers in [2usize, 4] {
        group.throughput(Throughput::Elements(ITEMS));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}W_1R", num_writers)),
            &num_writers,
            |b, &n| {
                b.iter(|| {
                    let per_writer = ITEMS / n as u64;
                    let queue = Queue::<Small, 4096>::new();
                    let mut reader = queue.create_reader().unwrap();
                    let writers: Vec<_> =
                        (0..n).map(|_| queue.create_writer().unwrap()).collect();

                    let producers: Vec<_> = writers
                        .into_iter()
                        .map(|mut writer| {
                            thread::spawn(move || {
                                for i in 0..per_writer {
                                    writer.write(i);
                                }
                            })
                        })
                        .collect();

                    for _ in 0..per_writer * n as u64 {
                        black_box(reader.read());
                    }
                    for producer in producers {
                        producer.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency");

    // Per-item round trip through one queue: the consumer runs
    // continuously and the bench thread waits for its write to be
    // consumed, so each iteration is one write-to-read hop.
    group.bench_function("write_to_read_cap1024", |b| {
        let queue = Queue::<Small, 1024>::new();
        let mut writer = queue.create_writer().unwrap();
        let mut reader = queue.create_reader().unwrap();

        let pending = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let pending_in_consumer = Arc::clone(&pending);
        let stop_in_consumer = Arc::clone(&stop);
        let consumer = thread::spawn(move || loop {
            while pending_in_consumer.load(Ordering::Acquire) == 0 {
                if stop_in_consumer.load(Ordering::Acquire) {
                    return;
                }
                hint::spin_loop();
            }
            black_box(reader.read());
            pending_in_consumer.fetch_sub(1, Ordering::Release);
        });

        b.iter(|| {
            pending.fetch_add(1, Ordering::Release);
            writer.write(7);
            while pending.load(Ordering::Acquire) > 0 {
                hint::spin_loop();
            }
        });

        stop.store(true, Ordering::Release);
        consumer.join().unwrap();
    });

    // True round-trip latency: request and response queues with an
    // echo server in between.
    group.bench_function("ping_pong_cap1024", |b| {
        const STOP: u64 = u64::MAX;

        let request = Queue::<Small, 1024>::new();
        let response = Queue::<Small, 1024>::new();
        let mut request_writer = request.create_writer().unwrap();
        let mut request_reader = request.create_reader().unwrap();
        let mut response_writer = response.create_writer().unwrap();
        let mut response_reader = response.create_reader().unwrap();

        let server = thread::spawn(move || loop {
            let value = request_reader.read();
            if value == STOP {
                return;
            }
            response_writer.write(value);
        });

        // Warm the path before measuring.
        for i in 0..1_000 {
            request_writer.write(i);
            black_box(response_reader.read());
        }

        b.iter(|| {
            request_writer.write(7);
            black_box(response_reader.read())
        });

        request_writer.write(STOP);
        server.join().unwrap();
    });

    group.finish();
}

fn bench_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst");

    // Burst write then drain, queue setup excluded from the timing.
    for burst in [64u64, 256, 512, 1024] {
        group.throughput(Throughput::Elements(burst));

        group.bench_with_input(BenchmarkId::from_parameter(burst), &burst, |b, &burst| {
            b.iter_batched(
                || {
                    let queue = Queue::<Small, 1024>::new();
                    let writer = queue.create_writer().unwrap();
                    let reader = queue.create_reader().unwrap();
                    (queue, writer, reader)
                },
                |(_queue, mut writer, mut reader)| {
                    for i in 0..burst {
                        writer.write(i);
                    }
                    for _ in 0..burst {
                        black_box(reader.read());
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_spsc,
    bench_fanout,
    bench_writer_contention,
    bench_latency,
    bench_burst
);
criterion_main!(benches);
