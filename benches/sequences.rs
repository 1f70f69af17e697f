//! Vec, VecDeque and LinkedList under the same access patterns.

use std::collections::{LinkedList, VecDeque};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dynarray::DynamicArray;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const OPS: usize = 100_000;
const SIZE: usize = 50_000;
const MIDDLE_OPS: usize = OPS / 10;

fn double_ended(c: &mut Criterion) {
    let mut group = c.benchmark_group("double ended");
    group.sample_size(10);

    group.bench_function(BenchmarkId::new("deque", OPS), |b| {
        b.iter(|| {
            let mut dq = VecDeque::new();
            for i in 0..OPS {
                if i % 2 == 0 {
                    dq.push_back(i);
                } else {
                    dq.push_front(i);
                }
            }
            for _ in 0..OPS / 2 {
                black_box(dq.pop_back());
                black_box(dq.pop_front());
            }
        });
    });

    // front operations shift every element
    group.bench_function(BenchmarkId::new("vec", OPS), |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..OPS {
                if i % 2 == 0 {
                    vec.push(i);
                } else {
                    vec.insert(0, i);
                }
            }
            for _ in 0..OPS / 2 {
                black_box(vec.pop());
                black_box(vec.remove(0));
            }
        });
    });

    group.bench_function(BenchmarkId::new("list", OPS), |b| {
        b.iter(|| {
            let mut lst = LinkedList::new();
            for i in 0..OPS {
                if i % 2 == 0 {
                    lst.push_back(i);
                } else {
                    lst.push_front(i);
                }
            }
            for _ in 0..OPS / 2 {
                black_box(lst.pop_back());
                black_box(lst.pop_front());
            }
        });
    });

    group.finish();
}

fn random_access(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let indices: Vec<usize> = (0..SIZE).map(|_| rng.random_range(0..SIZE)).collect();

    let dq: VecDeque<i32> = (0..SIZE as i32).collect();
    let vec: Vec<i32> = (0..SIZE as i32).collect();
    let arr: DynamicArray<i32> = (0..SIZE as i32).collect();
    let lst: LinkedList<i32> = (0..SIZE as i32).collect();

    let mut group = c.benchmark_group("random access");

    group.bench_function(BenchmarkId::new("deque", SIZE), |b| {
        b.iter(|| {
            for &ix in &indices {
                black_box(dq[ix]);
            }
        });
    });

    group.bench_function(BenchmarkId::new("vec", SIZE), |b| {
        b.iter(|| {
            for &ix in &indices {
                black_box(vec[ix]);
            }
        });
    });

    group.bench_function(BenchmarkId::new("dynarray", SIZE), |b| {
        b.iter(|| {
            for &ix in &indices {
                black_box(arr[ix]);
            }
        });
    });

    // every lookup walks the list from the front
    group.sample_size(10);
    group.bench_function(BenchmarkId::new("list", SIZE), |b| {
        b.iter(|| {
            for &ix in &indices {
                black_box(lst.iter().nth(ix));
            }
        });
    });

    group.finish();
}

fn middle_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("middle insert erase");
    group.sample_size(10);

    group.bench_function(BenchmarkId::new("deque", MIDDLE_OPS), |b| {
        b.iter(|| {
            let mut dq: VecDeque<usize> = VecDeque::from(vec![0; SIZE / 2]);
            let mid = dq.len() / 2;
            for i in 0..MIDDLE_OPS {
                dq.insert(mid, i);
                if i % 3 == 0 {
                    black_box(dq.remove(mid));
                }
            }
            dq
        });
    });

    group.bench_function(BenchmarkId::new("vec", MIDDLE_OPS), |b| {
        b.iter(|| {
            let mut vec = vec![0usize; SIZE / 2];
            let mid = vec.len() / 2;
            for i in 0..MIDDLE_OPS {
                vec.insert(mid, i);
                if i % 3 == 0 {
                    black_box(vec.remove(mid));
                }
            }
            vec
        });
    });

    // the split point acts as a cursor parked in the middle
    group.bench_function(BenchmarkId::new("list", MIDDLE_OPS), |b| {
        b.iter(|| {
            let mut lst: LinkedList<usize> = std::iter::repeat_n(0, SIZE / 2).collect();
            let mut tail = lst.split_off(lst.len() / 2);
            for i in 0..MIDDLE_OPS {
                tail.push_front(i);
                if i % 3 == 0 {
                    black_box(tail.pop_front());
                }
            }
            lst.append(&mut tail);
            lst
        });
    });

    group.finish();
}

criterion_group!(benches, double_ended, random_access, middle_operations);
criterion_main!(benches);
