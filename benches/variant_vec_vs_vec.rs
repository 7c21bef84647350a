extern crate criterion;
use self::criterion::*;
use varicell::{catalog, Variant, VariantVec};

type Benchy = catalog![(usize, usize), u32, u8, char, bool, f64];

fn vec(c: &mut Criterion) {
    // Setup (construct data, allocate memory, etc)
    let mut vec = Vec::with_capacity(5);
    c.bench_function("vec", |b| {
        b.iter(|| {
            vec.push(black_box(Variant::<Benchy>::new((1usize, 2usize))));
            vec.push(black_box(Variant::new(3u32)));
            vec.push(black_box(Variant::new('x')));
            vec.push(black_box(Variant::new(true)));
            vec.push(black_box(Variant::new(1.0f64)));
            vec.clear();
        })
    });
}

fn variant_vec(c: &mut Criterion) {
    // Setup (construct data, allocate memory, etc)
    let mut vv = VariantVec::with_capacity(5);
    c.bench_function("variant_vec", |b| {
        b.iter(|| {
            vv.push(black_box(Variant::<Benchy>::new((1usize, 2usize))));
            vv.push(black_box(Variant::new(3u32)));
            vv.push(black_box(Variant::new('x')));
            vv.push(black_box(Variant::new(true)));
            vv.push(black_box(Variant::new(1.0f64)));
            vv.clear();
        })
    });
}

fn lookup(c: &mut Criterion) {
    let vv: VariantVec<Benchy> = (0..1024).map(|i| Variant::new(i as u32)).collect();
    c.bench_function("variant_vec_get", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for i in 0..vv.len() {
                sum = sum.wrapping_add(*vv.get::<u32, _>(black_box(i)).unwrap_or(&0));
            }
            sum
        })
    });
}

criterion_group!(benches, vec, variant_vec, lookup);
criterion_main!(benches);
