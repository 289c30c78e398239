use bitrec::field::Field;
use bitrec::link::FieldLink;
use bitrec::stream::BitStream;
use criterion::{criterion_group, criterion_main, Criterion};

fn gen_link(field_count: usize) -> FieldLink {
    let mut link = FieldLink::new();

    for i in 0..field_count {
        // Deterministic but non-trivial values, with some zeros for the
        // short encoding path.
        link.add(Field::u32((i as u32).wrapping_mul(2_654_435_761) % 5));
    }

    link
}

fn bench_serialize(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let link = gen_link(field_count);
        let mut stream = BitStream::with_capacity(link.need_total_size());

        c.bench_function(&format!("serialize_{}_fields", field_count), |b| {
            b.iter(|| {
                stream.reset();
                link.serialize(&mut stream).unwrap();
            })
        });
    }
}

fn bench_deserialize(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let link = gen_link(field_count);
        let mut stream = BitStream::with_capacity(link.need_total_size());
        link.serialize(&mut stream).unwrap();
        let mut target = gen_link(field_count);

        c.bench_function(&format!("deserialize_{}_fields", field_count), |b| {
            b.iter(|| {
                stream.reset();
                target.deserialize(&mut stream).unwrap();
            })
        });
    }
}

fn bench_zero_delta(c: &mut Criterion) {
    for &field_count in &[10usize, 100] {
        let link = gen_link(field_count);
        let base = link.clone();
        let mut stream = BitStream::with_capacity(link.need_total_size());

        c.bench_function(&format!("zero_delta_{}_fields", field_count), |b| {
            b.iter(|| {
                stream.reset();
                link.serialize_diff(&mut stream, &base).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_serialize, bench_deserialize, bench_zero_delta);
criterion_main!(benches);
