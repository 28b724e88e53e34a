use criterion::{black_box, Criterion, criterion_group, criterion_main};
use morkit::{DenseVectorArray, GramSchmidtOptions, Indices, PodOptions, gram_schmidt_copy, pod};

fn snapshots(dim: usize, len: usize) -> DenseVectorArray<f64> {
    let data: Vec<f64> = (0..dim * len).map(|i| ((i * 7 + 3) as f64).sin()).collect();
    DenseVectorArray::from_data(dim, data).unwrap()
}

fn bench_basis_generation(c: &mut Criterion) {
    let a = snapshots(2000, 40);

    c.bench_function("gram_schmidt 2000x40", |ben| {
        let opts = GramSchmidtOptions::default();
        ben.iter(|| {
            let _q = gram_schmidt_copy(black_box(&a), None, &opts).unwrap();
        })
    });

    c.bench_function("pod 2000x40", |ben| {
        let opts = PodOptions::default();
        ben.iter(|| {
            let _modes = pod(black_box(&a), None, &opts).unwrap();
        })
    });

    c.bench_function("gramian 2000x40", |ben| {
        ben.iter(|| {
            let _g = black_box(&a).gramian(&Indices::All).unwrap();
        })
    });
}

criterion_group!(benches, bench_basis_generation);
criterion_main!(benches);
