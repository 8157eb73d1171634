use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mixsat_core::{backward_batch, forward_batch, init_batch, BackwardBuffers, Descriptor, Dims, SolverConfig};

fn xor_batch(b: usize) -> Descriptor {
    let n = 4;
    let m = 4;
    let k = 4;
    let mut s = vec![0f32; n * m];
    s[0 * m] = 1.0;
    s[1 * m + 1] = 1.0;
    s[2 * m + 2] = 1.0;
    s[3 * m + 1] = 0.6;
    s[3 * m + 2] = 0.6;
    s[3 * m + 3] = 0.5;
    let snrms: Vec<f32> = (0..n).map(|i| s[i * m..(i + 1) * m].iter().map(|x| x * x).sum()).collect();
    let is_input: Vec<bool> = (0..b).flat_map(|_| vec![true, true, true, false]).collect();
    let z: Vec<f32> = (0..b).flat_map(|_| vec![1.0, 0.3, 0.6, 0.0]).collect();
    let mut v = vec![0f32; b * n * k];
    for i in 0..b * n {
        v[i * k] = 1.0;
    }
    Descriptor::new(
        Dims { b, n, m, k },
        s,
        snrms,
        is_input,
        z,
        v,
        vec![0.0; b * k * m],
        vec![0.0; b * n],
        vec![0; b],
        vec![0; b * n],
    )
    .unwrap()
}

fn forward_bench(c: &mut Criterion) {
    let _ = env_logger::try_init();
    let mut group = c.benchmark_group("forward_batch");
    for b in [8usize, 64, 512] {
        let perm: Vec<usize> = (0..b).flat_map(|_| vec![0usize, 1, 2]).collect();
        let cfg = SolverConfig::default();
        group.bench_function(format!("xor/b={b}"), |bench| {
            bench.iter(|| {
                let mut desc = xor_batch(b);
                init_batch(&mut desc, &perm);
                forward_batch(&mut desc, &cfg);
                black_box(&desc.z);
            });
        });
    }
    group.finish();
}

fn forward_and_backward_bench(c: &mut Criterion) {
    let _ = env_logger::try_init();
    let mut group = c.benchmark_group("forward_and_backward_batch");
    for b in [8usize, 64, 512] {
        let perm: Vec<usize> = (0..b).flat_map(|_| vec![0usize, 1, 2]).collect();
        let cfg = SolverConfig::default();
        group.bench_function(format!("xor/b={b}"), |bench| {
            bench.iter(|| {
                let mut desc = xor_batch(b);
                init_batch(&mut desc, &perm);
                forward_batch(&mut desc, &cfg);

                let dims = desc.dims;
                let mut bufs = BackwardBuffers::new(
                    dims,
                    vec![0.1; dims.b * dims.n],
                    vec![0.0; dims.b * dims.n * dims.k],
                    vec![0.0; dims.b * dims.k * dims.m],
                    vec![0.0; dims.b * dims.n * dims.m],
                    vec![0.0; dims.b * dims.k],
                )
                .unwrap();
                backward_batch(&desc, &mut bufs, &cfg);
                black_box(&bufs.dz);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, forward_bench, forward_and_backward_bench);
criterion_main!(benches);
