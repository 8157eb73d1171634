use mixsat_core::{backward_batch, forward_batch, init_batch, BackwardBuffers, Descriptor, Dims, SolverConfig};

fn two_instance_batch() -> Descriptor {
    let n = 4;
    let m = 4;
    let k = 4;
    let b = 2;
    let mut s = vec![0f32; n * m];
    s[0 * m] = 1.0;
    s[1 * m + 1] = 1.0;
    s[2 * m + 2] = 1.0;
    s[3 * m + 1] = 0.6;
    s[3 * m + 2] = 0.6;
    s[3 * m + 3] = 0.5;
    let snrms: Vec<f32> = (0..n).map(|i| s[i * m..(i + 1) * m].iter().map(|x| x * x).sum()).collect();
    let is_input = vec![true, true, true, false, true, true, true, false];
    let z = vec![1.0, 0.25, 0.75, 0.0, 1.0, 0.9, 0.1, 0.0];
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

fn single_instance(desc: &Descriptor, i: usize) -> Descriptor {
    let n = desc.dims.n;
    let m = desc.dims.m;
    let k = desc.dims.k;
    Descriptor::new(
        Dims { b: 1, n, m, k },
        desc.s.clone(),
        desc.snrms.clone(),
        desc.is_input[i * n..(i + 1) * n].to_vec(),
        desc.z[i * n..(i + 1) * n].to_vec(),
        desc.v[i * n * k..(i + 1) * n * k].to_vec(),
        vec![0.0; k * m],
        vec![0.0; n],
        vec![0; 1],
        vec![0; n],
    )
    .unwrap()
}

#[test]
fn batch_run_matches_individual_runs() {
    let perm = vec![0usize, 1, 2, 2, 0, 1];
    let cfg = SolverConfig::default();

    let mut batched = two_instance_batch();
    init_batch(&mut batched, &perm);
    forward_batch(&mut batched, &cfg);

    let unbatched = two_instance_batch();
    for i in 0..2 {
        let mut solo = single_instance(&unbatched, i);
        init_batch(&mut solo, &perm[i * 3..(i + 1) * 3]);
        forward_batch(&mut solo, &cfg);

        let n = batched.dims.n;
        let k = batched.dims.k;
        assert_eq!(&batched.z[i * n..(i + 1) * n], solo.z.as_slice());
        assert_eq!(&batched.v[i * n * k..(i + 1) * n * k], solo.v.as_slice());
    }
}

#[test]
fn full_batch_forward_and_backward_produce_finite_results() {
    let perm = vec![0usize, 1, 2, 1, 2, 0];
    let cfg = SolverConfig::default();

    let mut desc = two_instance_batch();
    init_batch(&mut desc, &perm);
    forward_batch(&mut desc, &cfg);

    assert!(desc.z.iter().all(|x| x.is_finite()));
    assert!(desc.v.iter().all(|x| (x.is_finite())));

    let dims = desc.dims;
    let mut bufs = BackwardBuffers::new(
        dims,
        vec![0.3; dims.b * dims.n],
        vec![0.0; dims.b * dims.n * dims.k],
        vec![0.0; dims.b * dims.k * dims.m],
        vec![0.0; dims.b * dims.n * dims.m],
        vec![0.0; dims.b * dims.k],
    )
    .unwrap();
    backward_batch(&desc, &mut bufs, &cfg);

    assert!(bufs.dz.iter().all(|x| x.is_finite()));
    assert!(bufs.ds.iter().all(|x| x.is_finite()));
}
