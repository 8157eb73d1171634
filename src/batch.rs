//! The batch launcher: drives `init`/`forward`/`backward` across every
//! instance in a batch on a `rayon` work-stealing pool.

use log::info;
use rayon::prelude::*;

use crate::config::SolverConfig;
use crate::descriptor::{BackwardBuffers, Descriptor};
use crate::{backward, forward, init};

/// Initializes every instance in `desc` in parallel.
///
/// `perm` is a flat, length `b·(n-1)` array of per-instance permutations of
/// `{0, ..., n-2}`; instance `i` reads `perm[i*(n-1)..(i+1)*(n-1)]`.
pub fn init_batch(desc: &mut Descriptor, perm: &[usize]) {
    let n = desc.dims.n;
    let b = desc.dims.b;
    debug_assert_eq!(perm.len(), b * (n - 1));
    info!("init_batch: {b} instances, n={n}, {} threads", rayon::current_num_threads());

    desc.instances_mut().zip(perm.par_chunks(n - 1)).for_each(|(mut instance, p)| {
        init::init(&mut instance, p);
    });
}

/// Runs the forward solver on every instance in `desc` in parallel.
pub fn forward_batch(desc: &mut Descriptor, config: &SolverConfig) {
    debug_assert!(config.validate().is_ok());
    info!("forward_batch: {} instances, {} threads", desc.dims.b, rayon::current_num_threads());

    desc.instances_mut().for_each(|mut instance| {
        forward::forward(&mut instance, config);
    });
}

/// Runs the backward solver on every instance in parallel, pairing `desc`'s
/// completed forward results with `bufs`.
pub fn backward_batch(desc: &Descriptor, bufs: &mut BackwardBuffers, config: &SolverConfig) {
    debug_assert!(config.validate().is_ok());
    info!("backward_batch: {} instances, {} threads", desc.dims.b, rayon::current_num_threads());

    bufs.instances_mut(desc).for_each(|mut instance| {
        backward::backward(&mut instance, config);
    });
}
