//! The forward driver: repeats the inner sweep until convergence or a
//! hard iteration cap, then maps the resulting unit vectors back to
//! probabilities.

use std::f32::consts::PI;

use log::{debug, trace};

use crate::config::SolverConfig;
use crate::descriptor::InstanceMut;
use crate::kernel::{self, Mode};
use crate::primitives::saturate;

/// Runs the forward solver on one instance, writing `z`, `v`, `w`, `gnrm`,
/// and `niter`.
///
/// `config` must already have passed [`SolverConfig::validate`]; this
/// function only `debug_assert!`s the contract, per §7 of the design
/// (construction-time validation is the caller's job, not the hot loop's).
pub fn forward(instance: &mut InstanceMut<'_>, config: &SolverConfig) {
    debug_assert!(config.max_iter >= 1);
    debug_assert!(config.eps > 0.0 && config.eps < 1.0);

    let k = instance.k;
    let mut cache = vec![0f32; k];
    let mut eps_prime = 0f32;
    let mut niter = 0usize;

    loop {
        let delta = kernel::sweep(
            instance.index,
            instance.s,
            instance.snrms,
            instance.n,
            instance.m,
            k,
            instance.v,
            instance.w,
            &mut cache,
            Mode::Forward { gnrm: instance.gnrm },
        );
        niter += 1;
        trace!("forward sweep {niter}: delta = {delta}");

        // Checking delta against eps_prime before (re)deriving eps_prime from
        // it catches the sweep that already found a fixed point (delta ==
        // 0.0, e.g. an all-input instance with no outputs to move), so niter
        // stops at 1 instead of running out the clock to max_iter.
        if delta <= eps_prime {
            break;
        }
        if niter == 1 {
            eps_prime = config.eps * delta;
        }
        if niter >= config.max_iter {
            break;
        }
    }

    *instance.niter = niter;
    debug!(
        "forward converged after {niter} sweeps (cap {}), converged = {}",
        config.max_iter,
        niter < config.max_iter
    );

    for &o in instance.index.iter() {
        if o == 0 {
            break;
        }
        let raw = instance.v[o * k];
        let clipped = saturate((raw + 1.0) / 2.0) * 2.0 - 1.0;
        instance.z[o] = saturate(1.0 - clipped.acos() / PI);
    }
}
