//! The backward driver: runs the adjoint sweeps and assembles `dS` and `dz`
//! from the completed forward pass.

use std::f32::consts::PI;

use log::warn;

use crate::config::SolverConfig;
use crate::descriptor::BackwardInstance;
use crate::kernel::{self, Mode, MEPS};
use crate::primitives::{axpy, dot, zero};

/// Runs the backward solver on one instance, transforming `dz` in place and
/// accumulating into `ds`.
///
/// Preconditions: `instance` was produced by [`crate::descriptor::BackwardBuffers::instances_mut`]
/// paired with a `Descriptor` that already went through `init` and `forward`
/// (`v`, `w`, `gnrm`, `niter` are read as the completed forward pass's
/// results). `config` must already have passed [`SolverConfig::validate`].
pub fn backward(instance: &mut BackwardInstance<'_>, config: &SolverConfig) {
    debug_assert!(config.prox_lam >= 0.0);

    let n = instance.n;
    let m = instance.m;
    let k = instance.k;

    // Step 1: transform dz in place for every variable but the reserved
    // truth direction (dz[o] enters holding dl/dz[o] for outputs; the
    // transform also runs over inputs here even though step 5 overwrites
    // their entries, because it's this division that surfaces an input
    // sitting exactly on the z=0/1 boundary as a non-finite value).
    let mut degenerate = false;
    for o in 1..n {
        let s = (PI * instance.z[o]).sin();
        instance.dz[o] /= PI * s;
        if !instance.dz[o].is_finite() {
            degenerate = true;
        }
    }
    for &o in instance.index.iter() {
        if o == 0 {
            break;
        }
        if instance.gnrm[o] < MEPS {
            degenerate = true;
        }
    }
    if degenerate {
        warn!("backward: degenerate instance (boundary probability or collapsed gradient), zeroing dz");
        zero(instance.dz);
        return;
    }

    // Step 2: adjoint sweeps, exactly niter of them, using v as Vproj.
    zero(instance.u);
    zero(instance.phi);
    for _ in 0..instance.niter {
        kernel::sweep(
            instance.index,
            instance.s,
            instance.snrms,
            n,
            m,
            k,
            instance.u,
            instance.phi,
            instance.cache,
            Mode::Backward {
                v_proj: instance.v,
                gnrm: instance.gnrm,
                prox_lam: config.prox_lam,
                dz: instance.dz,
            },
        );
    }

    // Step 3: sanity check on u.
    if instance.u.iter().any(|x| !x.is_finite()) {
        warn!("backward: non-finite adjoint variable after sweeps, zeroing dz");
        zero(instance.dz);
        return;
    }

    // Step 4: dS assembly, two rank-1 updates per row.
    for i in 0..n {
        let ds_i = &mut instance.ds[i * m..(i + 1) * m];
        let u_i = &instance.u[i * k..(i + 1) * k];
        let v_i = &instance.v[i * k..(i + 1) * k];
        for kk in 0..k {
            if u_i[kk] != 0.0 {
                axpy(ds_i, u_i[kk], &instance.w[kk * m..(kk + 1) * m]);
            }
            if v_i[kk] != 0.0 {
                axpy(ds_i, v_i[kk], &instance.phi[kk * m..(kk + 1) * m]);
            }
        }
    }

    // Step 5: dz assembly. Inputs get the gradient; outputs are zeroed.
    let phi_row0 = instance.phi[0..m].to_vec();
    let phi_row1 = instance.phi[m..2 * m].to_vec();
    for i in 0..n {
        if !instance.is_input[i] || i == 0 {
            instance.dz[i] = 0.0;
            continue;
        }
        let s_i = &instance.s[i * m..(i + 1) * m];
        let val1 = dot(s_i, &phi_row0);
        let val2 = dot(s_i, &phi_row1);
        let sign = if instance.v[i * k + 1] >= 0.0 { 1.0 } else { -1.0 };
        let zi = instance.z[i];
        instance.dz[i] = (instance.dz[i] + val1) * (PI * zi).sin() * PI
            + val2 * sign * (PI * zi).cos() * PI * PI;
    }
}
