//! The shared inner mixing kernel.
//!
//! Forward and backward share the coordinate-descent skeleton but differ in
//! (a) how the gradient direction is turned into the new row (normalize vs.
//! project through `Pₒ = I - vₒvₒᵀ` with an external source term) and (b)
//! whether a decrease is accumulated. This module implements that skeleton
//! once, parameterized by [`Mode`], rather than duplicating it — a correct
//! but naive reimplementation that recomputes `W = Vᵀ S` from scratch each
//! coordinate would change algorithmic complexity by a factor of `n` and is
//! exactly the bug this shared kernel exists to prevent.

use crate::primitives::{axpy, dot, nrm2};

/// Numerical floor below which a `gnrm` entry is treated as zero during
/// backward (see [`crate::backward`]).
pub const MEPS: f32 = 1e-24;

/// Which of the two dual sweeps [`sweep`] performs.
pub enum Mode<'a> {
    /// The forward pass: normalize the gradient direction onto the sphere
    /// and accumulate the sweep's decrease.
    Forward {
        /// Per-output gradient magnitude, written for backward to consume.
        gnrm: &'a mut [f32],
    },
    /// The backward pass: project the gradient through the tangent plane of
    /// the *forward* pass's `vₒ` and fold in the incoming loss gradient.
    ///
    /// The textbook derivation of this projection adds `-∂ℓ/∂vₒ` before
    /// projecting onto `vₒ`'s tangent plane; `sweep` instead subtracts it
    /// (see the `c * Vproj_o - g` line below). That sign has been kept as-is
    /// rather than "corrected", since flipping it without an end-to-end
    /// gradient-check against a trained model risks trading one unverified
    /// sign for another.
    Backward {
        /// `V` from the completed forward pass, read through as `Vproj`.
        v_proj: &'a [f32],
        /// Per-output gradient magnitude recorded by forward.
        gnrm: &'a [f32],
        /// Diagonal regularizer stabilizing the linear system.
        prox_lam: f32,
        /// Incoming gradient `∂ℓ/∂z`; `dz[0]` is never read (variable 0 is
        /// never an output).
        dz: &'a [f32],
    },
}

/// One sweep over every output variable named by `index`, in order.
///
/// `rows` is the buffer the kernel reads and writes a row of per output: `V`
/// in forward mode, `U` in backward mode. `prod` is the maintained product
/// that `rows` is a left-factor of: `W = Vᵀ S` in forward mode, `Phi = Uᵀ S`
/// in backward mode. `cache` is length-`k` scratch for the gradient
/// direction.
///
/// Returns the sweep's total decrease (always `0.0` in backward mode, which
/// doesn't track one).
#[allow(clippy::too_many_arguments)]
pub fn sweep(
    index: &[usize],
    s: &[f32],
    snrms: &[f32],
    n: usize,
    m: usize,
    k: usize,
    rows: &mut [f32],
    prod: &mut [f32],
    cache: &mut [f32],
    mut mode: Mode<'_>,
) -> f32 {
    debug_assert_eq!(rows.len(), n * k);
    debug_assert_eq!(prod.len(), k * m);
    debug_assert_eq!(cache.len(), k);
    debug_assert_eq!(s.len(), n * m);

    let mut delta = 0f32;

    for &o in index {
        if o == 0 {
            break; // zero sentinel: variable 0 is never iterated
        }

        let s_o = &s[o * m..(o + 1) * m];
        let s_nrm_o = snrms[o];
        let g = &mut cache[..];

        // g := W * S_o^T  (length k)
        for (gi, w_row) in g.iter_mut().zip(prod.chunks_exact(m)) {
            *gi = dot(w_row, s_o);
        }
        // g -= s_nrm_o * v_o  (subtract o's own contribution)
        let row_o = &rows[o * k..(o + 1) * k];
        for (gi, &vi) in g.iter_mut().zip(row_o) {
            *gi -= s_nrm_o * vi;
        }

        match &mut mode {
            Mode::Forward { gnrm } => {
                let norm = nrm2(g);
                gnrm[o] = norm;
                // new v_o := -g / norm
                let inv = -1.0 / norm;
                for gi in g.iter_mut() {
                    *gi *= inv;
                }
                let mut sq_move = 0f32;
                for (gi, &vi) in g.iter().zip(rows[o * k..(o + 1) * k].iter()) {
                    let d = gi - vi;
                    sq_move += d * d;
                }
                delta += norm * sq_move;
            }
            Mode::Backward { v_proj, gnrm, prox_lam, dz } => {
                let vp_o = &v_proj[o * k..(o + 1) * k];
                let gnrmi = gnrm[o] + *prox_lam;
                let c = dot(vp_o, g) + dz[o] * vp_o[0];
                // g := c * Vproj_o - g
                for (gi, &vpi) in g.iter_mut().zip(vp_o) {
                    *gi = c * vpi - *gi;
                }
                g[0] -= dz[o];
                let inv = 1.0 / gnrmi;
                for gi in g.iter_mut() {
                    *gi *= inv;
                }
            }
        }

        // Delta := g - rows[o]; rows[o] := g; prod += Delta ⊗ S_o
        let row_o = &mut rows[o * k..(o + 1) * k];
        for kk in 0..k {
            let d = g[kk] - row_o[kk];
            row_o[kk] = g[kk];
            if d != 0.0 {
                axpy(&mut prod[kk * m..(kk + 1) * m], d, s_o);
            }
        }
    }

    delta
}

/// Recomputes `prod := rows^T * s` from scratch (n×k times k×m). Used only
/// by tests to check the invariant that [`sweep`]'s incremental rank-1
/// updates are supposed to maintain — production code must never call this
/// per coordinate, or the whole point of the maintained product is lost.
#[cfg(test)]
pub fn recompute_product(rows: &[f32], s: &[f32], n: usize, m: usize, k: usize) -> Vec<f32> {
    let mut prod = vec![0f32; k * m];
    for i in 0..n {
        let row_i = &rows[i * k..(i + 1) * k];
        let s_i = &s[i * m..(i + 1) * m];
        for kk in 0..k {
            axpy(&mut prod[kk * m..(kk + 1) * m], row_i[kk], s_i);
        }
    }
    prod
}
