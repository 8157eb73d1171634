//! The initializer: normalizes output rows, writes input rows from their
//! probabilities, and builds the sentinel-terminated output index.

use std::f32::consts::PI;

use crate::descriptor::InstanceMut;
use crate::primitives::{nrm2, scal, zero};

/// Initializes one instance in place.
///
/// `perm` is a permutation of `{0, ..., n-2}` supplied by the caller (the
/// host layer owns randomization policy); it is shifted by +1 here to skip
/// the reserved truth variable at index 0.
///
/// Preconditions: `instance.v` already holds, for every output row, *some*
/// non-zero starting direction (the caller's randomized initialization) —
/// this function only renormalizes it. Input rows may hold arbitrary data in
/// component 1 before the call; only its *sign* is read, then the whole row
/// is overwritten.
pub fn init(instance: &mut InstanceMut<'_>, perm: &[usize]) {
    let n = instance.n;
    let k = instance.k;
    debug_assert_eq!(perm.len(), n - 1);

    for i in 0..n {
        let row = &mut instance.v[i * k..(i + 1) * k];
        if instance.is_input[i] {
            // Preserve the existing sign of component 1 before zeroing: it's
            // the only thing tying this input's phase to the initializer's
            // randomization, and the backward gradient in `dz` assembly
            // depends on it staying consistent (see the crate-level docs).
            let sign = if row.get(1).copied().unwrap_or(0.0) >= 0.0 { 1.0 } else { -1.0 };
            zero(row);
            row[0] = -(PI * instance.z[i]).cos();
            if k > 1 {
                row[1] = sign * (PI * instance.z[i]).sin();
            }
        } else {
            let norm = nrm2(row);
            debug_assert!(norm > 0.0, "output row {i} has zero norm before init");
            scal(row, 1.0 / norm);
        }
    }

    let mut pos = 0;
    for &p in perm {
        let var = p + 1;
        if !instance.is_input[var] {
            instance.index[pos] = var;
            pos += 1;
        }
    }
    for slot in &mut instance.index[pos..] {
        *slot = 0;
    }
}
