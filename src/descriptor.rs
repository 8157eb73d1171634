//! The data model: problem dimensions, caller-owned buffers, and the
//! per-instance views the drivers and batch launcher operate on.

use rayon::prelude::*;

use crate::error::DescriptorError;

/// Problem dimensions shared by every instance in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    /// Batch size.
    pub b: usize,
    /// Number of variables, including the reserved truth variable at index 0.
    pub n: usize,
    /// Rank of the clause matrix.
    pub m: usize,
    /// Embedding dimension of the unit-sphere relaxation.
    pub k: usize,
}

impl Dims {
    fn check(&self) -> Result<(), DescriptorError> {
        if self.b == 0 {
            return Err(DescriptorError::EmptyBatch);
        }
        if self.m % 4 != 0 {
            return Err(DescriptorError::NotMultipleOfFour { name: "m", value: self.m });
        }
        if self.k % 4 != 0 {
            return Err(DescriptorError::NotMultipleOfFour { name: "k", value: self.k });
        }
        Ok(())
    }

    fn check_len(&self, name: &'static str, actual: usize, expected: usize) -> Result<(), DescriptorError> {
        if actual != expected {
            return Err(DescriptorError::LengthMismatch { name, expected, actual });
        }
        Ok(())
    }
}

/// A batch of problem instances: the low-rank clause matrix (shared across
/// the batch) plus every per-instance buffer `init`/`forward`/`backward`
/// read and write.
///
/// Caller-owned: construct with [`Descriptor::new`] once per batch shape and
/// reuse across `init`/`forward`/`backward` calls. The core never allocates
/// or resizes these buffers.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// The dimensions this descriptor was validated against.
    pub dims: Dims,
    /// n × m, shared across the batch. Row `i` is variable `i`'s coefficient
    /// vector.
    pub s: Vec<f32>,
    /// length n, shared across the batch: per-row squared norm of `s`.
    pub snrms: Vec<f32>,
    /// length b·n: which variables are fixed inputs, per instance.
    ///
    /// By convention variable 0 (the reserved truth variable) is always an
    /// input, with `z[0] = 1.0`: `init` has no special case for index 0, so
    /// it relies on this to reproduce the fixed `(1, 0, ..., 0)` embedding
    /// through the ordinary input-row formula.
    pub is_input: Vec<bool>,
    /// length b·n: probability vector in `[0, 1]`.
    pub z: Vec<f32>,
    /// length b·n·k: unit-sphere relaxation.
    pub v: Vec<f32>,
    /// length b·k·m: running product `Vᵀ S`.
    pub w: Vec<f32>,
    /// length b·n: per-output gradient magnitude from the last forward sweep.
    pub gnrm: Vec<f32>,
    /// length b: forward sweep count, consumed by backward.
    pub niter: Vec<usize>,
    /// length b·n: zero-terminated permutation of output-variable indices.
    pub index: Vec<usize>,
}

impl Descriptor {
    /// Validates every buffer's length against `dims` and assembles a
    /// `Descriptor`. This is the one place shape mistakes are caught with a
    /// message instead of a `debug_assert!` deep inside the hot loop.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dims: Dims,
        s: Vec<f32>,
        snrms: Vec<f32>,
        is_input: Vec<bool>,
        z: Vec<f32>,
        v: Vec<f32>,
        w: Vec<f32>,
        gnrm: Vec<f32>,
        niter: Vec<usize>,
        index: Vec<usize>,
    ) -> Result<Self, DescriptorError> {
        dims.check()?;
        let Dims { b, n, m, k } = dims;
        dims.check_len("s", s.len(), n * m)?;
        dims.check_len("snrms", snrms.len(), n)?;
        dims.check_len("is_input", is_input.len(), b * n)?;
        dims.check_len("z", z.len(), b * n)?;
        dims.check_len("v", v.len(), b * n * k)?;
        dims.check_len("w", w.len(), b * k * m)?;
        dims.check_len("gnrm", gnrm.len(), b * n)?;
        dims.check_len("niter", niter.len(), b)?;
        dims.check_len("index", index.len(), b * n)?;
        Ok(Descriptor { dims, s, snrms, is_input, z, v, w, gnrm, niter, index })
    }

    /// A parallel, indexed view over each instance's disjoint slice of every
    /// per-instance buffer. The batch launcher drives this with `for_each`;
    /// nothing stops a caller from driving it sequentially with `.collect()`
    /// followed by a plain loop, which is exactly what the single-instance
    /// test helpers do.
    pub fn instances_mut(&mut self) -> impl IndexedParallelIterator<Item = InstanceMut<'_>> {
        let Dims { n, m, k, .. } = self.dims;
        let s: &[f32] = &self.s;
        let snrms: &[f32] = &self.snrms;
        self.is_input
            .par_chunks_mut(n)
            .zip(self.z.par_chunks_mut(n))
            .zip(self.v.par_chunks_mut(n * k))
            .zip(self.w.par_chunks_mut(k * m))
            .zip(self.gnrm.par_chunks_mut(n))
            .zip(self.niter.par_chunks_mut(1))
            .zip(self.index.par_chunks_mut(n))
            .map(move |((((((is_input, z), v), w), gnrm), niter), index)| InstanceMut {
                n,
                m,
                k,
                s,
                snrms,
                is_input,
                z,
                v,
                w,
                gnrm,
                niter: &mut niter[0],
                index,
            })
    }
}

/// Backward-only buffers, paired 1:1 with a [`Descriptor`]'s batch shape.
#[derive(Debug, Clone)]
pub struct BackwardBuffers {
    /// length b·n: incoming gradient `∂ℓ/∂z` on entry, outgoing on return.
    pub dz: Vec<f32>,
    /// length b·n·k: adjoint variable dual to `v`.
    pub u: Vec<f32>,
    /// length b·k·m: adjoint dual to `w`, invariant `Phi = Uᵀ S`.
    pub phi: Vec<f32>,
    /// length b·n·m: gradient `∂ℓ/∂S` being accumulated.
    pub ds: Vec<f32>,
    /// length b·k: per-instance scratch.
    pub cache: Vec<f32>,
}

impl BackwardBuffers {
    /// Validates every buffer's length against `dims` and assembles the
    /// bundle.
    pub fn new(
        dims: Dims,
        dz: Vec<f32>,
        u: Vec<f32>,
        phi: Vec<f32>,
        ds: Vec<f32>,
        cache: Vec<f32>,
    ) -> Result<Self, DescriptorError> {
        dims.check()?;
        let Dims { b, n, m, k } = dims;
        dims.check_len("dz", dz.len(), b * n)?;
        dims.check_len("u", u.len(), b * n * k)?;
        dims.check_len("phi", phi.len(), b * k * m)?;
        dims.check_len("ds", ds.len(), b * n * m)?;
        dims.check_len("cache", cache.len(), b * k)?;
        Ok(BackwardBuffers { dz, u, phi, ds, cache })
    }

    /// A parallel, indexed view pairing each instance's backward buffers
    /// with the matching read-only slice of `desc`'s forward results.
    ///
    /// Panics (via `debug_assert!`) if `desc.dims != dims` this bundle was
    /// validated against; the two are always constructed from the same
    /// [`Dims`] value by a well-behaved caller.
    pub fn instances_mut<'a>(
        &'a mut self,
        desc: &'a Descriptor,
    ) -> impl IndexedParallelIterator<Item = BackwardInstance<'a>> {
        debug_assert_eq!(desc.is_input.len(), desc.dims.n * desc.dims.b);
        let Dims { n, m, k, .. } = desc.dims;
        let s: &[f32] = &desc.s;
        let snrms: &[f32] = &desc.snrms;
        desc.is_input
            .par_chunks(n)
            .zip(desc.z.par_chunks(n))
            .zip(desc.v.par_chunks(n * k))
            .zip(desc.w.par_chunks(k * m))
            .zip(desc.gnrm.par_chunks(n))
            .zip(desc.niter.par_chunks(1))
            .zip(self.dz.par_chunks_mut(n))
            .zip(self.u.par_chunks_mut(n * k))
            .zip(self.phi.par_chunks_mut(k * m))
            .zip(self.ds.par_chunks_mut(n * m))
            .zip(self.cache.par_chunks_mut(k))
            .map(
                move |(
                    (
                        (
                            (((((((is_input, z), v), w), gnrm), niter), dz), u),
                            phi,
                        ),
                        ds,
                    ),
                    cache,
                )| BackwardInstance {
                    n,
                    m,
                    k,
                    s,
                    snrms,
                    is_input,
                    z,
                    v,
                    w,
                    gnrm,
                    niter: niter[0],
                    dz,
                    u,
                    phi,
                    ds,
                    cache,
                },
            )
    }
}

/// One instance's view into a [`Descriptor`], consumed by `init` and the
/// forward driver.
pub struct InstanceMut<'a> {
    /// Number of variables.
    pub n: usize,
    /// Clause matrix rank.
    pub m: usize,
    /// Embedding dimension.
    pub k: usize,
    /// Shared clause matrix, n × m.
    pub s: &'a [f32],
    /// Shared per-row squared norm of `s`.
    pub snrms: &'a [f32],
    /// Per-instance: which variables are fixed inputs.
    pub is_input: &'a mut [bool],
    /// Per-instance probability vector.
    pub z: &'a mut [f32],
    /// Per-instance unit-sphere relaxation, n × k.
    pub v: &'a mut [f32],
    /// Per-instance running product `Vᵀ S`, k × m.
    pub w: &'a mut [f32],
    /// Per-instance per-output gradient magnitude.
    pub gnrm: &'a mut [f32],
    /// Forward sweep count for this instance.
    pub niter: &'a mut usize,
    /// Per-instance zero-terminated permutation of output variable indices.
    pub index: &'a mut [usize],
}

/// One instance's view pairing backward buffers with the forward results
/// they're derived from.
pub struct BackwardInstance<'a> {
    /// Number of variables.
    pub n: usize,
    /// Clause matrix rank.
    pub m: usize,
    /// Embedding dimension.
    pub k: usize,
    /// Shared clause matrix, n × m.
    pub s: &'a [f32],
    /// Shared per-row squared norm of `s`.
    pub snrms: &'a [f32],
    /// Per-instance: which variables are fixed inputs.
    pub is_input: &'a [bool],
    /// Per-instance probability vector from forward.
    pub z: &'a [f32],
    /// Per-instance unit-sphere relaxation from forward (read as `Vproj`).
    pub v: &'a [f32],
    /// Per-instance running product from forward.
    pub w: &'a [f32],
    /// Per-instance per-output gradient magnitude from forward.
    pub gnrm: &'a [f32],
    /// Forward sweep count for this instance.
    pub niter: usize,
    /// Incoming gradient on entry, outgoing on return.
    pub dz: &'a mut [f32],
    /// Adjoint variable dual to `v`, n × k.
    pub u: &'a mut [f32],
    /// Adjoint dual to `w`, k × m.
    pub phi: &'a mut [f32],
    /// Gradient w.r.t. the clause matrix being accumulated, n × m.
    pub ds: &'a mut [f32],
    /// Scratch, length k.
    pub cache: &'a mut [f32],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dims() -> Dims {
        Dims { b: 2, n: 4, m: 4, k: 4 }
    }

    #[test]
    fn new_accepts_correctly_shaped_buffers() {
        let dims = small_dims();
        let d = Descriptor::new(
            dims,
            vec![0.0; dims.n * dims.m],
            vec![0.0; dims.n],
            vec![false; dims.b * dims.n],
            vec![0.0; dims.b * dims.n],
            vec![0.0; dims.b * dims.n * dims.k],
            vec![0.0; dims.b * dims.k * dims.m],
            vec![0.0; dims.b * dims.n],
            vec![0; dims.b],
            vec![0; dims.b * dims.n],
        );
        assert!(d.is_ok());
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let dims = small_dims();
        let d = Descriptor::new(
            dims,
            vec![0.0; dims.n * dims.m],
            vec![0.0; dims.n],
            vec![false; dims.b * dims.n],
            vec![0.0; dims.b * dims.n + 1], // wrong
            vec![0.0; dims.b * dims.n * dims.k],
            vec![0.0; dims.b * dims.k * dims.m],
            vec![0.0; dims.b * dims.n],
            vec![0; dims.b],
            vec![0; dims.b * dims.n],
        );
        assert!(matches!(d, Err(DescriptorError::LengthMismatch { name: "z", .. })));
    }

    #[test]
    fn new_rejects_non_multiple_of_four() {
        let dims = Dims { b: 1, n: 4, m: 3, k: 4 };
        let d = Descriptor::new(
            dims,
            vec![0.0; dims.n * dims.m],
            vec![0.0; dims.n],
            vec![false; dims.b * dims.n],
            vec![0.0; dims.b * dims.n],
            vec![0.0; dims.b * dims.n * dims.k],
            vec![0.0; dims.b * dims.k * dims.m],
            vec![0.0; dims.b * dims.n],
            vec![0; dims.b],
            vec![0; dims.b * dims.n],
        );
        assert!(matches!(d, Err(DescriptorError::NotMultipleOfFour { name: "m", value: 3 })));
    }

    #[test]
    fn new_rejects_empty_batch() {
        let dims = Dims { b: 0, n: 4, m: 4, k: 4 };
        let d = Descriptor::new(dims, vec![], vec![0.0; 4], vec![], vec![], vec![], vec![], vec![], vec![], vec![]);
        assert_eq!(d.unwrap_err(), DescriptorError::EmptyBatch);
    }
}
