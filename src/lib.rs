#![deny(missing_docs,
        missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces, unused_qualifications)]

//! A dense numerical engine for a differentiable MAXSAT layer: a batched
//! coordinate-descent "mixing method" solver on the unit sphere, and the
//! analytic adjoint of that solver, parallelized across instances.
//!
//! The three entry points share one inner kernel ([`kernel`]):
//! [`init::init`] prepares an instance, [`forward::forward`] runs the solver
//! to a fixed point, and [`backward::backward`] treats that fixed point as a
//! linear system and differentiates through it. [`batch`] drives all three
//! across a batch on a `rayon` thread pool.

mod primitives;

/// Typed construction-time validation errors.
pub mod error;
/// Problem dimensions, caller-owned buffers, and per-instance views.
pub mod descriptor;
/// Forward/backward solver hyperparameters.
pub mod config;
/// The shared inner mixing kernel.
pub mod kernel;
/// The initializer.
pub mod init;
/// The forward driver.
pub mod forward;
/// The backward driver.
pub mod backward;
/// The batch launcher.
pub mod batch;

pub use backward::backward;
pub use batch::{backward_batch, forward_batch, init_batch};
pub use config::SolverConfig;
pub use descriptor::{BackwardBuffers, Descriptor, Dims};
pub use error::{ConfigError, DescriptorError};
pub use forward::forward;
pub use init::init;
