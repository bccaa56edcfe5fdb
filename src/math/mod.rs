//! Numerical building blocks: minimizer, finite differences, kernels, logit link.

pub mod kernel;
pub mod logit;
pub mod numdiff;
pub mod optimize;

pub use kernel::*;
pub use logit::*;
pub use numdiff::*;
pub use optimize::*;
