//! Mathematical building blocks.
//!
//! - [`distributions`]: standard normal CDF/PDF
//! - [`linalg`]: dense Gaussian elimination and Cholesky solves
//! - [`solvers`]: Powell hybrid root finder for square nonlinear systems

pub mod distributions;
pub mod linalg;
pub mod solvers;
