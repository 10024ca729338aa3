pub mod detectors;
pub mod estimator;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod signal;

pub use detectors::*;
pub use estimator::*;
pub use filters::*;
pub use metrics::*;
pub use signal::*;
