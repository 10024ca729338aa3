pub mod hr;
pub mod quality;
pub mod spo2;
