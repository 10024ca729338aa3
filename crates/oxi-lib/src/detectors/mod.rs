pub mod ppg;
