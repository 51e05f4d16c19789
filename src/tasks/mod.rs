pub mod estimator;
pub mod sensor;
