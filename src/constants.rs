// Default run settings, applied when a request leaves them out
pub const DEFAULT_DT_SECONDS: f64 = 86_400.0; // one day
pub const DEFAULT_STEADY_STATE_TOL: f64 = 1e-12;
pub const DEFAULT_MAX_ITER: usize = 10_000;

// Model 2 profile settings
pub const DEFAULT_GRID_SCALE_H: f64 = 0.2; // grid-cell thickness scale
pub const GRID_NODE_COUNT: usize = 100; // Nx, fixed resolution of the continuum grid

// Reporting
pub const PROGRESS_REPORT_PERCENT: f64 = 10.0;
pub const MASS_DRIFT_WARN_FRACTION: f64 = 1e-9;
