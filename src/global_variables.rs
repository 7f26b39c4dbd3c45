pub const CASE_NAME: &'static str = "Cylinder Wake";

pub type Float = f64;

pub const NX: usize = 400;

pub const NY: usize = 100;

pub const TAU: Float = 0.53;

pub const STEPS: usize = 40_000;

pub const SNAPSHOT_INTERVAL: usize = 50;

pub const SEED: u64 = 0;

pub const OBSTACLE_RADIUS: Float = 15.0;

pub const BASE_DENSITY: Float = 1.0;

pub const PERTURBATION_AMPLITUDE: Float = 0.01;

pub const BIAS_DIRECTION: usize = 3;

pub const BIAS_MAGNITUDE: Float = 2.3;

pub const DENSITY_EPSILON: Float = 1e-12;

pub const CS_2_INV: Float = 3.0;

pub const CS_4_INV: Float = 9.0;
