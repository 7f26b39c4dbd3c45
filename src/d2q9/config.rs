use super::bc::BoundaryCondition;
use super::{D, Q};
use crate::error::{SimulationError, SimulationResult};
use crate::global_variables::*;
use std::collections::HashMap;
use std::str::FromStr;

/// A solid disk, in lattice units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub center: [Float; D],
    pub radius: Float,
}

impl Obstacle {
    /// Cylinder placed a quarter of the way along the channel, as in the reference case.
    pub fn reference(nx: usize, ny: usize) -> Self {
        Self {
            center: [(nx / 4) as Float, (ny / 2) as Float],
            radius: OBSTACLE_RADIUS,
        }
    }

    pub fn contains(&self, x: Float, y: Float) -> bool {
        let dx = x - self.center[0];
        let dy = y - self.center[1];
        (dx * dx + dy * dy).sqrt() < self.radius
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub case_name: String,
    pub nx: usize,
    pub ny: usize,
    pub tau: Float,
    pub steps: usize,
    pub snapshot_interval: usize,
    pub seed: u64,
    pub obstacle: Option<Obstacle>,
    pub base_density: Float,
    pub perturbation_amplitude: Float,
    pub bias_direction: usize,
    pub bias_magnitude: Float,
    pub east_boundary: BoundaryCondition,
    pub west_boundary: BoundaryCondition,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            case_name: String::from(CASE_NAME),
            nx: NX,
            ny: NY,
            tau: TAU,
            steps: STEPS,
            snapshot_interval: SNAPSHOT_INTERVAL,
            seed: SEED,
            obstacle: Some(Obstacle::reference(NX, NY)),
            base_density: BASE_DENSITY,
            perturbation_amplitude: PERTURBATION_AMPLITUDE,
            bias_direction: BIAS_DIRECTION,
            bias_magnitude: BIAS_MAGNITUDE,
            east_boundary: BoundaryCondition::Absorbing,
            west_boundary: BoundaryCondition::Absorbing,
        }
    }
}

impl SimulationConfig {
    pub fn build_case_setup() -> SimulationResult<Self> {
        match crate::io::read_case_setup()? {
            Some(parameters) => Self::from_setup(&parameters),
            None => Ok(Self::default()),
        }
    }

    /// Missing keys fall back to the reference case; the obstacle default follows `nx`/`ny`.
    pub fn from_setup(parameters: &HashMap<String, String>) -> SimulationResult<Self> {
        let defaults = Self::default();
        let nx = parse_parameter(parameters, "nx", defaults.nx)?;
        let ny = parse_parameter(parameters, "ny", defaults.ny)?;
        let obstacle = match parameters.get("obstacle") {
            Some(value) => parse_obstacle(value)?,
            None => Some(Obstacle::reference(nx, ny)),
        };
        let config = Self {
            case_name: parameters
                .get("case_name")
                .cloned()
                .unwrap_or(defaults.case_name),
            nx,
            ny,
            tau: parse_parameter(parameters, "tau", defaults.tau)?,
            steps: parse_parameter(parameters, "steps", defaults.steps)?,
            snapshot_interval: parse_parameter(
                parameters,
                "snapshot_interval",
                defaults.snapshot_interval,
            )?,
            seed: parse_parameter(parameters, "seed", defaults.seed)?,
            obstacle,
            base_density: parse_parameter(parameters, "base_density", defaults.base_density)?,
            perturbation_amplitude: parse_parameter(
                parameters,
                "perturbation_amplitude",
                defaults.perturbation_amplitude,
            )?,
            bias_direction: parse_parameter(
                parameters,
                "bias_direction",
                defaults.bias_direction,
            )?,
            bias_magnitude: parse_parameter(
                parameters,
                "bias_magnitude",
                defaults.bias_magnitude,
            )?,
            east_boundary: parse_parameter(parameters, "east_boundary", defaults.east_boundary)?,
            west_boundary: parse_parameter(parameters, "west_boundary", defaults.west_boundary)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimulationResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(SimulationError::invalid_configuration(format!(
                "grid dimensions must be positive, got {} x {}",
                self.nx, self.ny
            )));
        }
        if self.steps == 0 {
            return Err(SimulationError::invalid_configuration(
                "the number of steps must be positive",
            ));
        }
        if !self.tau.is_finite() || self.tau <= 0.5 {
            return Err(SimulationError::invalid_configuration(format!(
                "tau must be greater than 0.5, got {}",
                self.tau
            )));
        }
        if self.snapshot_interval == 0 {
            return Err(SimulationError::invalid_configuration(
                "the snapshot interval must be positive",
            ));
        }
        if self.bias_direction >= Q {
            return Err(SimulationError::invalid_configuration(format!(
                "bias direction must be below {Q}, got {}",
                self.bias_direction
            )));
        }
        if !(self.perturbation_amplitude >= 0.0) || !self.perturbation_amplitude.is_finite() {
            return Err(SimulationError::invalid_configuration(format!(
                "perturbation amplitude must be a non-negative number, got {}",
                self.perturbation_amplitude
            )));
        }
        if !self.base_density.is_finite() || !self.bias_magnitude.is_finite() {
            return Err(SimulationError::invalid_configuration(
                "base density and bias magnitude must be finite",
            ));
        }
        if let Some(obstacle) = &self.obstacle {
            let finite = obstacle.center.iter().all(|c| c.is_finite()) && obstacle.radius.is_finite();
            if !finite || obstacle.radius < 0.0 {
                return Err(SimulationError::invalid_configuration(format!(
                    "obstacle needs a finite center and a non-negative radius, got {:?}",
                    obstacle
                )));
            }
        }
        let absorbing = self.east_boundary == BoundaryCondition::Absorbing
            || self.west_boundary == BoundaryCondition::Absorbing;
        if absorbing && self.nx < 2 {
            return Err(SimulationError::invalid_configuration(
                "absorbing east/west boundaries need at least two columns",
            ));
        }
        Ok(())
    }
}

fn parse_parameter<T>(parameters: &HashMap<String, String>, key: &str, default: T) -> SimulationResult<T>
where
    T: FromStr,
{
    match parameters.get(key) {
        Some(value) => value.parse::<T>().map_err(|_| {
            SimulationError::invalid_configuration(format!("invalid value for {key}: {value:?}"))
        }),
        None => Ok(default),
    }
}

fn parse_obstacle(value: &str) -> SimulationResult<Option<Obstacle>> {
    if value.trim() == "none" {
        return Ok(None);
    }
    let numbers = value
        .split_whitespace()
        .map(|x| x.parse::<Float>())
        .collect::<Result<Vec<Float>, _>>()
        .map_err(|_| SimulationError::invalid_configuration(format!("invalid obstacle: {value:?}")))?;
    match numbers[..] {
        [cx, cy, radius] => Ok(Some(Obstacle {
            center: [cx, cy],
            radius,
        })),
        _ => Err(SimulationError::invalid_configuration(format!(
            "obstacle expects \"none\" or \"cx cy radius\", got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_is_reference_case() {
        let config = SimulationConfig::default();
        assert_eq!((config.nx, config.ny), (400, 100));
        assert_eq!(config.obstacle.unwrap().center, [100.0, 50.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_setup() {
        let parameters = setup(&[
            ("nx", "80"),
            ("ny", "20"),
            ("tau", "0.6"),
            ("obstacle", "none"),
            ("east_boundary", "periodic"),
        ]);
        let config = SimulationConfig::from_setup(&parameters).unwrap();
        assert_eq!(config.nx, 80);
        assert_eq!(config.tau, 0.6);
        assert!(config.obstacle.is_none());
        assert_eq!(config.east_boundary, BoundaryCondition::Periodic);
        assert_eq!(config.west_boundary, BoundaryCondition::Absorbing);

        let parameters = setup(&[("nx", "80"), ("ny", "20")]);
        let config = SimulationConfig::from_setup(&parameters).unwrap();
        assert_eq!(config.obstacle.unwrap().center, [20.0, 10.0]);

        let parameters = setup(&[("obstacle", "4 5 2.5")]);
        let config = SimulationConfig::from_setup(&parameters).unwrap();
        assert_eq!(config.obstacle.unwrap().radius, 2.5);
    }

    #[test]
    fn test_invalid_setup() {
        for pairs in [
            vec![("tau", "0.5")],
            vec![("tau", "abc")],
            vec![("nx", "0")],
            vec![("steps", "0")],
            vec![("snapshot_interval", "0")],
            vec![("bias_direction", "9")],
            vec![("obstacle", "1 2")],
            vec![("obstacle", "1 2 -3")],
            vec![("east_boundary", "zou_he")],
            vec![("nx", "1"), ("obstacle", "none")],
        ] {
            let result = SimulationConfig::from_setup(&setup(&pairs));
            assert!(
                matches!(result, Err(SimulationError::InvalidConfiguration { .. })),
                "{pairs:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_obstacle_contains() {
        let obstacle = Obstacle {
            center: [5.0, 5.0],
            radius: 2.0,
        };
        assert!(obstacle.contains(5.0, 5.0));
        assert!(obstacle.contains(6.0, 6.0));
        assert!(!obstacle.contains(7.0, 5.0));
        assert!(!obstacle.contains(-5.0, 5.0));
    }
}
