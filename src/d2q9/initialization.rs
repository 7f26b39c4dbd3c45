use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::{info, warn};

impl Lattice {
    /// Builds the grid state described by `config`, drawing the perturbation from a
    /// generator seeded with `config.seed`.
    pub fn initialize(config: &SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut lattice = Self::initialize_with_rng(config, &mut rng);
        if let Some(obstacle) = &config.obstacle {
            lattice.apply_obstacle(obstacle);
        }
        lattice.nodes.par_iter_mut().for_each(|node| {
            node.update_moments();
            if node.node_type == NodeType::Solid {
                node.velocity = [0.0; D];
            }
        });
        info!(
            nx = lattice.nx,
            ny = lattice.ny,
            solid_nodes = lattice.solid_nodes.len(),
            seed = config.seed,
            "lattice initialized"
        );
        Ok(lattice)
    }

    /// Populations are drawn row by row, column by column, direction by direction.
    pub fn initialize_with_rng<R>(config: &SimulationConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut lattice = Lattice::new(
            config.nx,
            config.ny,
            config.tau,
            config.east_boundary,
            config.west_boundary,
        );
        for node in lattice.nodes.iter_mut() {
            for q in 0..Q {
                let noise: Float = StandardNormal.sample(rng);
                node.f[q] = config.base_density + config.perturbation_amplitude * noise;
            }
            node.f[config.bias_direction] = config.bias_magnitude;
        }
        lattice
    }

    /// Marks every node inside the disk as solid and returns how many there are.
    pub fn apply_obstacle(&mut self, obstacle: &Obstacle) -> usize {
        self.nodes.par_iter_mut().for_each(|node| {
            let [i, j] = node.index;
            if obstacle.contains(i as Float, j as Float) {
                node.node_type = NodeType::Solid;
            }
        });
        self.set_node_type();
        if self.solid_nodes.is_empty() {
            warn!(
                center = ?obstacle.center,
                radius = obstacle.radius,
                "obstacle covers no lattice node, no solid nodes created"
            );
        }
        self.solid_nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            nx: 12,
            ny: 10,
            tau: 0.6,
            steps: 10,
            snapshot_interval: 5,
            seed: 7,
            obstacle: Some(Obstacle {
                center: [4.0, 5.0],
                radius: 2.5,
            }),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_obstacle_is_filled_disk() {
        let lattice = Lattice::initialize(&small_config()).unwrap();
        for node in &lattice.nodes {
            let [i, j] = node.index;
            let dx = i as Float - 4.0;
            let dy = j as Float - 5.0;
            let inside = (dx * dx + dy * dy).sqrt() < 2.5;
            assert_eq!(node.node_type == NodeType::Solid, inside, "node ({i}, {j})");
        }
        assert_eq!(lattice.solid_nodes.len(), 21);
    }

    #[test]
    fn test_clipped_and_outside_obstacles() {
        let mut config = small_config();
        config.obstacle = Some(Obstacle {
            center: [0.0, 0.0],
            radius: 1.5,
        });
        let lattice = Lattice::initialize(&config).unwrap();
        let mut solid = lattice.solid_nodes.clone();
        solid.sort();
        assert_eq!(solid, vec![[0, 0], [0, 1], [1, 0], [1, 1]]);

        config.obstacle = Some(Obstacle {
            center: [-50.0, 5.0],
            radius: 3.0,
        });
        let lattice = Lattice::initialize(&config).unwrap();
        assert!(lattice.solid_nodes.is_empty());
    }

    #[test]
    fn test_obstacle_between_nodes_covers_nothing() {
        let mut lattice = Lattice::new(
            12,
            10,
            0.6,
            BoundaryCondition::Absorbing,
            BoundaryCondition::Absorbing,
        );
        let obstacle = Obstacle {
            center: [0.5, 0.5],
            radius: 0.3,
        };
        assert_eq!(lattice.apply_obstacle(&obstacle), 0);
        assert!(lattice.solid_nodes.is_empty());
        assert!(lattice
            .nodes
            .iter()
            .all(|node| node.node_type == NodeType::Fluid));

        let obstacle = Obstacle {
            center: [4.0, 5.0],
            radius: 2.5,
        };
        assert_eq!(lattice.apply_obstacle(&obstacle), 21);
    }

    #[test]
    fn test_bias_and_perturbation() {
        let lattice = Lattice::initialize(&small_config()).unwrap();
        let mut perturbed = false;
        for node in &lattice.nodes {
            assert_eq!(node.f[BIAS_DIRECTION], BIAS_MAGNITUDE);
            for q in (0..Q).filter(|&q| q != BIAS_DIRECTION) {
                assert!((node.f[q] - BASE_DENSITY).abs() < 0.1);
                perturbed |= node.f[q] != BASE_DENSITY;
            }
        }
        assert!(perturbed);
    }

    #[test]
    fn test_initialization_is_deterministic() {
        let config = small_config();
        let a = Lattice::initialize(&config).unwrap();
        let b = Lattice::initialize(&config).unwrap();
        for (node_a, node_b) in a.nodes.iter().zip(b.nodes.iter()) {
            assert_eq!(node_a.f, node_b.f);
        }
        let c = Lattice::initialize(&SimulationConfig {
            seed: 8,
            ..config
        })
        .unwrap();
        assert!(a.nodes.iter().zip(c.nodes.iter()).any(|(x, y)| x.f != y.f));
    }

    #[test]
    fn test_initial_moments() {
        let mut config = small_config();
        config.perturbation_amplitude = 0.0;
        let lattice = Lattice::initialize(&config).unwrap();
        let fluid = lattice.get_node(&[10, 1]);
        assert!((fluid.density - 10.3).abs() < 1e-12);
        assert!((fluid.velocity[0] - 1.3 / 10.3).abs() < 1e-12);
        assert_eq!(fluid.velocity[1], 0.0);
        assert_eq!(lattice.get_node(&[4, 5]).velocity, [0.0, 0.0]);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = SimulationConfig {
            tau: 0.5,
            ..small_config()
        };
        assert!(matches!(
            Lattice::initialize(&config),
            Err(SimulationError::InvalidConfiguration { .. })
        ));
    }
}
