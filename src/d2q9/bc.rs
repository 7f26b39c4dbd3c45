use super::*;
use rayon::prelude::*;
use std::str::FromStr;

pub const Q_BAR: [usize; Q] = [0, 5, 6, 7, 8, 1, 2, 3, 4];

pub const Q_EAST: [usize; 3] = [2, 3, 4];

pub const Q_WEST: [usize; 3] = [6, 7, 8];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// Populations leaving the face re-enter through the opposite face.
    Periodic,
    /// Incoming populations are copied from the neighbouring column (zero gradient outflow).
    Absorbing,
}

impl FromStr for BoundaryCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "periodic" => Ok(BoundaryCondition::Periodic),
            "absorbing" => Ok(BoundaryCondition::Absorbing),
            other => Err(format!("Invalid boundary condition: {other}.")),
        }
    }
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum BoundaryFace {
    East,
    West,
}

impl Lattice {
    /// East first, then west. North and south are always periodic.
    pub fn boundary_condition(&mut self) {
        self.apply_boundary_condition(BoundaryFace::East, self.east_boundary);
        self.apply_boundary_condition(BoundaryFace::West, self.west_boundary);
    }

    pub fn apply_boundary_condition(
        &mut self,
        boundary_face: BoundaryFace,
        boundary_condition: BoundaryCondition,
    ) {
        match boundary_condition {
            BoundaryCondition::Absorbing => self.absorbing(boundary_face),
            BoundaryCondition::Periodic => {}
        }
    }

    /// Only the populations pointing back into the domain are overwritten; the
    /// rest of the edge column keeps its periodically wrapped values.
    fn absorbing(&mut self, boundary_face: BoundaryFace) {
        let (boundary_i, neighbour_i, q_face) = match boundary_face {
            BoundaryFace::East => (self.nx - 1, self.nx - 2, Q_WEST),
            BoundaryFace::West => (0, 1, Q_EAST),
        };
        for j in 0..self.ny {
            for q in q_face {
                self.get_node_mut(&[boundary_i, j]).f[q] = self.get_node(&[neighbour_i, j]).f[q];
            }
        }
    }

    pub fn bounce_back(&mut self) {
        self.nodes
            .par_iter_mut()
            .filter(|node| node.node_type == NodeType::Solid)
            .for_each(|node| node.reflect());
    }
}

impl Node {
    /// Swaps every population with its opposite and pins the velocity to zero.
    pub fn reflect(&mut self) {
        let f = self.f;
        for q in 0..Q {
            self.f[q] = f[Q_BAR[q]];
        }
        self.velocity = [0.0; D];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_lattice(nx: usize, ny: usize, boundary: BoundaryCondition) -> Lattice {
        let mut lattice = Lattice::new(nx, ny, 0.6, boundary, boundary);
        for node in lattice.nodes.iter_mut() {
            let [i, j] = node.index;
            for q in 0..Q {
                node.f[q] = (100 * j + 10 * i + q) as Float;
            }
        }
        lattice
    }

    #[test]
    fn test_parse_boundary_condition() {
        assert_eq!(
            "absorbing".parse::<BoundaryCondition>(),
            Ok(BoundaryCondition::Absorbing)
        );
        assert_eq!(
            " periodic ".parse::<BoundaryCondition>(),
            Ok(BoundaryCondition::Periodic)
        );
        assert!("no_slip".parse::<BoundaryCondition>().is_err());
    }

    #[test]
    fn test_reflect_is_mass_preserving_involution() {
        let mut node = Node::new([0, 0]);
        node.f = [0.3, 1.1, 0.7, 2.5, 0.01, 1.9, 0.4, 0.8, 1.3];
        node.velocity = [0.1, -0.2];
        let original = node.f;
        let mass = original.iter().sum::<Float>();

        node.reflect();
        assert_eq!(node.f, [0.3, 1.9, 0.4, 0.8, 1.3, 1.1, 0.7, 2.5, 0.01]);
        assert!((node.f.iter().sum::<Float>() - mass).abs() < 1e-14);
        assert_eq!(node.velocity, [0.0, 0.0]);

        node.reflect();
        assert_eq!(node.f, original);
    }

    #[test]
    fn test_bounce_back_only_touches_solid_nodes() {
        let mut lattice = ramp_lattice(4, 3, BoundaryCondition::Periodic);
        lattice.get_node_mut(&[2, 1]).node_type = NodeType::Solid;
        let fluid_before = lattice.get_node(&[1, 1]).f;
        let solid_before = lattice.get_node(&[2, 1]).f;
        lattice.bounce_back();
        assert_eq!(lattice.get_node(&[1, 1]).f, fluid_before);
        for q in 0..Q {
            assert_eq!(lattice.get_node(&[2, 1]).f[q], solid_before[Q_BAR[q]]);
        }
    }

    #[test]
    fn test_absorbing_overrides_after_wrap() {
        let mut lattice = ramp_lattice(5, 3, BoundaryCondition::Absorbing);
        let before: Vec<[Float; Q]> = lattice.nodes.iter().map(|node| node.f).collect();
        let at = |i: usize, j: usize, q: usize| before[i + 5 * j][q];
        lattice.streaming_step();

        for j in 0..3 {
            for q in 0..Q {
                let [cx, cy] = C[q];
                let source_j = (j as i32 - cy).rem_euclid(3) as usize;
                let east = lattice.get_node(&[4, j]).f[q];
                let west = lattice.get_node(&[0, j]).f[q];
                if Q_WEST.contains(&q) {
                    let source_i = (3 as i32 - cx) as usize;
                    assert_eq!(east, at(source_i, source_j, q));
                } else {
                    let source_i = (4 as i32 - cx).rem_euclid(5) as usize;
                    assert_eq!(east, at(source_i, source_j, q));
                }
                if Q_EAST.contains(&q) {
                    let source_i = (1 as i32 - cx) as usize;
                    assert_eq!(west, at(source_i, source_j, q));
                } else {
                    let source_i = (0 as i32 - cx).rem_euclid(5) as usize;
                    assert_eq!(west, at(source_i, source_j, q));
                }
            }
        }
    }

    #[test]
    fn test_periodic_faces_keep_wrapped_values() {
        let mut lattice = ramp_lattice(5, 3, BoundaryCondition::Periodic);
        let wrapped = lattice.get_node(&[4, 1]).f[3];
        lattice.streaming_step();
        assert_eq!(lattice.get_node(&[0, 1]).f[3], wrapped);
    }
}
