pub mod vtk;

use super::*;
use crate::global_variables::*;
use crate::post::PostResult;
use rayon::prelude::*;

/// Interior vorticity, row-major, `(ny - 2) * (nx - 2)` values.
///
/// `nx` and `ny` here are the dimensions of the field itself, not of the lattice.
#[derive(Clone, Debug, PartialEq)]
pub struct VorticityField {
    pub time_step: usize,
    pub nx: usize,
    pub ny: usize,
    pub values: Vec<Float>,
}

impl VorticityField {
    pub fn get(&self, i: usize, j: usize) -> Float {
        self.values[i + self.nx * j]
    }

    pub fn max_abs(&self) -> Float {
        self.values.iter().fold(0.0, |acc: Float, v| acc.max(v.abs()))
    }
}

/// Central differences over interior nodes; rows are differenced for `ux` and
/// columns for `uy`, edges excluded rather than wrapped.
pub fn compute_vorticity(lattice: &Lattice) -> VorticityField {
    let nx = lattice.nx.saturating_sub(2);
    let ny = lattice.ny.saturating_sub(2);
    let values = (0..nx * ny)
        .into_par_iter()
        .map(|k| {
            let i = k % nx + 1;
            let j = k / nx + 1;
            let dux = lattice.get_node(&[i, j + 1]).velocity[0]
                - lattice.get_node(&[i, j - 1]).velocity[0];
            let duy = lattice.get_node(&[i + 1, j]).velocity[1]
                - lattice.get_node(&[i - 1, j]).velocity[1];
            dux - duy
        })
        .collect();
    VorticityField {
        time_step: lattice.time_step,
        nx,
        ny,
        values,
    }
}

pub fn compute_total_mass(lattice: &Lattice) -> Vec<PostResult> {
    let fluid_mass = lattice
        .nodes
        .par_iter()
        .filter(|node| node.node_type == NodeType::Fluid)
        .map(|node| node.f.iter().sum::<Float>())
        .sum::<Float>();
    vec![
        PostResult::new("total_mass", "total mass", lattice.total_mass()),
        PostResult::new("fluid_mass", "fluid mass", fluid_mass),
    ]
}

pub fn compute_mean_velocities(lattice: &Lattice) -> Vec<PostResult> {
    let (ux_sum, uy_sum, count) = lattice
        .nodes
        .par_iter()
        .filter(|node| node.node_type == NodeType::Fluid)
        .map(|node| (node.velocity[0], node.velocity[1], 1usize))
        .reduce(|| (0.0, 0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));
    let number_of_fluid_nodes = count.max(1) as Float;
    vec![
        PostResult::new(
            "mean_velocity_x",
            "mean velocity (x)",
            ux_sum / number_of_fluid_nodes,
        ),
        PostResult::new(
            "mean_velocity_y",
            "mean velocity (y)",
            uy_sum / number_of_fluid_nodes,
        ),
    ]
}

pub fn compute_max_velocity(lattice: &Lattice) -> Vec<PostResult> {
    let max_velocity = lattice
        .nodes
        .par_iter()
        .map(|node| {
            (node.velocity[0] * node.velocity[0] + node.velocity[1] * node.velocity[1]).sqrt()
        })
        .reduce(|| 0.0, Float::max);
    vec![PostResult::new(
        "max_velocity",
        "max velocity (magnitude)",
        max_velocity,
    )]
}
