pub mod bc;
pub mod config;
pub mod initialization;
pub mod io;
pub mod post;

pub use bc::{BoundaryCondition, BoundaryFace};
pub use config::{Obstacle, SimulationConfig};
pub use post::VorticityField;

use crate::error::{DivergenceReason, SimulationError, SimulationResult};
use crate::global_variables::*;
use crate::snapshot::SnapshotSink;
use crate::NodeType;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const D: usize = 2;

pub const Q: usize = 9;

pub const C: [[i32; D]; Q] = [
    [0, 0],
    [0, 1],
    [1, 1],
    [1, 0],
    [1, -1],
    [0, -1],
    [-1, -1],
    [-1, 0],
    [-1, 1],
];

pub const W: [Float; Q] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 9.0,
    1.0 / 36.0,
];

#[derive(Clone, Debug)]
pub struct Node {
    pub node_type: NodeType,

    pub index: [usize; D],

    pub density: Float,

    pub velocity: [Float; D],

    pub f: [Float; Q],

    pub f_eq: [Float; Q],
}

impl Node {
    pub fn update_density(&mut self) {
        self.density = self.f.iter().sum();
    }

    pub fn update_velocity(&mut self) {
        let mut momentum = [0.0; D];
        for q in 0..Q {
            momentum[0] += self.f[q] * C[q][0] as Float;
            momentum[1] += self.f[q] * C[q][1] as Float;
        }
        self.velocity[0] = momentum[0] / self.density;
        self.velocity[1] = momentum[1] / self.density;
    }

    pub fn update_moments(&mut self) {
        self.update_density();
        self.update_velocity();
    }

    pub fn check_moments(&self) -> Option<DivergenceReason> {
        let [x, y] = self.index;
        if self.density.is_nan() || self.density <= DENSITY_EPSILON {
            return Some(DivergenceReason::NonPositiveDensity {
                x,
                y,
                density: self.density,
            });
        }
        if !self.velocity.iter().all(|u| u.is_finite()) {
            return Some(DivergenceReason::NonFiniteVelocity { x, y });
        }
        None
    }

    pub fn equilibrium(&mut self) {
        let [ux, uy] = self.velocity;
        let u_2 = ux * ux + uy * uy;
        for q in 0..Q {
            let cx = C[q][0] as Float;
            let cy = C[q][1] as Float;
            let u_dot_c = ux * cx + uy * cy;
            self.f_eq[q] = self.density
                * W[q]
                * (1.0 + CS_2_INV * u_dot_c + 0.5 * CS_4_INV * u_dot_c * u_dot_c
                    - 0.5 * CS_2_INV * u_2);
        }
    }

    pub fn collision_step(&mut self, omega: Float) {
        for q in 0..Q {
            self.f[q] += -omega * (self.f[q] - self.f_eq[q]);
        }
    }

    pub fn check_populations(&self) -> Option<DivergenceReason> {
        let [x, y] = self.index;
        self.f
            .iter()
            .position(|f| !f.is_finite())
            .map(|direction| DivergenceReason::NonFinitePopulation { x, y, direction })
    }

    pub fn negative_populations(&self) -> usize {
        self.f.iter().filter(|&&f| f < 0.0).count()
    }
}

impl Node {
    pub fn new(index: [usize; D]) -> Self {
        Self {
            node_type: NodeType::Fluid,
            index,
            density: 0.0,
            velocity: [0.0; D],
            f: [0.0; Q],
            f_eq: [0.0; Q],
        }
    }
}

/// Outcome of one successful step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub time_step: usize,
    pub negative_populations: usize,
}

pub struct Lattice {
    pub nx: usize,
    pub ny: usize,
    pub tau: Float,
    pub omega: Float,
    pub time_step: usize,
    pub nodes: Vec<Node>,
    pub east_boundary: BoundaryCondition,
    pub west_boundary: BoundaryCondition,
    pub solid_nodes: Vec<[usize; D]>,
    streaming_buffer: Vec<[Float; Q]>,
}

impl Lattice {
    pub fn get_node(&self, index: &[usize]) -> &Node {
        let i = index[0];
        let j = index[1];
        let number_of_rows = self.nx * j;
        let index = i + number_of_rows;
        &self.nodes[index]
    }

    pub fn get_node_mut(&mut self, index: &[usize]) -> &mut Node {
        let i = index[0];
        let j = index[1];
        let number_of_rows = self.nx * j;
        let index = i + number_of_rows;
        &mut self.nodes[index]
    }

    /// Periodic pull along every lattice velocity, then the east/west overrides.
    pub fn streaming_step(&mut self) {
        self.streaming_buffer
            .par_iter_mut()
            .zip(self.nodes.par_iter())
            .for_each(|(buffer, node)| *buffer = node.f);
        let width = self.nx;
        let nx = self.nx as i32;
        let ny = self.ny as i32;
        let buffer = &self.streaming_buffer;
        self.nodes.par_iter_mut().for_each(|node| {
            let [i, j] = node.index;
            for q in 0..Q {
                let [cx, cy] = C[q];
                let old_i = ((i as i32) - cx).rem_euclid(nx) as usize;
                let old_j = ((j as i32) - cy).rem_euclid(ny) as usize;
                node.f[q] = buffer[old_i + width * old_j][q];
            }
        });
        self.boundary_condition();
    }

    pub fn update_moments(&mut self) -> Result<(), DivergenceReason> {
        self.nodes
            .par_iter_mut()
            .for_each(|node| node.update_moments());
        match self.nodes.par_iter().find_map_first(|node| node.check_moments()) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    pub fn equilibrium(&mut self) {
        self.nodes
            .par_iter_mut()
            .for_each(|node| node.equilibrium());
    }

    /// Returns the number of negative populations left by the relaxation.
    pub fn collision_step(&mut self) -> Result<usize, DivergenceReason> {
        let omega = self.omega;
        self.nodes
            .par_iter_mut()
            .for_each(|node| node.collision_step(omega));
        if let Some(reason) = self
            .nodes
            .par_iter()
            .find_map_first(|node| node.check_populations())
        {
            return Err(reason);
        }
        Ok(self
            .nodes
            .par_iter()
            .map(|node| node.negative_populations())
            .sum())
    }

    pub fn step(&mut self) -> SimulationResult<StepReport> {
        self.timed_step(&mut |_, _| {})
    }

    /// Same as [`Lattice::step`], reporting the wall time of every stage to `timer`.
    pub fn timed_step<T>(&mut self, timer: &mut T) -> SimulationResult<StepReport>
    where
        T: FnMut(&'static str, Duration),
    {
        let time_step = self.time_step + 1;
        let divergence = |reason: DivergenceReason| SimulationError::NumericalDivergence {
            step: time_step,
            reason,
        };

        let ss_time = Instant::now();
        self.streaming_step();
        timer("ss", ss_time.elapsed());

        let um_time = Instant::now();
        self.update_moments().map_err(divergence)?;
        timer("um", um_time.elapsed());

        let bb_time = Instant::now();
        self.bounce_back();
        timer("bb", bb_time.elapsed());

        let cs_time = Instant::now();
        self.equilibrium();
        let negative_populations = self.collision_step().map_err(divergence)?;
        timer("cs", cs_time.elapsed());

        self.time_step = time_step;
        Ok(StepReport {
            time_step,
            negative_populations,
        })
    }

    pub fn snapshot(&self) -> VorticityField {
        post::compute_vorticity(self)
    }

    pub fn total_mass(&self) -> Float {
        self.nodes
            .par_iter()
            .map(|node| node.f.iter().sum::<Float>())
            .sum()
    }

    pub fn density_field(&self) -> Vec<Float> {
        self.nodes.iter().map(|node| node.density).collect()
    }
}

impl Lattice {
    pub fn new(
        nx: usize,
        ny: usize,
        tau: Float,
        east_boundary: BoundaryCondition,
        west_boundary: BoundaryCondition,
    ) -> Self {
        let mut nodes = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                nodes.push(Node::new([i, j]));
            }
        }
        Self {
            nx,
            ny,
            tau,
            omega: 1.0 / tau,
            time_step: 0,
            nodes,
            east_boundary,
            west_boundary,
            solid_nodes: Vec::new(),
            streaming_buffer: vec![[0.0; Q]; nx * ny],
        }
    }

    fn set_node_type(&mut self) {
        self.solid_nodes = self
            .nodes
            .iter()
            .filter(|node| node.node_type == NodeType::Solid)
            .map(|node| node.index)
            .collect();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    Completed,
    Cancelled { step: usize },
    Diverged { step: usize, reason: DivergenceReason },
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub steps_completed: usize,
    pub termination: Termination,
    pub last_snapshot: Option<VorticityField>,
}

pub struct Simulation {
    pub config: SimulationConfig,
    pub simulation_time: Instant,
    pub verbose: bool,
    pub monitors: bool,
    stop_requested: Arc<AtomicBool>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            simulation_time: Instant::now(),
            verbose: false,
            monitors: false,
            stop_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Setting the returned flag stops the run before the next step begins.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_requested)
    }

    pub fn should_snapshot(&self, time_step: usize) -> bool {
        time_step % self.config.snapshot_interval == 0
    }

    pub fn stop_condition(&self, lattice: &Lattice) -> bool {
        lattice.time_step >= self.config.steps || self.stop_requested.load(Ordering::Relaxed)
    }

    pub fn run<S>(&mut self, sink: &mut S) -> SimulationResult<RunReport>
    where
        S: SnapshotSink,
    {
        let mut lattice = Lattice::initialize(&self.config)?;
        self.run_lattice(&mut lattice, sink)
    }

    pub fn run_lattice<S>(&mut self, lattice: &mut Lattice, sink: &mut S) -> SimulationResult<RunReport>
    where
        S: SnapshotSink,
    {
        info!(
            case = %self.config.case_name,
            nx = lattice.nx,
            ny = lattice.ny,
            tau = lattice.tau,
            steps = self.config.steps,
            "starting simulation"
        );
        self.simulation_time = Instant::now();
        let mut last_snapshot = None;
        let mut negative_warned = false;
        let termination = loop {
            if lattice.time_step >= self.config.steps {
                break Termination::Completed;
            }
            if self.stop_requested.load(Ordering::Relaxed) {
                info!(step = lattice.time_step, "stop requested");
                break Termination::Cancelled {
                    step: lattice.time_step,
                };
            }
            let report = match lattice.step() {
                Ok(report) => report,
                Err(SimulationError::NumericalDivergence { step, reason }) => {
                    error!(step, %reason, "numerical divergence, aborting the run");
                    break Termination::Diverged { step, reason };
                }
                Err(e) => return Err(e),
            };
            if report.negative_populations > 0 {
                if !negative_warned {
                    warn!(
                        step = report.time_step,
                        count = report.negative_populations,
                        "negative populations after collision, consider a larger tau"
                    );
                    negative_warned = true;
                } else {
                    debug!(
                        step = report.time_step,
                        count = report.negative_populations,
                        "negative populations after collision"
                    );
                }
            }
            if self.should_snapshot(report.time_step) {
                let field = lattice.snapshot();
                if self.verbose {
                    self.print_progress(lattice, &field);
                }
                if self.monitors {
                    self.write_monitors(lattice)?;
                }
                sink.accept(field.clone());
                last_snapshot = Some(field);
            }
        };
        info!(
            steps = lattice.time_step,
            elapsed = self.simulation_time.elapsed().as_secs_f64(),
            "simulation finished"
        );
        Ok(RunReport {
            steps_completed: lattice.time_step,
            termination,
            last_snapshot,
        })
    }
}

pub fn run() -> SimulationResult<RunReport> {
    crate::io::create_case_directories()?;
    let config = SimulationConfig::build_case_setup()?;
    let mut simulation = Simulation::new(config)?;
    simulation.verbose = true;
    simulation.monitors = true;

    let mut lattice = Lattice::initialize(&simulation.config)?;
    simulation.write_node_type_vtk(&lattice)?;

    let mut sink = crate::snapshot::FileSnapshotSink::spawn();
    let report = simulation.run_lattice(&mut lattice, &mut sink)?;
    let written = sink.finish()?;
    info!(snapshots = written, "snapshot writer finished");
    Ok(report)
}

pub fn run_benchmark() -> SimulationResult<RunReport> {
    crate::io::create_case_directories()?;

    let bcs_time = Instant::now();
    let config = SimulationConfig::build_case_setup()?;
    let bcs_duration = bcs_time.elapsed();

    let init_time = Instant::now();
    let mut lattice = Lattice::initialize(&config)?;
    let init_duration = init_time.elapsed();

    let simulation = Simulation::new(config)?;
    let mut last_snapshot = None;
    let termination = loop {
        if simulation.stop_condition(&lattice) {
            break Termination::Completed;
        }
        let loop_time = Instant::now();
        let mut elapsed_times = vec![("bcs", bcs_duration), ("init", init_duration)];
        let report = lattice.timed_step(&mut |name, duration| elapsed_times.push((name, duration)));
        let report = match report {
            Ok(report) => report,
            Err(SimulationError::NumericalDivergence { step, reason }) => {
                error!(step, %reason, "numerical divergence, aborting the benchmark");
                break Termination::Diverged { step, reason };
            }
            Err(e) => return Err(e),
        };
        let vc_time = Instant::now();
        let field = lattice.snapshot();
        elapsed_times.push(("vc", vc_time.elapsed()));
        elapsed_times.push(("loop", loop_time.elapsed()));
        debug!(step = report.time_step, max_vorticity = field.max_abs());
        crate::io::write_inside_loop_elapsed_time(&elapsed_times, &report.time_step)?;
        last_snapshot = Some(field);
    };
    Ok(RunReport {
        steps_completed: lattice.time_step,
        termination,
        last_snapshot,
    })
}
