use super::post::{self, VorticityField};
use super::{Lattice, Simulation};
use crate::global_variables::*;
use crate::NodeType;
use colored::*;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

impl Simulation {
    pub fn print_progress(&self, lattice: &Lattice, field: &VorticityField) {
        let snapshot_number = lattice.time_step / self.config.snapshot_interval;
        let mass = post::compute_total_mass(lattice);
        let max_velocity = post::compute_max_velocity(lattice);
        if snapshot_number % 20 == 1 {
            let duration = self.simulation_time.elapsed().as_secs_f64();
            println!("\n{} {:.2} s.", "Elapsed time:".cyan().bold(), duration);
            println!(
                "\n{:>8} {:>16} {:>16} {:>16}\n",
                "step".cyan().bold(),
                mass[0].name.cyan().bold(),
                max_velocity[0].name.cyan().bold(),
                "max_vorticity".cyan().bold()
            );
        }
        println!(
            "{:>8} {:>16.8e} {:>16.8e} {:>16.8e}",
            lattice.time_step,
            mass[0].value,
            max_velocity[0].value,
            field.max_abs()
        );
    }

    pub fn write_monitors(&self, lattice: &Lattice) -> io::Result<()> {
        self.write_post_processing(lattice, post::compute_total_mass, "total_mass.dat")?;
        self.write_post_processing(lattice, post::compute_mean_velocities, "mean_velocities.dat")?;
        self.write_post_processing(lattice, post::compute_max_velocity, "max_velocity.dat")?;
        Ok(())
    }

    pub fn write_post_processing<F>(
        &self,
        lattice: &Lattice,
        function: F,
        file_name: &str,
    ) -> io::Result<()>
    where
        F: Fn(&Lattice) -> Vec<crate::post::PostResult>,
    {
        let post_results = &function(lattice);
        let post_processing_path = Path::new(crate::io::POST_PROCESSING_PATH);
        let path = post_processing_path.join(file_name);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if lattice.time_step == self.config.snapshot_interval {
            write!(file, "{:>8}", "step")?;
            for post_result in post_results {
                write!(file, " {:>16}", post_result.name)?;
            }
            writeln!(file)?;
            for post_result in post_results {
                debug!(file = file_name, column = post_result.name, label = post_result.label);
            }
        }
        write!(file, "{:>8}", lattice.time_step)?;
        for post_result in post_results {
            write!(file, " {:>16.8e}", post_result.value)?;
        }
        writeln!(file)?;
        Ok(())
    }

    pub fn write_node_type_vtk(&self, lattice: &Lattice) -> io::Result<()> {
        let vtk_files_path = Path::new(crate::io::VTK_PATH);
        let case_name = self.config.case_name.replace(" ", "_").to_lowercase();
        let path_str = format!("{}_node_type.vtk", case_name);
        let path = vtk_files_path.join(&path_str);
        info!("Writing node type vtk file: {}.", path.display());
        let mut file = BufWriter::new(File::create(path)?);
        writeln!(file, "# vtk DataFile Version 3.0")?;
        writeln!(file, "LBM obstacle mask")?;
        writeln!(file, "ASCII")?;
        writeln!(file, "DATASET STRUCTURED_POINTS")?;
        writeln!(file, "DIMENSIONS {} {} 1", lattice.nx, lattice.ny)?;
        writeln!(file, "ORIGIN 0 0 0")?;
        writeln!(file, "SPACING 1 1 1")?;
        writeln!(file, "POINT_DATA {}", lattice.nx * lattice.ny)?;
        writeln!(file, "SCALARS node_type int 1")?;
        writeln!(file, "LOOKUP_TABLE default")?;
        for node in &lattice.nodes {
            match node.node_type {
                NodeType::Fluid => writeln!(file, "0")?,
                NodeType::Solid => writeln!(file, "1")?,
            }
        }
        file.flush()?;
        Ok(())
    }
}

pub fn snapshot_path(time_step: usize) -> PathBuf {
    Path::new(crate::io::DATA_PATH)
        .join(time_step.to_string())
        .join(crate::io::VORTICITY_FILE)
}

pub fn write_snapshot(field: &VorticityField) -> io::Result<PathBuf> {
    let path = snapshot_path(field.time_step);
    if let Some(step_path) = path.parent() {
        fs::create_dir_all(step_path)?;
    }
    write_vorticity(field, &path)?;
    Ok(path)
}

pub fn write_vorticity<P>(field: &VorticityField, path: P) -> io::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!(step = field.time_step, path = %path.display(), "writing vorticity snapshot");
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{} {}", field.nx, field.ny)?;
    for value in &field.values {
        writeln!(file, "{value:>16.8e}")?;
    }
    file.flush()?;
    Ok(())
}

pub fn read_vorticity<P>(path: P, time_step: usize) -> io::Result<VorticityField>
where
    P: AsRef<Path>,
{
    let invalid = |message: String| io::Error::new(io::ErrorKind::InvalidData, message);
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();
    let header = lines
        .next()
        .ok_or_else(|| invalid("empty vorticity file".to_string()))??;
    let dimensions = header
        .split_whitespace()
        .map(|x| x.parse::<usize>())
        .collect::<Result<Vec<usize>, _>>()
        .map_err(|e| invalid(format!("invalid vorticity header {header:?}: {e}")))?;
    let [nx, ny] = dimensions[..] else {
        return Err(invalid(format!("invalid vorticity header {header:?}")));
    };
    let mut values = Vec::with_capacity(nx * ny);
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line
            .parse::<Float>()
            .map_err(|e| invalid(format!("invalid vorticity value {line:?}: {e}")))?;
        values.push(value);
    }
    if values.len() != nx * ny {
        return Err(invalid(format!(
            "expected {} vorticity values, found {}",
            nx * ny,
            values.len()
        )));
    }
    Ok(VorticityField {
        time_step,
        nx,
        ny,
        values,
    })
}
