use crate::d2q9::io::{read_vorticity, snapshot_path};
use crate::d2q9::post::VorticityField;
use crate::d2q9::SimulationConfig;
use crate::error::SimulationResult;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Interior points start one lattice unit away from the domain origin.
pub fn write_vorticity_vtk<P>(field: &VorticityField, path: P) -> io::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!(step = field.time_step, path = %path.display(), "writing vorticity vtk");
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "# vtk DataFile Version 3.0")?;
    writeln!(file, "LBM vorticity, time step {}", field.time_step)?;
    writeln!(file, "ASCII")?;
    writeln!(file, "DATASET STRUCTURED_POINTS")?;
    writeln!(file, "DIMENSIONS {} {} 1", field.nx, field.ny)?;
    writeln!(file, "ORIGIN 1 1 0")?;
    writeln!(file, "SPACING 1 1 1")?;
    writeln!(file, "POINT_DATA {}", field.nx * field.ny)?;
    writeln!(file, "SCALARS vorticity float 1")?;
    writeln!(file, "LOOKUP_TABLE default")?;
    for value in &field.values {
        writeln!(file, "{value:>.6e}")?;
    }
    file.flush()?;
    Ok(())
}

fn read_data_directory() -> io::Result<Vec<usize>> {
    let mut time_steps = Vec::new();
    let path = Path::new(crate::io::DATA_PATH);
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Ok(time_step) = entry.file_name().to_string_lossy().parse::<usize>() {
                if snapshot_path(time_step).exists() {
                    time_steps.push(time_step);
                }
            }
        }
    }
    time_steps.sort_unstable();
    Ok(time_steps)
}

pub fn run_vtk_post_processing() -> SimulationResult<()> {
    crate::io::create_case_directories()?;
    let config = SimulationConfig::build_case_setup()?;
    let case_name = config.case_name.replace(" ", "_").to_lowercase();
    let time_steps = read_data_directory()?;
    info!(snapshots = time_steps.len(), "converting vorticity snapshots to vtk");
    time_steps.par_iter().try_for_each(|&time_step| -> io::Result<()> {
        let field = read_vorticity(snapshot_path(time_step), time_step)?;
        let path_str = format!("{case_name}_vorticity_{:08}.vtk", time_step);
        let path = Path::new(crate::io::VTK_PATH).join(path_str);
        write_vorticity_vtk(&field, path)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vorticity_vtk_layout() {
        let field = VorticityField {
            time_step: 10,
            nx: 2,
            ny: 2,
            values: vec![1.0, -2.0, 0.5, 0.0],
        };
        let dir = std::env::temp_dir().join(format!("lbm_obstacle_vtk_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("field.vtk");
        colored::control::set_override(true);
        let log = crate::io::capture_logs(|| write_vorticity_vtk(&field, &path).unwrap());
        assert!(log.contains("step=10"), "{log}");
        assert!(!log.contains('\u{1b}'), "{log:?}");
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[3], "DATASET STRUCTURED_POINTS");
        assert_eq!(lines[4], "DIMENSIONS 2 2 1");
        assert_eq!(lines[7], "POINT_DATA 4");
        assert_eq!(lines.len(), 10 + 4);
        assert_eq!(lines[11].trim().parse::<f64>().unwrap(), -2.0);
    }
}
