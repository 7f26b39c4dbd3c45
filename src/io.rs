use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const DATA_PATH: &'static str = "./data";

pub const PRE_PROCESSING_PATH: &'static str = "./pre_processing";

pub const CASE_SETUP_FILE: &'static str = "case_setup.jou";

pub const POST_PROCESSING_PATH: &'static str = "./post_processing";

pub const VTK_PATH: &'static str = "./post_processing/vtk_files";

pub const VORTICITY_FILE: &'static str = "vorticity.dat";

pub const BENCHMARK_FILE: &'static str = "benchmark_elapsed_time.dat";

pub fn create_case_directories() -> io::Result<()> {
    let list_of_paths = [
        DATA_PATH,
        PRE_PROCESSING_PATH,
        POST_PROCESSING_PATH,
        VTK_PATH,
    ];
    for path_str in list_of_paths {
        let path = Path::new(path_str);
        if !path.exists() {
            info!("Creating the {path_str} path.");
            fs::create_dir_all(path)?;
        } else {
            debug!("The {path_str} path already exists.");
        }
    }
    Ok(())
}

pub fn read_case_setup() -> io::Result<Option<HashMap<String, String>>> {
    let path = Path::new(PRE_PROCESSING_PATH).join(CASE_SETUP_FILE);
    read_parameters_file(path)
}

pub fn read_parameters_file<P>(path: P) -> io::Result<Option<HashMap<String, String>>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    info!("Reading the case setup file: {}.", path.display());
    let contents = fs::read_to_string(path)?;
    Ok(Some(extract_parameters(&contents)))
}

pub fn extract_parameters(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.starts_with("#"))
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(2, "=");
            let key = parts.next()?.trim().to_string();
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((key, value))
        })
        .collect::<HashMap<String, String>>()
}

pub fn write_inside_loop_elapsed_time(
    elapsed_times: &[(&str, Duration)],
    time_step: &usize,
) -> io::Result<()> {
    let path = Path::new(POST_PROCESSING_PATH).join(BENCHMARK_FILE);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if *time_step == 1 {
        write!(file, "{:>8}", "step")?;
        for (key, _) in elapsed_times {
            write!(file, " {:>16}", key)?;
        }
        writeln!(file)?;
    }
    write!(file, "{:>8}", time_step)?;
    for (_, value) in elapsed_times {
        write!(file, " {:>16.8e}", value.as_secs_f64())?;
    }
    writeln!(file)?;
    Ok(())
}

/// Runs `f` with a plain-text subscriber installed on this thread and returns what it logged.
#[cfg(test)]
pub(crate) fn capture_logs<F>(f: F) -> String
where
    F: FnOnce(),
{
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
