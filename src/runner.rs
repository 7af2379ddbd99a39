use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::{
    config::{runtime_budget, ExperimentConfig, Mode},
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Solver exited cleanly; its output file is ready to scan.
    Completed { output: PathBuf, wall_time: Duration },
    Failed { code: Option<i32>, stderr: String },
    TimedOut { after: Duration },
}

/// Configures the build directory and creates the results folder.
pub fn initialise(config: &ExperimentConfig) -> Result<()> {
    if !config.configure_command.is_empty() {
        run_step("Configure", &config.configure_command, &config.build_dir)?;
    }
    fs::create_dir_all(&config.results_dir)?;
    info!(results = %config.results_dir.display(), "initialised results folder");
    Ok(())
}

/// Rebuilds the solver against the current instance file.
pub fn build(config: &ExperimentConfig) -> Result<()> {
    run_step("Build", &config.build_command, &config.build_dir)
}

fn run_step(step: &str, command: &[String], dir: &Path) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::InvalidConfig(format!("{} command is empty", step)))?;
    debug!(step, ?command, dir = %dir.display(), "running");
    let output = Command::new(program).args(args).current_dir(dir).output()?;
    if !output.status.success() {
        return Err(Error::BuildFailed {
            step: step.to_string(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Arguments the solver binary gets for an instance of `nodes` nodes.
pub fn solver_args(mode: Mode, nodes: usize) -> Vec<String> {
    match mode {
        Mode::Set => Vec::new(),
        _ => vec!["--runtime".to_string(), runtime_budget(nodes).to_string()],
    }
}

/// Runs the solver once under the configured deadline. Standard output goes
/// straight to `CTPInstance_<nodes>_<trial>.txt`; on success standard error
/// and the instance file are appended to it.
pub fn run_instance(
    config: &ExperimentConfig,
    nodes: usize,
    trial: usize,
    args: &[String],
) -> Result<RunOutcome> {
    let (program, solver_args) = config
        .solver
        .split_first()
        .ok_or_else(|| Error::InvalidConfig("solver command is empty".to_string()))?;
    let outfile = config.output_file(nodes, trial);
    let stdout = File::create(&outfile)?;

    info!(nodes, trial, ?args, "running solver");
    let start = Instant::now();
    let mut command = Command::new(program);
    command
        .args(solver_args)
        .args(args)
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::piped());
    own_process_group(&mut command);
    let mut child = command.spawn()?;

    // drained on a thread so a chatty solver cannot block on a full pipe
    let mut stderr_pipe = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    });

    let status = match child.wait_timeout(config.timeout)? {
        Some(status) => status,
        None => {
            kill_process_group(&mut child)?;
            child.wait()?;
            // not joined: a process that left the group may still hold the pipe
            drop(stderr_reader);
            let after = start.elapsed();
            println!("INSTANCE {}_{} TIMED OUT", nodes, trial);
            warn!(nodes, trial, seconds = after.as_secs_f64(), "solver exceeded deadline");
            return Ok(RunOutcome::TimedOut { after });
        }
    };
    let wall_time = start.elapsed();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        println!("INSTANCE {}_{} FAILED", nodes, trial);
        println!("{}", stderr);
        warn!(nodes, trial, code = ?status.code(), "solver failed");
        return Ok(RunOutcome::Failed {
            code: status.code(),
            stderr,
        });
    }

    let instance = fs::read_to_string(&config.graph_file)?;
    let mut output = OpenOptions::new().append(true).open(&outfile)?;
    writeln!(output, "{}", stderr)?;
    writeln!(output, "Wall time: {:.3} s", wall_time.as_secs_f64())?;
    writeln!(output)?;
    output.write_all(instance.as_bytes())?;

    Ok(RunOutcome::Completed {
        output: outfile,
        wall_time,
    })
}

/// Wrapper scripts fork the real solver, so the deadline has to reach the
/// whole group rather than just the direct child.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) -> io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = io::Error::last_os_error();
        // group already gone
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) -> io::Result<()> {
    child.kill()
}
