//! AMG mesh adaptation tool

use async_trait::async_trait;
use tracing::{debug, info};

use super::process::{Invocation, ProcessRunner, ToolCommand};
use super::{AdaptRequest, MeshAdapter};
use crate::error::AdaptError;

/// Metric norm passed to AMG
const METRIC_NORM: &str = "2";

/// Adapter for the `amg` executable
#[derive(Debug, Clone)]
pub struct AmgAdapter {
    runner: ProcessRunner,
    program: String,
}

impl AmgAdapter {
    pub fn new(runner: ProcessRunner, program: impl Into<String>) -> Self {
        let program = program.into();
        debug!(%program, "AmgAdapter::new: called");
        Self { runner, program }
    }

    /// Command line for one adaptation call
    pub fn command(&self, request: &AdaptRequest) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.as_str(), &request.work_dir, &request.log)
            .arg("-in")
            .arg(request.mesh_in.display().to_string())
            .arg("-sol")
            .arg(request.sensor_in.display().to_string())
            .args(["-p", METRIC_NORM])
            .arg("-c")
            .arg(format!("{:.6}", request.complexity))
            .arg("-hgrad")
            .arg(format!("{:.2}", request.gradation))
            .arg("-hmin")
            .arg(format!("{:e}", request.min_edge_length))
            .arg("-hmax")
            .arg(format!("{:e}", request.max_edge_length))
            .arg("-out")
            .arg(request.mesh_out.display().to_string())
            .arg("-itp")
            .arg(request.restart_in.display().to_string());

        if let Some(back) = &request.back_mesh {
            cmd = cmd.arg("-back").arg(back.display().to_string());
        }
        if let Some(source) = &request.source_metric {
            cmd = cmd.arg("-src").arg(source.display().to_string());
        }
        cmd
    }
}

#[async_trait]
impl MeshAdapter for AmgAdapter {
    async fn invoke(&self, request: &AdaptRequest) -> Result<Invocation, AdaptError> {
        let cmd = self.command(request);
        info!("Running AMG, log: {}", request.log.display());
        self.runner.run(&cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn request(work: &Path) -> AdaptRequest {
        AdaptRequest {
            mesh_in: work.join("current.meshb"),
            sensor_in: work.join("current_sensor.solb"),
            restart_in: work.join("current_restart.solb"),
            complexity: 2000.0,
            gradation: 3.0,
            min_edge_length: 1e-6,
            max_edge_length: 1e300,
            back_mesh: None,
            source_metric: None,
            mesh_out: work.join("current.new.meshb"),
            interpolated_out: work.join("current_restart.itp.solb"),
            log: work.join("AMG.1.2000.job"),
            work_dir: work.to_path_buf(),
        }
    }

    #[test]
    fn test_command_template() {
        let work = PathBuf::from("/case/ADAP");
        let amg = AmgAdapter::new(ProcessRunner::default(), "amg");

        let line = amg.command(&request(&work)).command_line();

        assert_eq!(
            line,
            "amg -in /case/ADAP/current.meshb -sol /case/ADAP/current_sensor.solb -p 2 -c 2000.000000 \
             -hgrad 3.00 -hmin 1e-6 -hmax 1e300 -out /case/ADAP/current.new.meshb \
             -itp /case/ADAP/current_restart.solb > /case/ADAP/AMG.1.2000.job"
        );
    }

    #[test]
    fn test_optional_back_and_source() {
        let work = PathBuf::from("/case/ADAP");
        let mut req = request(&work);
        req.back_mesh = Some(PathBuf::from("/case/back.meshb"));
        req.source_metric = Some(PathBuf::from("/case/adap.source"));
        let amg = AmgAdapter::new(ProcessRunner::default(), "amg");

        let cmd = amg.command(&req);
        let args = cmd.arguments();
        let back = args.iter().position(|a| a == "-back").unwrap();
        let src = args.iter().position(|a| a == "-src").unwrap();

        assert_eq!(args[back + 1], "/case/back.meshb");
        assert_eq!(args[src + 1], "/case/adap.source");
        assert!(back < src);
    }
}
