//! Adaptation cycle tests with in-process fake tools

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use meshadapt::{
    AdaptError, AdaptRequest, AdaptationRun, Config, ConfigError, FlowSolver, Invocation, Journal, MeshAdapter,
    SolverRun, ToolFailure,
};

/// Writes the adapted mesh and, unless told otherwise, the interpolated field
#[derive(Default)]
struct FakeAmg {
    skip_interpolation: bool,
    calls: Mutex<Vec<AdaptRequest>>,
}

#[async_trait]
impl MeshAdapter for FakeAmg {
    async fn invoke(&self, request: &AdaptRequest) -> Result<Invocation, AdaptError> {
        self.calls.lock().unwrap().push(request.clone());
        fs::write(&request.mesh_out, format!("mesh {}", request.complexity)).unwrap();
        if !self.skip_interpolation {
            fs::write(&request.interpolated_out, "interpolated").unwrap();
        }
        Ok(Invocation {
            command: format!("fake-amg -c {}", request.complexity),
            log: request.log.clone(),
            exit_code: Some(0),
        })
    }
}

/// Writes the restart, sensor and history files like the real solver
#[derive(Default)]
struct FakeSu2 {
    /// 1-based call number whose restart is not written
    fail_on_call: Option<usize>,
    skip_sensor: bool,
    calls: Mutex<Vec<SolverRun>>,
}

#[async_trait]
impl FlowSolver for FakeSu2 {
    async fn invoke(&self, run: &SolverRun) -> Result<Invocation, AdaptError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(run.clone());
            calls.len()
        };
        if self.fail_on_call != Some(call) {
            fs::write(&run.restart_out, format!("restart {}", call)).unwrap();
        }
        if !self.skip_sensor {
            fs::write(run.work_dir.join("mach.solb"), format!("sensor {}", call)).unwrap();
        }
        fs::write(run.work_dir.join("history.dat"), "Iteration,Res\n").unwrap();
        Ok(Invocation {
            command: "fake-su2".to_string(),
            log: run.log.clone(),
            exit_code: Some(0),
        })
    }
}

fn case(extra: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("naca0012.meshb"), "initial mesh").unwrap();
    let case_file = temp.path().join("case.cfg");
    fs::write(
        &case_file,
        format!(
            "% adaptation\nADAP_COMPLEXITIES= (1000, 2000)\nADAP_SUBITE= (2, 1)\nMESH_FILENAME= naca0012.meshb\n{}",
            extra
        ),
    )
    .unwrap();
    (temp, case_file)
}

fn load(case_file: &Path) -> AdaptationRun {
    AdaptationRun::load(Config::default(), case_file).unwrap().with_warn(false)
}

#[tokio::test]
async fn test_cold_start_full_schedule() {
    let (temp, case_file) = case("");
    let work = temp.path().join("ADAP");
    let amg = FakeAmg::default();
    let su2 = FakeSu2::default();

    let summary = load(&case_file).execute_with(&amg, &su2).await.unwrap();

    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.archives.len(), 3);
    for name in [
        "ite.1.1000.meshb",
        "ite.1.1000.solb",
        "ite.1.1000_restart.solb",
        "ite.1.1000_history.dat",
        "ite.2.1000.meshb",
        "ite.3.2000.meshb",
        "ite.3.2000_restart.solb",
    ] {
        assert!(work.join(name).is_file(), "missing archive {}", name);
    }
    for name in ["current.meshb", "current_restart.solb", "current_sensor.solb"] {
        assert!(work.join(name).is_file(), "missing current file {}", name);
    }
    for name in [
        "current.new.meshb",
        "current_restart.itp.solb",
        "current.new_ini.solb",
        "current.new_restart.solb",
        "current.new_sensor.solb",
    ] {
        assert!(!work.join(name).exists(), "stale next file {}", name);
    }
    assert_eq!(fs::read_to_string(work.join("current.meshb")).unwrap(), "mesh 2000");
    assert_eq!(fs::read_to_string(work.join("current_restart.solb")).unwrap(), "restart 4");

    let amg_calls = amg.calls.lock().unwrap();
    assert_eq!(amg_calls.len(), 3);
    assert_eq!(amg_calls[0].log, work.join("AMG.1.1000.job"));
    assert_eq!(amg_calls[2].log, work.join("AMG.3.2000.job"));
    assert_eq!(amg_calls[2].complexity, 2000.0);
    assert_eq!(amg_calls[0].back_mesh, None);
    assert_eq!(amg_calls[0].source_metric, None);

    let su2_calls = su2.calls.lock().unwrap();
    assert_eq!(su2_calls.len(), 4);
    assert!(!su2_calls[0].restart_enabled());
    assert_eq!(su2_calls[0].work_dir, work.join("initial_solution"));
    assert_eq!(su2_calls[0].case.get("MESH_FILENAME"), Some(temp.path().join("naca0012.meshb").to_str().unwrap()));
    assert!(su2_calls[1].restart_enabled());
    assert_eq!(su2_calls[1].log, work.join("SU2.1.1000.job"));
    assert_eq!(
        su2_calls[3].case.get("SOLUTION_FLOW_FILENAME"),
        Some(work.join("current.new_ini.solb").to_str().unwrap())
    );

    let journal = Journal::in_dir(&work).read_all().await.unwrap();
    let iterations: Vec<u32> = journal.iter().map(|r| r.global_iteration).collect();
    assert_eq!(iterations, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_interpolation_failure_stops_before_solver() {
    let (temp, case_file) = case("");
    let amg = FakeAmg {
        skip_interpolation: true,
        ..Default::default()
    };
    let su2 = FakeSu2::default();

    let err = load(&case_file).execute_with(&amg, &su2).await.unwrap_err();

    match err {
        AdaptError::Tool(ToolFailure::InterpolationMissing { iteration, command, log }) => {
            assert_eq!(iteration, 1);
            assert_eq!(command, "fake-amg -c 1000");
            assert_eq!(log, temp.path().join("ADAP").join("AMG.1.1000.job"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(amg.calls.lock().unwrap().len(), 1);
    // only the initial solve ran
    assert_eq!(su2.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_solver_failure_keeps_earlier_archives() {
    let (temp, case_file) = case("");
    let work = temp.path().join("ADAP");
    let amg = FakeAmg::default();
    let su2 = FakeSu2 {
        fail_on_call: Some(3),
        ..Default::default()
    };

    let err = load(&case_file).execute_with(&amg, &su2).await.unwrap_err();

    assert!(matches!(
        err,
        AdaptError::Tool(ToolFailure::RestartMissing { iteration: 2, .. })
    ));
    assert!(work.join("ite.1.1000.meshb").is_file());
    assert!(!work.join("ite.2.1000.meshb").exists());
    assert_eq!(Journal::in_dir(&work).read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_initial_solve_failure_is_iteration_zero() {
    let (_temp, case_file) = case("");
    let amg = FakeAmg::default();
    let su2 = FakeSu2 {
        fail_on_call: Some(1),
        ..Default::default()
    };

    let err = load(&case_file).execute_with(&amg, &su2).await.unwrap_err();

    assert!(matches!(
        err,
        AdaptError::Tool(ToolFailure::RestartMissing { iteration: 0, .. })
    ));
    assert!(amg.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_sensor_is_fatal() {
    let (_temp, case_file) = case("");
    let su2 = FakeSu2 {
        skip_sensor: true,
        ..Default::default()
    };

    let err = load(&case_file)
        .execute_with(&FakeAmg::default(), &su2)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdaptError::Tool(ToolFailure::SensorMissing { iteration: 0, .. })
    ));
}

#[tokio::test]
async fn test_warm_start_missing_files_fail_before_any_call() {
    let (temp, case_file) = case(
        "ADAP_RESTART= YES\nADAP_INI_RESTART_FILE= ini_restart.solb\nADAP_INI_SENSOR_FILE= ini_sensor.solb\nADAP_INI_MESH_FILE= naca0012.meshb\n",
    );
    let amg = FakeAmg::default();
    let su2 = FakeSu2::default();

    let err = load(&case_file).execute_with(&amg, &su2).await.unwrap_err();

    match err {
        AdaptError::Config(ConfigError::MissingInitialFiles { missing }) => {
            assert_eq!(
                missing,
                vec![
                    temp.path().join("ini_restart.solb"),
                    temp.path().join("ini_sensor.solb"),
                ]
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(amg.calls.lock().unwrap().is_empty());
    assert!(su2.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_warm_start_skips_initial_solve() {
    let (temp, case_file) = case(
        "ADAP_RESTART= YES\nADAP_INI_RESTART_FILE= ini_restart.solb\nADAP_INI_SENSOR_FILE= ini_sensor.solb\nADAP_INI_MESH_FILE= naca0012.meshb\nADAP_BACK= YES\nADAP_BACK_NAME= naca0012.meshb\n",
    );
    fs::write(temp.path().join("ini_restart.solb"), "warm restart").unwrap();
    fs::write(temp.path().join("ini_sensor.solb"), "warm sensor").unwrap();
    fs::write(temp.path().join("adap.source"), "source").unwrap();
    let amg = FakeAmg::default();
    let su2 = FakeSu2::default();

    let summary = load(&case_file).execute_with(&amg, &su2).await.unwrap();

    assert_eq!(summary.iterations, 3);
    assert_eq!(su2.calls.lock().unwrap().len(), 3);
    let amg_calls = amg.calls.lock().unwrap();
    assert_eq!(amg_calls[0].back_mesh, Some(temp.path().join("naca0012.meshb")));
    assert_eq!(amg_calls[0].source_metric, Some(temp.path().join("adap.source")));
}

#[tokio::test]
async fn test_existing_workspace_is_replaced() {
    let (temp, case_file) = case("");
    let stale = temp.path().join("ADAP").join("ite.9.9000.meshb");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "old run").unwrap();

    load(&case_file)
        .execute_with(&FakeAmg::default(), &FakeSu2::default())
        .await
        .unwrap();

    assert!(!stale.exists());
}
