//! Full runs against small shell scripts standing in for AMG and SU2
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;

use meshadapt::{AdaptError, AdaptationRun, Config, ToolFailure};

const AMG: &str = r#"#!/bin/sh
out=""
itp=""
while [ $# -gt 0 ]; do
  case "$1" in
    -out) out="$2"; shift 2 ;;
    -itp) itp="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "adapting to $out"
echo mesh > "$out"
echo field > "${itp%.solb}.itp.solb"
"#;

/// Exits 0 but never writes the interpolated field
const AMG_NO_ITP: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -out) echo mesh > "$2"; shift 2 ;;
    *) shift ;;
  esac
done
"#;

const SU2: &str = r#"#!/bin/sh
restart=$(sed -n 's/^RESTART_FLOW_FILENAME= *//p' "$1")
echo "solving into $restart"
echo restart > "$restart"
echo sensor > mach.solb
echo "Iteration,Res" > history.dat
"#;

fn install(dir: &Path, name: &str, script: &str) {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn case(amg: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).unwrap();
    install(&bin, "amg", amg);
    install(&bin, "SU2_CFD", SU2);
    fs::write(temp.path().join("mesh.meshb"), "mesh").unwrap();
    fs::write(
        temp.path().join("case.cfg"),
        "ADAP_COMPLEXITIES= (500, 1000)\nADAP_SUBITE= (1, 1)\nADAP_PATH= bin\nMESH_FILENAME= mesh.meshb\n",
    )
    .unwrap();
    temp
}

#[tokio::test]
async fn test_run_with_script_tools() {
    let temp = case(AMG);
    let work = temp.path().join("ADAP");

    let summary = AdaptationRun::load(Config::default(), &temp.path().join("case.cfg"))
        .unwrap()
        .with_warn(false)
        .execute()
        .await
        .unwrap();

    assert_eq!(summary.iterations, 2);
    assert!(work.join("ite.1.500.meshb").is_file());
    assert!(work.join("ite.2.1000_history.dat").is_file());
    assert!(work.join("SU2.2.1000.cfg").is_file());
    assert!(work.join("initial_solution").join("SU2_ini.job").is_file());

    let amg_log = fs::read_to_string(work.join("AMG.2.1000.job")).unwrap();
    assert!(amg_log.contains("current.new.meshb"));
    let cfg = fs::read_to_string(work.join("SU2.2.1000.cfg")).unwrap();
    assert!(cfg.contains("RESTART_SOL= YES"));
    assert!(cfg.contains("MESH_FORMAT= INRIA"));
}

#[tokio::test]
async fn test_script_exit_zero_without_outputs_fails() {
    let temp = case(AMG_NO_ITP);

    let err = AdaptationRun::load(Config::default(), &temp.path().join("case.cfg"))
        .unwrap()
        .with_warn(false)
        .execute()
        .await
        .unwrap_err();

    match err {
        AdaptError::Tool(ToolFailure::InterpolationMissing { iteration, command, .. }) => {
            assert_eq!(iteration, 1);
            assert!(command.contains("-c 500.000000"));
            assert!(command.contains(&temp.path().join("bin").join("amg").display().to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
