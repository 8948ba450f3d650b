//! End-to-end bootstrap pipeline tests against a synthetic bundle.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use runlet::cleanup::CleanupManager;
use runlet::config::load_launch_config;
use runlet::error::RunletError;
use runlet::extract::ArchiveExtractor;
use runlet::launch::{build_invocation, write_deps_config, SubprocessRuntime, WorkloadRuntime};
use runlet::locate::RuntimeLocator;
use runlet::scratch::ScratchDir;

use zip::write::FileOptions;

fn write_bundle(path: &Path, conf: &str) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);

    writer
        .start_file("runtime-core-1.0.jar", FileOptions::default())
        .unwrap();
    writer.write_all(b"core payload").unwrap();

    writer
        .start_file("runtime-stdlib-1.0.jar", FileOptions::default())
        .unwrap();
    writer.write_all(b"stdlib payload").unwrap();

    writer
        .start_file("runlet.conf", FileOptions::default())
        .unwrap();
    writer.write_all(conf.as_bytes()).unwrap();

    writer
        .add_directory("app_root", FileOptions::default())
        .unwrap();
    writer
        .start_file("app_root/config.ru", FileOptions::default())
        .unwrap();
    writer.write_all(b"run App\n").unwrap();

    writer
        .add_directory("deps", FileOptions::default())
        .unwrap();

    writer.finish().unwrap();
}

#[test]
fn bootstrap_produces_the_documented_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.zip");
    write_bundle(&bundle, "target=app/start\nparams=--flag\n");

    let scratch = ScratchDir::create().unwrap();
    ArchiveExtractor::new()
        .extract(&bundle, scratch.path())
        .unwrap();

    let components = RuntimeLocator::with_suffix(".jar")
        .locate(scratch.path())
        .unwrap();
    assert_eq!(
        components.core.file_name().unwrap(),
        "runtime-core-1.0.jar"
    );
    assert_eq!(
        components.stdlib.file_name().unwrap(),
        "runtime-stdlib-1.0.jar"
    );

    let config = load_launch_config(scratch.path()).unwrap();
    let invocation = build_invocation(&config, &["foo".to_string()], &scratch);

    assert_eq!(invocation.argv, vec!["app/start", "--flag", "foo"]);
    assert_eq!(invocation.workdir, scratch.path().join("app_root"));

    write_deps_config(&scratch.app_root(), &scratch.deps_dir()).unwrap();
    assert!(scratch.app_root().join(".deps/config").is_file());

    let manager = CleanupManager::new(scratch.path().to_path_buf(), false);
    assert!(manager.run());
    assert!(!scratch.path().exists());
}

#[test]
fn missing_target_fails_before_any_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.zip");
    write_bundle(&bundle, "params=--flag\n");

    let scratch = ScratchDir::create().unwrap();
    ArchiveExtractor::new()
        .extract(&bundle, scratch.path())
        .unwrap();

    let err = load_launch_config(scratch.path()).unwrap_err();
    assert!(matches!(
        err,
        RunletError::MissingRequiredConfig { key, .. } if key == "target"
    ));

    // No invocation was attempted, so no dependency-manager config exists.
    assert!(!scratch.app_root().join(".deps/config").exists());

    CleanupManager::new(scratch.path().to_path_buf(), false).run();
    assert!(!scratch.path().exists());
}

#[tokio::test]
async fn scratch_is_cleaned_after_invocation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.zip");
    write_bundle(&bundle, "target=app/start\n");

    let scratch = ScratchDir::create().unwrap();
    ArchiveExtractor::new()
        .extract(&bundle, scratch.path())
        .unwrap();

    let config = load_launch_config(scratch.path()).unwrap();
    let invocation = build_invocation(&config, &[], &scratch);

    // The extracted core component is not an executable, so spawning fails.
    let components = RuntimeLocator::with_suffix(".jar")
        .locate(scratch.path())
        .unwrap();
    let runtime = SubprocessRuntime::new(components.core);
    let err = runtime.invoke(&invocation).await.unwrap_err();
    assert!(matches!(err, RunletError::Invocation(_)));

    let manager = Arc::new(CleanupManager::new(scratch.path().to_path_buf(), false));
    assert!(manager.run());
    assert!(!scratch.path().exists());
    assert!(!manager.run());
}

#[cfg(unix)]
#[test]
fn forced_termination_cleans_the_scratch_directory_and_exits_130() {
    use std::io::{BufRead, BufReader};
    use std::process::{Command, Stdio};

    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.zip");

    // Core component announces itself, then blocks long enough to be
    // interrupted.
    let file = File::create(&bundle).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(
            "runtime-core-1.0",
            FileOptions::default().unix_permissions(0o755),
        )
        .unwrap();
    writer
        .write_all(b"#!/bin/sh\necho started\nsleep 30\n")
        .unwrap();
    writer
        .start_file("runtime-stdlib-1.0", FileOptions::default())
        .unwrap();
    writer.write_all(b"stdlib").unwrap();
    writer
        .start_file("runlet.conf", FileOptions::default())
        .unwrap();
    writer.write_all(b"target=app/start\n").unwrap();
    writer
        .add_directory("app_root", FileOptions::default())
        .unwrap();
    writer.finish().unwrap();

    // Private temp root so the launch's scratch directory is the only
    // runlet-* entry we can observe.
    let temp_root = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_runlet"))
        .arg("--bundle")
        .arg(&bundle)
        .env("TMPDIR", temp_root.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // The workload's relayed output proves the pipeline reached invocation,
    // so the termination handler has long been registered.
    let mut reader = BufReader::new(child.stdout.take().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line.trim(), "started");

    let scratch_entries = |root: &Path| -> Vec<String> {
        std::fs::read_dir(root)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| name.starts_with("runlet-"))
                    .collect()
            })
            .unwrap_or_default()
    };
    assert_eq!(scratch_entries(temp_root.path()).len(), 1);

    Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(runlet::INTERRUPTED_CODE));
    assert!(scratch_entries(temp_root.path()).is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn subprocess_invocation_runs_from_the_app_root_and_mirrors_status() {
    use std::os::unix::fs::PermissionsExt as _;

    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.zip");

    // Core component is a shell script (executable bit carried by the
    // archive) that proves cwd and argv, then fails with a known status.
    let file = File::create(&bundle).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(
            "runtime-core-1.0",
            FileOptions::default().unix_permissions(0o755),
        )
        .unwrap();
    writer
        .write_all(b"#!/bin/sh\necho \"$(basename $PWD) $@\"\nexit 4\n")
        .unwrap();
    writer
        .start_file("runtime-stdlib-1.0", FileOptions::default())
        .unwrap();
    writer.write_all(b"stdlib").unwrap();
    writer
        .start_file("runlet.conf", FileOptions::default())
        .unwrap();
    writer.write_all(b"target=app/start\nparams=--flag\n").unwrap();
    writer
        .add_directory("app_root", FileOptions::default())
        .unwrap();
    writer.finish().unwrap();

    let scratch = ScratchDir::create().unwrap();
    ArchiveExtractor::new()
        .extract(&bundle, scratch.path())
        .unwrap();

    let mode = std::fs::metadata(scratch.path().join("runtime-core-1.0"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111, "executable bit restored");

    let components = RuntimeLocator::with_suffix("").locate(scratch.path()).unwrap();
    let config = load_launch_config(scratch.path()).unwrap();
    let invocation = build_invocation(&config, &["foo".to_string()], &scratch);

    let runtime = SubprocessRuntime::new(components.core);
    let outcome = runtime.invoke(&invocation).await.unwrap();
    assert_eq!(outcome.code, 4);

    CleanupManager::new(scratch.path().to_path_buf(), false).run();
    assert!(!scratch.path().exists());
}
