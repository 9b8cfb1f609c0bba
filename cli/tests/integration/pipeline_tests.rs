//! Full runs of the binary against a fake `git` placed first on `PATH`.
//!
//! The fake answers the handful of git invocations the bootstrap makes and
//! "clones" by copying a fixture installer into the workspace. Setting
//! `SLOW_CLONE` to a file path makes the clone hang instead, writing the pid
//! of a forked helper to that file.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

const FAKE_GIT: &str = r#"#!/bin/sh
case "$1" in
  --version)
    echo "git version 2.43.0"
    ;;
  clone)
    for last; do :; done
    if [ -n "$SLOW_CLONE" ]; then
      sleep 30 &
      echo $! > "$SLOW_CLONE"
      wait
      exit 1
    fi
    mkdir -p "$last/.git"
    cp "$FIXTURE" "$last/install-kiro.sh"
    ;;
  -C)
    case "$3" in
      rev-parse) echo .git ;;
      config) echo https://github.com/kirodotdev/kiro-installer ;;
      *) exit 1 ;;
    esac
    ;;
  *)
    exit 1
    ;;
esac
"#;

struct FakeHost {
    bin: TempDir,
    scratch: TempDir,
    work: TempDir,
}

impl FakeHost {
    fn new() -> Self {
        let bin = TempDir::new().expect("bin dir");
        let git = bin.path().join("git");
        fs::write(&git, FAKE_GIT).expect("write fake git");
        fs::set_permissions(&git, fs::Permissions::from_mode(0o755)).expect("chmod fake git");
        Self {
            bin,
            scratch: TempDir::new().expect("scratch dir"),
            work: TempDir::new().expect("work dir"),
        }
    }

    fn command(&self) -> Command {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let mut dirs = vec![self.bin.path().to_path_buf()];
        dirs.extend(std::env::split_paths(&inherited));

        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kiro-bootstrap"));
        cmd.env("PATH", std::env::join_paths(dirs).expect("join PATH"))
            .env("TMPDIR", self.scratch.path())
            .env("NO_COLOR", "1")
            .env_remove("KIRO_BOOTSTRAP_LOG")
            .env_remove("SLOW_CLONE")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// Write a bash installer that records its arguments to `args_out`.
    fn installer_fixture(&self, args_out: &Path) -> std::path::PathBuf {
        let fixture = self.work.path().join("fixture.sh");
        let script = format!(
            "#!/bin/bash\nprintf '%s\\n' \"$@\" > '{}'\nexit \"${{EXIT_WITH:-0}}\"\n{}",
            args_out.display(),
            "# padding to clear the minimum installer size\n".repeat(30),
        );
        fs::write(&fixture, script).expect("write fixture");
        fixture
    }

    fn scratch_entries(&self) -> Vec<String> {
        fs::read_dir(self.scratch.path())
            .expect("read scratch dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

fn wait_for_pid(pidfile: &Path) -> i32 {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Ok(text) = fs::read_to_string(pidfile)
            && let Ok(pid) = text.trim().parse()
        {
            return pid;
        }
        sleep(Duration::from_millis(20));
    }
    panic!("clone never started: no pid in {}", pidfile.display());
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> ExitStatus {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().expect("poll bootstrap") {
            return status;
        }
        sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    panic!("bootstrap did not exit within {limit:?}");
}

/// `true` once `pid` has exited (gone, or a zombie awaiting its reaper).
#[cfg(target_os = "linux")]
fn process_gone(pid: i32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
            return true;
        };
        if stat.rsplit(')').next().unwrap_or_default().trim_start().starts_with('Z') {
            return true;
        }
        sleep(Duration::from_millis(50));
    }
    false
}

fn interrupt_mid_clone(sig: Signal) {
    let host = FakeHost::new();
    let pidfile = host.work.path().join("clone.pid");
    let mut child = host
        .command()
        .env("SLOW_CLONE", &pidfile)
        .spawn()
        .expect("spawn bootstrap");

    let helper = wait_for_pid(&pidfile);
    assert_eq!(host.scratch_entries().len(), 1, "workspace should exist mid-clone");

    let pid = Pid::from_raw(i32::try_from(child.id()).unwrap());
    signal::kill(pid, sig).expect("deliver signal");
    let status = wait_with_deadline(&mut child, Duration::from_secs(10));

    assert_eq!(status.code(), Some(130));
    assert!(
        host.scratch_entries().is_empty(),
        "workspace left behind: {:?}",
        host.scratch_entries()
    );
    #[cfg(target_os = "linux")]
    assert!(process_gone(helper), "clone helper outlived the bootstrap");
    #[cfg(not(target_os = "linux"))]
    let _ = helper;
}

// --- Interruption ---

#[test]
fn test_sigterm_during_clone_removes_workspace_and_exits_130() {
    interrupt_mid_clone(Signal::SIGTERM);
}

#[test]
fn test_sigint_during_clone_removes_workspace_and_exits_130() {
    interrupt_mid_clone(Signal::SIGINT);
}

// --- Successful runs ---

#[test]
fn test_arguments_reach_installer_verbatim_including_double_dash() {
    let host = FakeHost::new();
    let args_out = host.work.path().join("args");
    let fixture = host.installer_fixture(&args_out);

    let status = host
        .command()
        .env("FIXTURE", &fixture)
        .args(["--", "--user", "two words"])
        .status()
        .expect("run bootstrap");

    assert_eq!(status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(&args_out).expect("installer ran"),
        "--\n--user\ntwo words\n"
    );
    assert!(host.scratch_entries().is_empty(), "workspace left behind");
}

#[test]
fn test_installer_exit_code_is_propagated() {
    let host = FakeHost::new();
    let args_out = host.work.path().join("args");
    let fixture = host.installer_fixture(&args_out);

    let status = host
        .command()
        .env("FIXTURE", &fixture)
        .env("EXIT_WITH", "7")
        .arg("--uninstall")
        .status()
        .expect("run bootstrap");

    assert_eq!(status.code(), Some(7));
    assert_eq!(fs::read_to_string(&args_out).unwrap(), "--uninstall\n");
    assert!(host.scratch_entries().is_empty(), "workspace left behind");
}
