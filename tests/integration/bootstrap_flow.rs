//! Integration tests for the startup state machine.
//!
//! Covers the auto-login and interactive sign-in paths, the exit-code
//! contract (0 = cancelled, 1 = invalid selection, otherwise the main
//! loop's own code), and persistence of accepted credential paths.
//!
//! Verification command: `cargo test --test bootstrap_flow`

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parley::bootstrap::{Bootstrap, BootstrapState, MainLoop};
use parley::config::ConfigStore;
use parley::credentials::CredentialPaths;
use parley::login::{LoginOutcome, LoginPrompt};
use parley::reactor::ReactorHandle;
use parley_dispatch::{Bridge, CondvarWaker, MainLoopWaker};

// =============================================================================
// Test doubles
// =============================================================================

/// Prompt that returns a scripted outcome and counts invocations.
struct ScriptedPrompt {
    outcome: Option<LoginOutcome>,
    invocations: Arc<AtomicUsize>,
}

impl ScriptedPrompt {
    fn new(outcome: LoginOutcome) -> (Self, Arc<AtomicUsize>) {
        let invocations = Arc::new(AtomicUsize::new(0));
        (
            Self {
                outcome: Some(outcome),
                invocations: Arc::clone(&invocations),
            },
            invocations,
        )
    }
}

impl LoginPrompt for ScriptedPrompt {
    fn prompt(&mut self, _initial: &CredentialPaths) -> io::Result<LoginOutcome> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.take().unwrap_or(LoginOutcome::Cancelled))
    }
}

/// Headless main loop: waits for the reactor's startup liveness probe to
/// cross the bridge, then exits with a fixed code.
struct HeadlessLoop {
    waker: Arc<CondvarWaker>,
    exit_code: i32,
    ran: Arc<AtomicBool>,
}

impl HeadlessLoop {
    fn new(exit_code: i32) -> (Self, Arc<AtomicBool>) {
        let ran = Arc::new(AtomicBool::new(false));
        (
            Self {
                waker: Arc::new(CondvarWaker::new()),
                exit_code,
                ran: Arc::clone(&ran),
            },
            ran,
        )
    }
}

impl MainLoop for HeadlessLoop {
    fn waker(&self) -> Arc<dyn MainLoopWaker> {
        Arc::clone(&self.waker) as Arc<dyn MainLoopWaker>
    }

    fn run(&mut self, bridge: Arc<Bridge>, _reactor: ReactorHandle) -> i32 {
        self.ran.store(true, Ordering::SeqCst);

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut drained = 0;
        while drained == 0 {
            assert!(Instant::now() < deadline, "liveness probe never arrived");
            self.waker.wait(Duration::from_millis(20));
            drained += bridge.drain();
        }
        self.exit_code
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Write `user.key` and `user.cert` into `dir`, returning their paths.
fn write_credentials(dir: &Path) -> (PathBuf, PathBuf) {
    let key = dir.join("user.key");
    let cert = dir.join("user.cert");
    std::fs::write(&key, b"-----KEY-----").unwrap();
    std::fs::write(&cert, b"-----CERT-----").unwrap();
    (key, cert)
}

fn write_config(dir: &Path, contents: &str) {
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

// =============================================================================
// Scenario B: auto-login with valid credentials
// =============================================================================

#[test]
fn auto_login_with_valid_credentials_never_prompts() {
    let dir = tempfile::tempdir().unwrap();
    write_credentials(dir.path());
    write_config(dir.path(), "[global]\nauto_login = true\n");

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, ran) = HeadlessLoop::new(7);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.state(), BootstrapState::Unconfigured);
    assert_eq!(bootstrap.run(), 7);
    assert_eq!(bootstrap.state(), BootstrapState::ShuttingDown);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn auto_login_honors_explicitly_configured_paths() {
    let app_dir = tempfile::tempdir().unwrap();
    let cred_dir = tempfile::tempdir().unwrap();
    let (key, cert) = write_credentials(cred_dir.path());
    write_config(
        app_dir.path(),
        &format!(
            "[global]\nauto_login = true\nkey = \"{}\"\ncert = \"{}\"\n",
            key.display(),
            cert.display()
        ),
    );

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, _ran) = HeadlessLoop::new(0);
    let mut bootstrap = Bootstrap::new(app_dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.run(), 0);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Scenario C: auto-login disabled
// =============================================================================

#[test]
fn disabled_auto_login_always_prompts_even_with_valid_files() {
    let dir = tempfile::tempdir().unwrap();
    let (key, cert) = write_credentials(dir.path());
    write_config(dir.path(), "[global]\nauto_login = false\n");

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Accepted { key, cert });
    let (main_loop, ran) = HeadlessLoop::new(3);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.run(), 3);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn missing_auto_login_key_defaults_to_prompting() {
    let dir = tempfile::tempdir().unwrap();
    write_credentials(dir.path());

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, _ran) = HeadlessLoop::new(0);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    bootstrap.run();
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[test]
fn forced_prompt_overrides_auto_login() {
    let dir = tempfile::tempdir().unwrap();
    write_credentials(dir.path());
    write_config(dir.path(), "[global]\nauto_login = true\n");

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, _ran) = HeadlessLoop::new(0);
    let mut bootstrap =
        Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop).with_forced_prompt(true);

    bootstrap.run();
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Scenarios D and E: prompt outcomes
// =============================================================================

#[test]
fn cancelled_prompt_exits_with_code_zero() {
    let dir = tempfile::tempdir().unwrap();

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, ran) = HeadlessLoop::new(5);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.run(), 0);
    assert_eq!(bootstrap.state(), BootstrapState::ShuttingDown);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn accepted_paths_with_missing_cert_exit_with_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("user.key");
    std::fs::write(&key, b"-----KEY-----").unwrap();

    let (prompt, _invocations) = ScriptedPrompt::new(LoginOutcome::Accepted {
        key,
        cert: dir.path().join("nonexistent.cert"),
    });
    let (main_loop, ran) = HeadlessLoop::new(5);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.run(), 1);
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn accepted_paths_with_missing_key_exit_with_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("user.cert");
    std::fs::write(&cert, b"-----CERT-----").unwrap();

    let (prompt, _invocations) = ScriptedPrompt::new(LoginOutcome::Accepted {
        key: dir.path().join("nonexistent.key"),
        cert,
    });
    let (main_loop, _ran) = HeadlessLoop::new(5);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.run(), 1);
}

// =============================================================================
// Fallback and persistence
// =============================================================================

#[test]
fn failed_auto_login_falls_back_to_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    // Key exists, certificate does not: fail-closed, so prompt.
    std::fs::write(dir.path().join("user.key"), b"-----KEY-----").unwrap();
    write_config(dir.path(), "[global]\nauto_login = true\n");

    let (prompt, invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, _ran) = HeadlessLoop::new(0);
    let mut bootstrap = Bootstrap::new(dir.path().to_path_buf(), prompt, main_loop);

    assert_eq!(bootstrap.run(), 0);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[test]
fn accepted_paths_are_persisted_for_the_next_start() {
    let app_dir = tempfile::tempdir().unwrap();
    let cred_dir = tempfile::tempdir().unwrap();
    let (key, cert) = write_credentials(cred_dir.path());

    let (prompt, _invocations) = ScriptedPrompt::new(LoginOutcome::Accepted {
        key: key.clone(),
        cert: cert.clone(),
    });
    let (main_loop, _ran) = HeadlessLoop::new(0);
    let mut bootstrap = Bootstrap::new(app_dir.path().to_path_buf(), prompt, main_loop);
    bootstrap.run();

    let cfg = ConfigStore::open(app_dir.path().join("config.toml"));
    assert_eq!(cfg.get::<String>("global.key"), key.display().to_string());
    assert_eq!(cfg.get::<String>("global.cert"), cert.display().to_string());
}

#[test]
fn application_directory_is_created_when_absent() {
    let parent = tempfile::tempdir().unwrap();
    let app_dir = parent.path().join("parley");

    let (prompt, _invocations) = ScriptedPrompt::new(LoginOutcome::Cancelled);
    let (main_loop, _ran) = HeadlessLoop::new(0);
    let mut bootstrap = Bootstrap::new(app_dir.clone(), prompt, main_loop);
    bootstrap.run();

    assert!(app_dir.is_dir());
}
