//! Application startup state machine.
//!
//! Bootstrap owns the lifetimes of the config store, the dispatch bridge,
//! the reactor thread, and the main loop, and decides from configuration
//! and credential availability whether to proceed straight to `Running` or
//! ask for interactive sign-in first. Which components exist is encoded in
//! the current state, not in nullable fields.
//!
//! Exit codes: `0` when the user cancels sign-in, `1` when paths chosen in
//! the prompt fail validation, otherwise whatever the main loop returns.

use std::path::PathBuf;
use std::sync::Arc;

use parley_dispatch::{Bridge, MainLoopWaker};

use crate::config::{CONFIG_FILE, ConfigStore};
use crate::credentials::CredentialPaths;
use crate::login::{LoginOutcome, LoginPrompt};
use crate::reactor::{Reactor, ReactorHandle};

/// The blocking main loop, opaque to bootstrap.
///
/// Bootstrap asks for the loop's wake primitive when wiring the bridge,
/// then calls `run` exactly once; the return value becomes the process
/// exit code.
pub trait MainLoop {
    /// The wake primitive the loop's consumer side honors.
    fn waker(&self) -> Arc<dyn MainLoopWaker>;

    /// Enter the blocking event loop; returns the exit code.
    fn run(&mut self, bridge: Arc<Bridge>, reactor: ReactorHandle) -> i32;
}

/// Phases of application startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing loaded yet.
    Unconfigured,
    /// Configuration is available.
    ConfigLoaded,
    /// Trying the configured credentials without user interaction.
    AutoLoginAttempt,
    /// Interactive sign-in is required.
    AwaitingCredentials,
    /// Credentials validated; ready to start the application proper.
    Authenticated,
    /// The main loop is (or was) running; terminal steady state.
    Running,
    /// Tearing down.
    ShuttingDown,
}

/// Drives startup from `Unconfigured` to `Running` and back down.
pub struct Bootstrap<P, M> {
    state: BootstrapState,
    app_dir: PathBuf,
    prompt: P,
    main_loop: M,
    force_prompt: bool,
}

impl<P: LoginPrompt, M: MainLoop> Bootstrap<P, M> {
    /// Create a bootstrap rooted at `app_dir` (holds `config.toml` and the
    /// default credential files).
    #[must_use]
    pub fn new(app_dir: PathBuf, prompt: P, main_loop: M) -> Self {
        Self {
            state: BootstrapState::Unconfigured,
            app_dir,
            prompt,
            main_loop,
            force_prompt: false,
        }
    }

    /// Always show the sign-in prompt, ignoring `global.auto_login`.
    #[must_use]
    pub const fn with_forced_prompt(mut self, force: bool) -> Self {
        self.force_prompt = force;
        self
    }

    /// Current state, for observation after [`Bootstrap::run`].
    #[must_use]
    pub const fn state(&self) -> BootstrapState {
        self.state
    }

    /// Drive the state machine to completion; returns the process exit
    /// code.
    pub fn run(&mut self) -> i32 {
        let mut cfg = self.load_config();
        self.state = BootstrapState::ConfigLoaded;

        let mut creds = CredentialPaths::resolve(&cfg, &self.app_dir);
        let auto_login = !self.force_prompt && cfg.get::<bool>("global.auto_login");

        let mut authenticated = false;
        if auto_login {
            self.state = BootstrapState::AutoLoginAttempt;
            match creds.validate() {
                Ok(()) => authenticated = true,
                Err(error) => {
                    tracing::info!(%error, "auto-login failed; falling back to interactive sign-in");
                }
            }
        }

        if !authenticated {
            self.state = BootstrapState::AwaitingCredentials;
            match self.prompt.prompt(&creds) {
                Ok(LoginOutcome::Cancelled) => {
                    tracing::info!("sign-in cancelled by user");
                    self.state = BootstrapState::ShuttingDown;
                    return 0;
                }
                Ok(LoginOutcome::Accepted { key, cert }) => {
                    creds = CredentialPaths { key, cert };
                    if let Err(error) = creds.validate() {
                        tracing::error!(%error, "selected credentials failed validation");
                        self.state = BootstrapState::ShuttingDown;
                        return 1;
                    }
                    // Remember the accepted paths for the next start.
                    cfg.put("global.key", creds.key.display().to_string());
                    cfg.put("global.cert", creds.cert.display().to_string());
                    if let Err(error) = cfg.write_to_file() {
                        tracing::warn!(%error, "could not persist accepted credential paths");
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "sign-in prompt failed");
                    self.state = BootstrapState::ShuttingDown;
                    return 1;
                }
            }
        }

        self.state = BootstrapState::Authenticated;
        tracing::info!(
            key = %creds.key.display(),
            cert = %creds.cert.display(),
            "credentials validated"
        );

        let bridge = Arc::new(Bridge::new(self.main_loop.waker()));
        let mut reactor = match Reactor::spawn(Arc::clone(&bridge)) {
            Ok(reactor) => reactor,
            Err(error) => {
                tracing::error!(%error, "failed to start the reactor");
                self.state = BootstrapState::ShuttingDown;
                return 1;
            }
        };

        self.state = BootstrapState::Running;
        let code = self.main_loop.run(Arc::clone(&bridge), reactor.handle());

        // Best-effort delivery at shutdown: the loop has exited, so tasks
        // still on the bridge are discarded with it.
        self.state = BootstrapState::ShuttingDown;
        reactor.stop();
        reactor.join();
        code
    }

    /// `Unconfigured → ConfigLoaded`: make sure the application directory
    /// exists and open the store.
    fn load_config(&self) -> ConfigStore {
        if let Err(error) = std::fs::create_dir_all(&self.app_dir) {
            tracing::warn!(
                path = %self.app_dir.display(),
                %error,
                "could not create the application directory"
            );
        }
        ConfigStore::open(self.app_dir.join(CONFIG_FILE))
    }
}
