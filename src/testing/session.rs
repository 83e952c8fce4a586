//! Test session controller
//!
//! Drives one `invoke test` run through its stages: load the service
//! configuration, run the pre-test hooks, resolve test files, configure the
//! runner, execute suites with per-function environments, then run the
//! post-test hooks.

use colored::Colorize;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::config::{Config, RunnerConfig};
use crate::common::paths::{absolutize, function_name_from_path};
use crate::common::{Error, Result};
use crate::service::ServiceConfig;

use super::environment::{
    bind_environment, EnvironmentSnapshot, LIVE_ENV, LIVE_REGION_ENV, LIVE_SERVICE_ENV,
    LIVE_STAGE_ENV, TEST_ROOT_ENV,
};
use super::hooks::{run_hooks, HookOutcome, HookStage};
use super::node::check_node_runtime;
use super::options::{
    parse_compilers, parse_reporter_options, Compiler, InvokeTestOptions, Reporter,
};
use super::resolver::{TestFileBinding, TestFileResolver};
use super::runners::{
    create_runner, Framework, RunSummary, RunnerSession, SuiteListener, TestRunner,
};

const DEFAULT_LIVE_STAGE: &str = "dev";
const DEFAULT_LIVE_REGION: &str = "us-east-1";

/// Where a session is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Idle,
    LoadingConfig,
    RunningPreHooks,
    ResolvingTests,
    ConfiguringRunner,
    Executing,
    RunningPostHooks,
    Terminal(i32),
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStage::Idle => write!(f, "idle"),
            SessionStage::LoadingConfig => write!(f, "loading config"),
            SessionStage::RunningPreHooks => write!(f, "running pre-test hooks"),
            SessionStage::ResolvingTests => write!(f, "resolving tests"),
            SessionStage::ConfiguringRunner => write!(f, "configuring runner"),
            SessionStage::Executing => write!(f, "executing"),
            SessionStage::RunningPostHooks => write!(f, "running post-test hooks"),
            SessionStage::Terminal(code) => write!(f, "terminal ({code})"),
        }
    }
}

/// Result of a completed session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Process exit code: the failure count, at most 255
    pub exit_code: i32,
    /// `None` when no tests ran
    pub summary: Option<RunSummary>,
    pub pre_hooks: Vec<HookOutcome>,
    pub post_hooks: Vec<HookOutcome>,
}

/// Everything read and validated before any command runs
struct LoadedConfig {
    service: ServiceConfig,
    framework: Framework,
    reporter: Option<Reporter>,
    compilers: Vec<Compiler>,
    /// Runner executable; `None` when a runner was supplied
    command: Option<RunnerConfig>,
}

pub struct TestSession {
    service_dir: PathBuf,
    cwd: PathBuf,
    options: InvokeTestOptions,
    config: Config,
    runner: Option<Box<dyn TestRunner>>,
    stage: SessionStage,
}

impl TestSession {
    pub fn new(service_dir: &Path, options: InvokeTestOptions, config: Config) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self {
            service_dir: absolutize(service_dir, &cwd),
            cwd,
            options,
            config,
            runner: None,
            stage: SessionStage::Idle,
        })
    }

    /// Use `runner` instead of looking one up for the configured framework
    pub fn with_runner(mut self, runner: Box<dyn TestRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    fn enter(&mut self, stage: SessionStage) {
        tracing::debug!(from = %self.stage, to = %stage, "session stage");
        self.stage = stage;
    }

    /// Run the session to completion
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        self.enter(SessionStage::LoadingConfig);
        let loaded = self.load_config().await?;
        let plugin = loaded.service.plugin();

        self.enter(SessionStage::RunningPreHooks);
        let pre_hooks =
            run_hooks(HookStage::PreTest, &plugin.pre_test_commands, &self.service_dir).await;

        self.enter(SessionStage::ResolvingTests);
        let bindings = self.resolve_tests(&loaded.service)?;
        if bindings.is_empty() {
            tracing::info!("No tests to run");
            self.enter(SessionStage::Terminal(0));
            return Ok(SessionOutcome {
                exit_code: 0,
                summary: None,
                pre_hooks,
                post_hooks: Vec::new(),
            });
        }

        self.enter(SessionStage::ConfiguringRunner);
        let (mut runner, base_env) = self.configure_runner(&loaded, &bindings)?;

        self.enter(SessionStage::Executing);
        let mut listener = SuiteEnvironment::new(&loaded.service, &bindings, base_env);
        let result = runner.run(&mut listener).await;
        if let Ok(summary) = &result {
            print_summary(summary);
        }

        self.enter(SessionStage::RunningPostHooks);
        let post_hooks =
            run_hooks(HookStage::PostTest, &plugin.post_test_commands, &self.service_dir).await;

        let summary = result?;
        let exit_code = summary.failures.min(255) as i32;
        self.enter(SessionStage::Terminal(exit_code));

        Ok(SessionOutcome {
            exit_code,
            summary: Some(summary),
            pre_hooks,
            post_hooks,
        })
    }

    async fn load_config(&self) -> Result<LoadedConfig> {
        let service = ServiceConfig::load(&self.service_dir)?;
        let framework = Framework::from_plugin(service.plugin())?;
        tracing::debug!(%framework, service = %service.service, "loaded service");

        let reporter_options = self
            .options
            .reporter_options
            .as_deref()
            .map(parse_reporter_options)
            .transpose()?;
        let reporter = match (&self.options.reporter, reporter_options) {
            (Some(name), options) => Some(Reporter {
                name: name.clone(),
                options: options.unwrap_or_default(),
            }),
            (None, Some(_)) => {
                tracing::warn!("--reporter-options given without --reporter, ignoring them");
                None
            }
            (None, None) => None,
        };

        let compilers = match self.options.compilers.as_deref() {
            Some(raw) => parse_compilers(raw, &self.cwd)?,
            None => Vec::new(),
        };

        let command = match self.runner {
            Some(_) => None,
            None => Some(
                self.config
                    .runner_command(framework.binary(), &self.service_dir)?,
            ),
        };

        check_node_runtime(service.provider.runtime.as_deref()).await;

        Ok(LoadedConfig {
            service,
            framework,
            reporter,
            compilers,
            command,
        })
    }

    fn resolve_tests(&self, service: &ServiceConfig) -> Result<IndexMap<String, TestFileBinding>> {
        let resolver = TestFileResolver::new(&self.service_dir, self.options.path.as_deref());
        resolver.resolve(&service.functions, &self.options.functions)
    }

    fn configure_runner(
        &mut self,
        loaded: &LoadedConfig,
        bindings: &IndexMap<String, TestFileBinding>,
    ) -> Result<(Box<dyn TestRunner>, EnvironmentSnapshot)> {
        let mut runner = match (self.runner.take(), &loaded.command) {
            (Some(runner), _) => runner,
            (None, Some(command)) => {
                let session = RunnerSession::new(
                    command.clone(),
                    &self.service_dir,
                    self.config.timeouts.test_timeout_ms,
                );
                create_runner(loaded.framework, session)
            }
            (None, None) => {
                return Err(Error::Internal("no runner command resolved".to_string()))
            }
        };
        if runner.framework() != loaded.framework {
            return Err(Error::Internal(format!(
                "runner for {} used with testFramework {}",
                runner.framework(),
                loaded.framework
            )));
        }

        for binding in bindings.values() {
            runner.add_file(binding.test_path.clone());
        }
        if let Some(reporter) = &loaded.reporter {
            runner.set_reporter(reporter.clone());
        }
        if let Some(pattern) = &self.options.grep {
            runner.set_filter(pattern.clone());
        }
        runner.set_compilers(loaded.compilers.clone());
        runner.set_force_exit(self.options.exit);

        Ok((runner, self.base_environment(&loaded.service)))
    }

    /// Variables every suite sees
    fn base_environment(&self, service: &ServiceConfig) -> EnvironmentSnapshot {
        let mut env = EnvironmentSnapshot::new();

        let root = match &self.options.root {
            Some(root) => {
                let root = absolutize(root, &self.cwd);
                tracing::info!("Run tests against code under '{}'", root.display());
                root
            }
            None => self.service_dir.clone(),
        };
        env.set(TEST_ROOT_ENV, root.display().to_string());

        if self.options.live {
            let stage = self
                .options
                .stage
                .as_deref()
                .or(service.provider.stage.as_deref())
                .unwrap_or(DEFAULT_LIVE_STAGE);
            let region = self
                .options
                .region
                .as_deref()
                .or(service.provider.region.as_deref())
                .unwrap_or(DEFAULT_LIVE_REGION);
            tracing::debug!(stage, region, "live mode");

            env.set(LIVE_ENV, "true");
            env.set(LIVE_REGION_ENV, region);
            env.set(LIVE_SERVICE_ENV, service.service.as_str());
            env.set(LIVE_STAGE_ENV, stage);
        }

        env
    }
}

/// Binds the environment of each suite as it starts
struct SuiteEnvironment<'a> {
    service: &'a ServiceConfig,
    /// Test file path to the function it binds, if any
    functions_by_path: HashMap<PathBuf, Option<String>>,
    snapshot: EnvironmentSnapshot,
}

impl<'a> SuiteEnvironment<'a> {
    fn new(
        service: &'a ServiceConfig,
        bindings: &IndexMap<String, TestFileBinding>,
        snapshot: EnvironmentSnapshot,
    ) -> Self {
        let functions_by_path = bindings
            .values()
            .map(|b| {
                let function = b.binds_function().then(|| b.function_name.clone());
                (b.test_path.clone(), function)
            })
            .collect();
        Self {
            service,
            functions_by_path,
            snapshot,
        }
    }

    fn function_for(&self, file: &Path) -> Option<String> {
        if let Some(function) = self.functions_by_path.get(file) {
            return function.clone();
        }
        let name = function_name_from_path(file)?;
        let bound = self
            .functions_by_path
            .values()
            .any(|f| f.as_deref() == Some(name.as_str()));
        bound.then_some(name)
    }
}

impl SuiteListener for SuiteEnvironment<'_> {
    fn suite_started(&mut self, file: &Path) -> EnvironmentSnapshot {
        let function = self.function_for(file);
        bind_environment(self.service, function.as_deref(), &mut self.snapshot);
        self.snapshot.clone()
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    if let Some(passed) = summary.passed {
        println!("  {}", format!("{passed} passing").green());
    }
    if summary.failures > 0 {
        println!("  {}", format!("{} failing", summary.failures).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::RunnerConfig;
    use crate::testing::runners::SuiteOutcome;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(PathBuf, EnvironmentSnapshot)>>>;

    struct MockRunner {
        session: RunnerSession,
        seen: Seen,
        failures_per_suite: usize,
        error: bool,
    }

    impl MockRunner {
        fn new(seen: Seen) -> Self {
            Self {
                session: RunnerSession::new(
                    RunnerConfig {
                        path: PathBuf::from("mocha"),
                        args: Vec::new(),
                    },
                    ".",
                    6000,
                ),
                seen,
                failures_per_suite: 0,
                error: false,
            }
        }
    }

    #[async_trait]
    impl TestRunner for MockRunner {
        fn framework(&self) -> Framework {
            Framework::Mocha
        }

        fn session(&self) -> &RunnerSession {
            &self.session
        }

        fn session_mut(&mut self) -> &mut RunnerSession {
            &mut self.session
        }

        async fn run_suite(&self, file: &Path, env: &EnvironmentSnapshot) -> Result<SuiteOutcome> {
            if self.error {
                return Err(Error::RunnerFailed("boom".into()));
            }
            self.seen
                .lock()
                .unwrap()
                .push((file.to_path_buf(), env.clone()));
            Ok(SuiteOutcome {
                passed: Some(1),
                failed: self.failures_per_suite,
            })
        }
    }

    const SERVICE: &str = "
service: my-service
provider:
  name: aws
  runtime: nodejs8.10
  region: eu-west-1
  environment:
    A: '1'
functions:
  hello:
    handler: handler.hello
    environment:
      B: '2'
  goodbye:
    handler: goodbye.handler
    environment:
      C: '3'
";

    fn service_dir(plugin: &str, tests: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let config = format!("{SERVICE}custom:\n  serverless-tdd-plugin:\n{plugin}");
        std::fs::write(dir.path().join("serverless.yml"), config).unwrap();
        std::fs::create_dir_all(dir.path().join("test")).unwrap();
        for name in tests {
            std::fs::write(dir.path().join(format!("test/{name}.test.js")), "").unwrap();
        }
        dir
    }

    fn session(dir: &Path, options: InvokeTestOptions, runner: MockRunner) -> TestSession {
        TestSession::new(dir, options, Config::default())
            .unwrap()
            .with_runner(Box::new(runner))
    }

    #[tokio::test]
    async fn test_each_suite_gets_its_function_environment() {
        let dir = service_dir("    testFramework: mocha\n", &["hello", "goodbye"]);
        let seen = Seen::default();

        let mut session = session(
            dir.path(),
            InvokeTestOptions::default(),
            MockRunner::new(seen.clone()),
        );
        let outcome = session.run().await.unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.summary.unwrap().passed, Some(2));
        assert_eq!(session.stage(), SessionStage::Terminal(0));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);

        let (hello_path, hello_env) = &seen[0];
        assert_eq!(hello_path, &dir.path().join("test/hello.test.js"));
        assert_eq!(hello_env.get("A"), Some("1"));
        assert_eq!(hello_env.get("B"), Some("2"));
        assert_eq!(hello_env.get("C"), None);
        assert_eq!(
            hello_env.get(TEST_ROOT_ENV),
            Some(dir.path().display().to_string().as_str())
        );
        assert_eq!(hello_env.get(LIVE_ENV), None);

        // Set-only: B carries over from the previous suite
        let (_, goodbye_env) = &seen[1];
        assert_eq!(goodbye_env.get("B"), Some("2"));
        assert_eq!(goodbye_env.get("C"), Some("3"));
    }

    #[tokio::test]
    async fn test_live_mode_variables() {
        let dir = service_dir("    testFramework: mocha\n", &["hello"]);
        let seen = Seen::default();
        let options = InvokeTestOptions {
            live: true,
            stage: Some("prod".into()),
            ..Default::default()
        };

        session(dir.path(), options, MockRunner::new(seen.clone()))
            .run()
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let env = &seen[0].1;
        assert_eq!(env.get(LIVE_ENV), Some("true"));
        assert_eq!(env.get(LIVE_STAGE_ENV), Some("prod"));
        assert_eq!(env.get(LIVE_REGION_ENV), Some("eu-west-1"));
        assert_eq!(env.get(LIVE_SERVICE_ENV), Some("my-service"));
    }

    #[tokio::test]
    async fn test_requested_functions_and_explicit_root() {
        let dir = service_dir("    testFramework: mocha\n", &["hello", "goodbye"]);
        let root = tempfile::tempdir().unwrap();
        let seen = Seen::default();
        let options = InvokeTestOptions {
            functions: vec!["goodbye".into(), "ghost".into()],
            root: Some(root.path().to_path_buf()),
            ..Default::default()
        };

        session(dir.path(), options, MockRunner::new(seen.clone()))
            .run()
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].1.get(TEST_ROOT_ENV),
            Some(root.path().display().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_no_tests_skips_runner_and_post_hooks() {
        let dir = service_dir(
            "    testFramework: mocha\n    postTestCommands:\n      - touch post.done\n",
            &[],
        );
        let seen = Seen::default();

        let mut session = session(
            dir.path(),
            InvokeTestOptions::default(),
            MockRunner::new(seen.clone()),
        );
        let outcome = session.run().await.unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.summary.is_none());
        assert!(outcome.post_hooks.is_empty());
        assert!(seen.lock().unwrap().is_empty());
        assert!(!dir.path().join("post.done").exists());
    }

    #[tokio::test]
    async fn test_missing_or_unknown_framework_is_fatal_before_hooks() {
        let dir = service_dir("    preTestCommands:\n      - touch pre.done\n", &["hello"]);
        let err = session(
            dir.path(),
            InvokeTestOptions::default(),
            MockRunner::new(Seen::default()),
        )
        .run()
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MissingTestFramework));
        assert!(!dir.path().join("pre.done").exists());

        let dir = service_dir("    testFramework: jasmine\n", &["hello"]);
        let err = session(
            dir.path(),
            InvokeTestOptions::default(),
            MockRunner::new(Seen::default()),
        )
        .run()
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UnknownFramework { .. }));
    }

    #[tokio::test]
    async fn test_malformed_reporter_options_are_fatal() {
        let dir = service_dir("    testFramework: mocha\n", &["hello"]);
        let seen = Seen::default();
        let options = InvokeTestOptions {
            reporter: Some("dot".into()),
            reporter_options: Some("a=1=2".into()),
            ..Default::default()
        };

        let err = session(dir.path(), options, MockRunner::new(seen.clone()))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidReporterOption(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_runner_is_fatal_before_hooks() {
        if which::which("mocha").is_ok() {
            return;
        }
        let dir = service_dir(
            "    testFramework: mocha\n    preTestCommands:\n      - touch pre.done\n    postTestCommands:\n      - touch post.done\n",
            &["hello"],
        );

        let mut session =
            TestSession::new(dir.path(), InvokeTestOptions::default(), Config::default()).unwrap();
        let err = session.run().await.unwrap_err();

        assert!(matches!(err, Error::RunnerNotFound { .. }), "{err}");
        assert_eq!(session.stage(), SessionStage::LoadingConfig);
        assert!(!dir.path().join("pre.done").exists());
        assert!(!dir.path().join("post.done").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_post_hooks_run_when_tests_fail() {
        let dir = service_dir(
            "    testFramework: mocha\n    preTestCommands:\n      - exit 1\n    postTestCommands:\n      - touch post.done\n",
            &["hello", "goodbye"],
        );
        let mut runner = MockRunner::new(Seen::default());
        runner.failures_per_suite = 2;

        let outcome = session(dir.path(), InvokeTestOptions::default(), runner)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, 4);
        assert!(!outcome.pre_hooks[0].succeeded());
        assert!(outcome.post_hooks[0].succeeded());
        assert!(dir.path().join("post.done").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_post_hooks_run_when_runner_errors() {
        let dir = service_dir(
            "    testFramework: mocha\n    postTestCommands:\n      - touch post.done\n",
            &["hello"],
        );
        let mut runner = MockRunner::new(Seen::default());
        runner.error = true;

        let mut session = session(dir.path(), InvokeTestOptions::default(), runner);
        let err = session.run().await.unwrap_err();

        assert!(matches!(err, Error::RunnerFailed(_)));
        assert!(dir.path().join("post.done").exists());
        assert_eq!(session.stage(), SessionStage::RunningPostHooks);
    }

    #[test]
    fn test_loose_suite_gets_provider_environment_only() {
        let service = ServiceConfig::parse(SERVICE).unwrap();
        let mut bindings = IndexMap::new();
        bindings.insert(
            "helpers".to_string(),
            TestFileBinding {
                function_name: "helpers".into(),
                test_path: PathBuf::from("/svc/test/helpers.test.js"),
                function: None,
            },
        );
        bindings.insert(
            "hello".to_string(),
            TestFileBinding {
                function_name: "hello".into(),
                test_path: PathBuf::from("/svc/test/hello.test.js"),
                function: service.function("hello").cloned(),
            },
        );

        let mut listener = SuiteEnvironment::new(&service, &bindings, EnvironmentSnapshot::new());
        let env = listener.suite_started(Path::new("/svc/test/helpers.test.js"));
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), None);

        // Unknown path falls back to the file name
        assert_eq!(
            listener.function_for(Path::new("/elsewhere/hello.test.js")),
            Some("hello".to_string())
        );
        assert_eq!(listener.function_for(Path::new("/elsewhere/other.test.js")), None);
    }
}
