//! End-to-end integration tests for sls-tdd
//!
//! These tests run the built binary against a scratch service directory:
//! 1. Writing a serverless.yml (and optionally a fake test runner)
//! 2. Running `create` and `invoke` commands against it
//! 3. Checking generated files, output and exit codes

use std::fs;
use std::path::PathBuf;
use std::process::Command;

const SERVICE: &str = "\
service: tdd-service

provider:
  name: aws
  runtime: nodejs8.10
  environment:
    STAGE_NAME: test

functions:
  hello:
    handler: handler.hello
    environment:
      GREETING: hi
  goodbye:
    handler: src/goodbye.handler
    environment:
      GREETING: bye

custom:
  serverless-tdd-plugin:
    testFramework: mocha
";

/// Test context with a scratch service directory
struct TestContext {
    /// Keeps the directory alive for the test
    _temp: tempfile::TempDir,
    /// Service directory holding serverless.yml
    service_dir: PathBuf,
    /// Config directory (XDG_CONFIG_HOME)
    config_dir: PathBuf,
}

impl TestContext {
    fn new(service_yaml: &str) -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let service_dir = temp.path().join("service");
        let config_dir = temp.path().join("config");
        fs::create_dir_all(&service_dir).expect("Failed to create service dir");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        fs::write(service_dir.join("serverless.yml"), service_yaml)
            .expect("Failed to write serverless.yml");

        Self {
            _temp: temp,
            service_dir,
            config_dir,
        }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.service_dir.join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("Failed to read {relative}: {e}"))
    }

    /// Run sls-tdd from inside the service directory
    fn run(&self, args: &[&str]) -> CliOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_sls-tdd"))
            .args(args)
            .current_dir(&self.service_dir)
            .env("XDG_CONFIG_HOME", &self.config_dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("SLS_DEBUG")
            .output()
            .expect("Failed to run sls-tdd");

        CliOutput {
            stdout: strip_ansi(&String::from_utf8_lossy(&output.stdout)),
            stderr: strip_ansi(&String::from_utf8_lossy(&output.stderr)),
            code: output.status.code(),
        }
    }

    /// Run a command expecting exit code 0
    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_eq!(
            output.code,
            Some(0),
            "sls-tdd {:?} failed:\nstdout: {}\nstderr: {}",
            args,
            output.stdout,
            output.stderr
        );
        output.stdout
    }

    /// Install a fake `node_modules/.bin/mocha`
    ///
    /// It records each suite's environment in `runs.log` and writes a json
    /// report with one test, failing for the suites named in `failing`.
    #[cfg(unix)]
    fn install_fake_mocha(&self, failing: &[&str]) {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            r##"#!/bin/sh
out=""
prev=""
file=""
for arg in "$@"; do
  if [ "$prev" = "--reporter-option" ]; then
    case "$arg" in output=*) out="${{arg#output=}}" ;; esac
  fi
  prev="$arg"
  file="$arg"
done
name=$(basename "$file" .test.js)
echo "$name GREETING=$GREETING STAGE_NAME=$STAGE_NAME ROOT=$SERVERLESS_TEST_ROOT" >> runs.log
failures=0
case " {failing} " in *" $name "*) failures=1 ;; esac
if [ "$failures" = 1 ]; then
  passes=0
  err='{{"message": "expected true to be false"}}'
else
  passes=1
  err='{{}}'
fi
if [ -n "$out" ]; then
  cat > "$out" <<EOF
{{"stats": {{"passes": $passes, "failures": $failures, "pending": 0}},
 "tests": [{{"title": "works", "fullTitle": "$name works", "err": $err}}]}}
EOF
fi
exit $failures
"##,
            failing = failing.join(" ")
        );

        let path = self.path("node_modules/.bin/mocha");
        self.write("node_modules/.bin/mocha", &script);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// Output from an sls-tdd command
#[derive(Debug)]
struct CliOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

fn service_with_plugin(plugin: &str) -> String {
    SERVICE.replace("    testFramework: mocha\n", plugin)
}

fn strip_ansi(text: &str) -> String {
    let escapes = regex::Regex::new(r"\x1b\[[0-9;]*m").unwrap();
    escapes.replace_all(text, "").into_owned()
}

#[test]
fn test_create_test() {
    let ctx = TestContext::new(SERVICE);

    let stdout = ctx.run_ok(&["create", "test", "-f", "goodbye"]);
    assert!(stdout.contains("serverless-tdd: created test/goodbye.test.js"), "{stdout}");

    let test = ctx.read("test/goodbye.test.js");
    assert!(test.contains("describe('goodbye'"), "{test}");
    assert!(test.contains("src/goodbye.js"), "{test}");
    assert!(!test.contains("<%"), "{test}");

    // Second run refuses to overwrite
    let output = ctx.run(&["create", "test", "-f", "goodbye"]);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("already exists"), "{}", output.stderr);
}

#[test]
fn test_create_test_custom_path_and_unknown_function() {
    let ctx = TestContext::new(SERVICE);

    ctx.run_ok(&["create", "test", "-f", "hello", "-p", "spec/unit"]);
    assert!(ctx.path("spec/unit/hello.test.js").is_file());

    let output = ctx.run(&["create", "test", "-f", "ghost"]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.stderr.contains("Error: Function \"ghost\" not found"),
        "{}",
        output.stderr
    );
}

#[test]
fn test_create_function() {
    let ctx = TestContext::new(SERVICE);

    let stdout = ctx.run_ok(&[
        "create",
        "function",
        "-f",
        "createUser",
        "--handler",
        "src/users/create.handler",
        "--httpEvent",
        "POST api/users",
    ]);
    assert!(stdout.contains("Generating function..."), "{stdout}");
    assert!(stdout.contains("src/users/create.js"), "{stdout}");
    assert!(stdout.contains("created test/createUser.test.js"), "{stdout}");

    let yaml = ctx.read("serverless.yml");
    assert!(yaml.starts_with(SERVICE.split("custom:").next().unwrap().trim_end()));
    assert!(yaml.contains("  createUser:\n"), "{yaml}");
    assert!(yaml.contains("handler: src/users/create.handler"), "{yaml}");
    assert!(yaml.contains("POST api/users"), "{yaml}");
    assert!(yaml.contains("custom:\n  serverless-tdd-plugin:\n"), "{yaml}");

    let handler = ctx.read("src/users/create.js");
    assert!(handler.contains("handler"), "{handler}");
    assert!(ctx.path("test/createUser.test.js").is_file());
}

#[test]
fn test_create_existing_function_leaves_service_unchanged() {
    let ctx = TestContext::new(SERVICE);

    let output = ctx.run(&["create", "function", "-f", "hello", "--handler", "other.hello"]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.stderr.contains("Function \"hello\" already exists"),
        "{}",
        output.stderr
    );
    assert_eq!(ctx.read("serverless.yml"), SERVICE);
    assert!(!ctx.path("other.js").exists());
}

#[test]
fn test_create_function_unsupported_runtime() {
    let ctx = TestContext::new(&SERVICE.replace("nodejs8.10", "python3.12"));

    let output = ctx.run(&["create", "function", "-f", "fn", "--handler", "fn.handler"]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.stderr.contains("\"aws-python3.12\" is not supported"),
        "{}",
        output.stderr
    );
}

#[test]
fn test_invoke_without_framework_fails() {
    let ctx = TestContext::new(&service_with_plugin("    preTestCommands: []\n"));
    ctx.write("test/hello.test.js", "");

    let output = ctx.run(&["invoke", "test"]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.stderr.contains("Parameter testFramework not set"),
        "{}",
        output.stderr
    );
}

#[test]
fn test_invoke_with_malformed_reporter_options_fails() {
    let ctx = TestContext::new(SERVICE);
    ctx.write("test/hello.test.js", "");

    let output = ctx.run(&["invoke", "test", "-R", "dot", "-O", "a=1=2"]);
    assert_eq!(output.code, Some(1));
    assert!(
        output.stderr.contains("invalid reporter option \"a=1=2\""),
        "{}",
        output.stderr
    );
}

#[cfg(unix)]
#[test]
fn test_invoke_with_no_tests() {
    let ctx = TestContext::new(SERVICE);
    ctx.install_fake_mocha(&[]);

    let output = ctx.run(&["invoke", "test"]);
    assert_eq!(output.code, Some(0), "{}", output.stderr);
    assert!(output.stderr.contains("No tests to run"), "{}", output.stderr);
}

#[cfg(unix)]
#[test]
fn test_invoke_runs_each_function_with_its_environment() {
    let ctx = TestContext::new(SERVICE);
    ctx.install_fake_mocha(&[]);
    ctx.write("test/hello.test.js", "");
    ctx.write("test/goodbye.test.js", "");

    let stdout = ctx.run_ok(&["invoke", "test"]);
    assert!(stdout.contains("✓ hello works"), "{stdout}");
    assert!(stdout.contains("2 passing"), "{stdout}");

    let runs = ctx.read("runs.log");
    let lines: Vec<_> = runs.lines().collect();
    assert_eq!(lines.len(), 2, "{runs}");
    assert!(lines[0].starts_with("hello GREETING=hi STAGE_NAME=test ROOT="), "{runs}");
    assert!(lines[1].starts_with("goodbye GREETING=bye STAGE_NAME=test ROOT="), "{runs}");
    assert!(lines[0].ends_with("/service"), "{runs}");
}

#[cfg(unix)]
#[test]
fn test_invoke_failures_set_exit_code_and_post_hooks_run() {
    let plugin = "    testFramework: mocha\n    postTestCommands:\n      - touch post.done\n";
    let ctx = TestContext::new(&service_with_plugin(plugin));
    ctx.install_fake_mocha(&["goodbye"]);
    ctx.write("test/hello.test.js", "");
    ctx.write("test/goodbye.test.js", "");

    let output = ctx.run(&["invoke", "test"]);
    assert_eq!(output.code, Some(1), "{}", output.stderr);
    assert!(output.stdout.contains("1 passing"), "{}", output.stdout);
    assert!(output.stdout.contains("1 failing"), "{}", output.stdout);
    assert!(
        output.stdout.contains("goodbye works: expected true to be false"),
        "{}",
        output.stdout
    );
    assert!(ctx.path("post.done").exists());
}

#[cfg(unix)]
#[test]
fn test_invoke_single_function() {
    let ctx = TestContext::new(SERVICE);
    ctx.install_fake_mocha(&[]);
    ctx.write("test/hello.test.js", "");
    ctx.write("test/goodbye.test.js", "");

    let stdout = ctx.run_ok(&["invoke", "test", "-f", "goodbye"]);
    assert!(stdout.contains("1 passing"), "{stdout}");

    let runs = ctx.read("runs.log");
    assert_eq!(runs.lines().count(), 1, "{runs}");
    assert!(runs.starts_with("goodbye "), "{runs}");
}
