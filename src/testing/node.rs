//! Node.js runtime check
//!
//! Tests run on the local `node`; if that differs from the runtime the
//! service deploys to, results may not carry over.

use semver::Version;
use tokio::process::Command as TokioCommand;

/// Warn when the local node version does not match `runtime`
pub async fn check_node_runtime(runtime: Option<&str>) {
    let Some(runtime) = runtime else {
        return;
    };
    let Ok(node) = which::which("node") else {
        tracing::debug!("node not found in PATH, skipping runtime check");
        return;
    };

    let output = match TokioCommand::new(node).arg("--version").output().await {
        Ok(output) if output.status.success() => output,
        Ok(_) | Err(_) => {
            tracing::debug!("node --version failed, skipping runtime check");
            return;
        }
    };

    let Some(version) = parse_node_version(&String::from_utf8_lossy(&output.stdout)) else {
        tracing::debug!("could not parse node version, skipping runtime check");
        return;
    };

    if !runtime_matches(&version, runtime) {
        tracing::warn!(
            "Tests being run with nodejs{}.{}, service is using {}. Tests may not be reliable.",
            version.major,
            version.minor,
            runtime
        );
    }
}

/// Parse `v8.10.0` as printed by `node --version`
pub fn parse_node_version(output: &str) -> Option<Version> {
    Version::parse(output.trim().trim_start_matches('v')).ok()
}

/// `nodejs8.10` and `nodejs8.x` both match node 8.10.x
pub fn runtime_matches(version: &Version, runtime: &str) -> bool {
    let exact = format!("nodejs{}.{}", version.major, version.minor);
    let major = format!("nodejs{}.x", version.major);
    runtime == exact || runtime == major
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_version() {
        let version = parse_node_version("v8.10.0\n").unwrap();
        assert_eq!((version.major, version.minor), (8, 10));
        assert!(parse_node_version("not a version").is_none());
    }

    #[test]
    fn test_runtime_matches() {
        let v8 = Version::new(8, 10, 0);
        assert!(runtime_matches(&v8, "nodejs8.10"));
        assert!(runtime_matches(&v8, "nodejs8.x"));
        assert!(!runtime_matches(&v8, "nodejs6.10"));

        let v18 = Version::new(18, 19, 1);
        assert!(runtime_matches(&v18, "nodejs18.x"));
        assert!(!runtime_matches(&v18, "nodejs20.x"));
    }
}
