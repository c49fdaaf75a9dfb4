// SPDX-License-Identifier: Apache-2.0

//! The line-oriented wire protocol spoken to an out-of-process package
//! provider.

use crate::error::PkgModuleError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// The eight verbs the protocol defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    SupportsApiVersion,
    GetPackageData,
    ListInstalled,
    ListUpdates,
    ListUpdatesLocal,
    RepoInstall,
    FileInstall,
    Remove,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Verb::SupportsApiVersion => "supports-api-version",
            Verb::GetPackageData => "get-package-data",
            Verb::ListInstalled => "list-installed",
            Verb::ListUpdates => "list-updates",
            Verb::ListUpdatesLocal => "list-updates-local",
            Verb::RepoInstall => "repo-install",
            Verb::FileInstall => "file-install",
            Verb::Remove => "remove",
        }
    }
}

/// A parsed `Key=Value` response from a provider. Unknown keys are kept, not dropped, so a
/// caller wanting to log-and-ignore them still can.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pairs: Vec<(String, String)>,
}

impl Response {
    fn parse(raw: &str) -> Self {
        let pairs = raw
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { pairs }
    }

    /// The first value recorded for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value recorded for `key`, in response order — used for
    /// repeated keys such as a multi-line `Version` list.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Raises [`PkgModuleError::ProviderError`] if the response carries
    /// an `Error` key.
    pub fn into_result(self) -> Result<Self, PkgModuleError> {
        if let Some(message) = self.get("ErrorMessage").or_else(|| self.get("Error")) {
            return Err(PkgModuleError::ProviderError(message.to_owned()));
        }
        Ok(self)
    }
}

fn request_payload(attributes: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in attributes {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Invokes `module_path <verb>`, writing `attributes` as `Key=Value`
/// lines on stdin and parsing the `Key=Value` lines the provider writes
/// to stdout, bounded by `timeout`. Spawns a short-lived single-threaded Tokio runtime per
/// call — the rest of the engine stays synchronous; only this child-process exchange needs an
/// async I/O+timeout primitive.
pub fn call_module(
    module_path: &Path,
    verb: Verb,
    attributes: &[(String, String)],
    timeout: Duration,
) -> Result<Response, PkgModuleError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| PkgModuleError::Spawn {
            path: module_path.to_path_buf(),
            source,
        })?;
    runtime.block_on(call_module_async(module_path, verb, attributes, timeout))
}

async fn call_module_async(
    module_path: &Path,
    verb: Verb,
    attributes: &[(String, String)],
    timeout: Duration,
) -> Result<Response, PkgModuleError> {
    let mut child = Command::new(module_path)
        .arg(verb.as_str())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| PkgModuleError::Spawn {
            path: module_path.to_path_buf(),
            source,
        })?;

    let mut stdin = child.stdin.take().expect("piped stdin");
    let payload = request_payload(attributes);

    let exchange = async {
        stdin.write_all(payload.as_bytes()).await?;
        drop(stdin);
        let mut stdout = child.stdout.take().expect("piped stdout");
        let mut buf = String::new();
        stdout.read_to_string(&mut buf).await?;
        Ok::<String, std::io::Error>(buf)
    };

    let raw = match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(source)) => {
            let _ = child.kill().await;
            return Err(PkgModuleError::Io {
                path: module_path.to_path_buf(),
                source,
            });
        }
        Err(_elapsed) => {
            let _ = child.kill().await;
            return Err(PkgModuleError::Timeout(module_path.to_path_buf()));
        }
    };

    let status = child.wait().await.map_err(|source| PkgModuleError::Io {
        path: module_path.to_path_buf(),
        source,
    })?;
    if !status.success() {
        return Err(PkgModuleError::NonZeroExit {
            path: module_path.to_path_buf(),
            code: status.code(),
        });
    }

    Response::parse(&raw).into_result()
}

/// Calls `supports-api-version` and verifies the provider replies with
/// exactly `1`.
pub fn check_api_version(module_path: &Path, timeout: Duration) -> Result<(), PkgModuleError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| PkgModuleError::Spawn {
            path: module_path.to_path_buf(),
            source,
        })?;
    runtime.block_on(async {
        let reported = raw_api_version_reply(module_path, timeout).await?;
        if reported.trim() == "1" {
            Ok(())
        } else {
            Err(PkgModuleError::UnsupportedApiVersion {
                path: module_path.to_path_buf(),
                reported,
            })
        }
    })
}

async fn raw_api_version_reply(module_path: &Path, timeout: Duration) -> Result<String, PkgModuleError> {
    let mut child = Command::new(module_path)
        .arg(Verb::SupportsApiVersion.as_str())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| PkgModuleError::Spawn {
            path: module_path.to_path_buf(),
            source,
        })?;
    drop(child.stdin.take());

    let mut stdout = child.stdout.take().expect("piped stdout");
    let mut buf = String::new();
    let read = tokio::time::timeout(timeout, stdout.read_to_string(&mut buf));
    match read.await {
        Ok(Ok(_)) => {}
        Ok(Err(source)) => {
            let _ = child.kill().await;
            return Err(PkgModuleError::Io {
                path: module_path.to_path_buf(),
                source,
            });
        }
        Err(_elapsed) => {
            let _ = child.kill().await;
            return Err(PkgModuleError::Timeout(module_path.to_path_buf()));
        }
    }
    let _ = child.wait().await;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_key_value_lines_and_ignores_unrecognised_keys() {
        let response = Response::parse("Name=bash\nVersion=5.1\nWeirdKey=whatever\n");
        assert_eq!(response.get("Name"), Some("bash"));
        assert_eq!(response.get("Version"), Some("5.1"));
        assert_eq!(response.get("WeirdKey"), Some("whatever"));
    }

    #[test]
    fn response_with_error_key_becomes_a_provider_error() {
        let response = Response::parse("Error=1\nErrorMessage=not found\n");
        let err = response.into_result();
        assert!(matches!(err, Err(PkgModuleError::ProviderError(msg)) if msg == "not found"));
    }

    #[test]
    fn request_payload_ends_with_a_blank_line() {
        let payload = request_payload(&[("Name".to_owned(), "bash".to_owned())]);
        assert_eq!(payload, "Name=bash\n\n");
    }
}
