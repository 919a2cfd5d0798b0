//! Password hashing through the system hasher.

use std::process::Stdio;

use log::debug;
use tokio::{io::AsyncWriteExt, process::Command};

use groundwork_rpc::Error;

const CRYPT_COMMAND: &str = "mkpasswd";
const CRYPT_ARGS: [&str; 2] = ["--method=yescrypt", "--stdin"];

/// Crypt `password` for a user record: plaintext on stdin, crypted string
/// on stdout. The hasher runs under a fixed locale so its output is stable
pub async fn crypt_password(password: &str) -> crate::Result<String> {
    let mut child = Command::new(CRYPT_COMMAND)
        .args(CRYPT_ARGS)
        .env("LC_ALL", "C.UTF-8")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Internal(format!("failed to spawn {CRYPT_COMMAND}: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Internal("no stdin handle for the hasher".into()))?;
    stdin
        .write_all(password.as_bytes())
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;
    drop(stdin);

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    if !output.status.success() {
        return Err(Error::Internal(format!(
            "{CRYPT_COMMAND} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    debug!("Crypted a password");

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
