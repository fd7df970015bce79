//! Per-run credential material
//!
//! Certificate material comes from the external `openssl` toolkit and lands
//! under the workspace; passwords, user UUIDs and pre-shared keys are
//! generated in-process. Certificates and suite-level secrets are
//! provisioned once and shared read-only across every iteration that
//! references the same kind; Shadowsocks keys are per-case because their
//! length depends on the method under test.

use crate::context::HarnessContext;
use crate::matrix::ProtocolVariant;
use crate::workspace::Workspace;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ferrobench_common::constants::{CERT_COUNTRY, CERT_ORG, CERT_VALIDITY_DAYS};
use ferrobench_common::{BenchError, Result};
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Certificate key algorithm under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyType {
    Rsa4096,
    Ed25519,
}

impl KeyType {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Rsa4096 => "rsa4096",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential material one test case depends on
#[derive(Debug, Clone)]
pub enum CredentialSet {
    /// PEM key pair produced by the external toolkit
    Certificate {
        key_type: KeyType,
        cert_path: PathBuf,
        key_path: PathBuf,
    },
    /// Pre-shared secret
    Password(String),
    /// UUID-identified user with a password (TUIC)
    User { uuid: String, password: String },
}

/// Secret plus optional certificate, resolved for one iteration
#[derive(Debug, Clone)]
pub struct CaseCredentials {
    pub secret: CredentialSet,
    pub certificate: Option<CredentialSet>,
}

/// Generates certificate material via the external toolkit
pub struct MaterialsProvisioner {
    openssl: String,
    root: PathBuf,
}

impl MaterialsProvisioner {
    pub fn new(ctx: &HarnessContext, workspace: &Workspace) -> Self {
        Self {
            openssl: ctx.binaries.openssl.clone(),
            root: workspace.path().to_path_buf(),
        }
    }

    /// Produce a self-signed leaf certificate and matching private key.
    ///
    /// Failure is not fatal to the run: the orchestrator skips every test
    /// case that depends on the missing material and continues.
    pub async fn certificate(&self, key_type: KeyType, domain: &str) -> Result<CredentialSet> {
        let key_path = self.root.join(format!("server-{key_type}.key"));
        let cert_path = self.root.join(format!("server-{key_type}.crt"));
        let subject = format!("/CN={domain}/O={CERT_ORG}/C={CERT_COUNTRY}");
        let days = CERT_VALIDITY_DAYS.to_string();

        let key = key_path.display().to_string();
        let cert = cert_path.display().to_string();

        match key_type {
            KeyType::Rsa4096 => {
                self.run_openssl(&["genrsa", "-out", &key, "4096"]).await?;
                self.run_openssl(&[
                    "req", "-x509", "-new", "-nodes", "-key", &key, "-sha256", "-days", &days,
                    "-out", &cert, "-subj", &subject,
                ])
                .await?;
            }
            KeyType::Ed25519 => {
                self.run_openssl(&["genpkey", "-algorithm", "ed25519", "-out", &key])
                    .await?;
                self.run_openssl(&[
                    "req", "-x509", "-new", "-nodes", "-key", &key, "-days", &days, "-out", &cert,
                    "-subj", &subject,
                ])
                .await?;
            }
        }

        if !key_path.is_file() || !cert_path.is_file() {
            return Err(BenchError::Provisioning(format!(
                "{key_type}: toolkit exited cleanly but produced no key/cert files"
            )));
        }

        info!("Generated {} certificate at {}", key_type, cert);
        Ok(CredentialSet::Certificate {
            key_type,
            cert_path,
            key_path,
        })
    }

    async fn run_openssl(&self, args: &[&str]) -> Result<()> {
        debug!("Running {} {}", self.openssl, args.join(" "));
        let output = Command::new(&self.openssl)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BenchError::Provisioning(format!("failed to run {}: {e}", self.openssl)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BenchError::Provisioning(format!(
                "{} {} exited with {}: {}",
                self.openssl,
                args.first().unwrap_or(&""),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Random key sized for the Shadowsocks method, base64 encoded.
///
/// Methods naming a 128-bit cipher get 16 random bytes, all others 32.
pub fn shadowsocks_password(method: &str) -> String {
    let len = if method.contains("128") { 16 } else { 32 };
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64.encode(&bytes)
}

/// `<prefix>-` followed by 12 random bytes, hex encoded.
pub fn tagged_password(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{prefix}-{}", hex::encode(bytes))
}

/// Certificate and shared-secret material for one run
#[derive(Default)]
pub struct CredentialStore {
    certificates: HashMap<KeyType, CredentialSet>,
    shared: HashMap<&'static str, CredentialSet>,
}

impl CredentialStore {
    pub fn insert_certificate(&mut self, set: CredentialSet) {
        if let CredentialSet::Certificate { key_type, .. } = &set {
            self.certificates.insert(*key_type, set);
        }
    }

    pub fn certificate(&self, key_type: KeyType) -> Option<&CredentialSet> {
        self.certificates.get(&key_type)
    }

    /// Resolve everything a test case needs, or fail if its certificate
    /// material never materialized.
    pub fn resolve(&mut self, variant: &ProtocolVariant) -> Result<CaseCredentials> {
        let certificate = match variant.key_type() {
            Some(kt) => Some(self.certificates.get(&kt).cloned().ok_or_else(|| {
                BenchError::Provisioning(format!("no certificate material for {kt}"))
            })?),
            None => None,
        };
        Ok(CaseCredentials {
            secret: self.secret_for(variant),
            certificate,
        })
    }

    fn secret_for(&mut self, variant: &ProtocolVariant) -> CredentialSet {
        match variant {
            // Key length tracks the method under test, so no sharing.
            ProtocolVariant::Shadowsocks { method } | ProtocolVariant::ShadowsocksRust { method } => {
                CredentialSet::Password(shadowsocks_password(method))
            }
            ProtocolVariant::Trojan { .. } => self.shared_password("trojan"),
            ProtocolVariant::AnyTls { .. } | ProtocolVariant::AnyTlsRs { .. } => {
                self.shared_password("anytls")
            }
            ProtocolVariant::Tuic { .. } => self
                .shared
                .entry("tuic")
                .or_insert_with(|| CredentialSet::User {
                    uuid: uuid::Uuid::new_v4().to_string(),
                    password: tagged_password("tuic"),
                })
                .clone(),
        }
    }

    fn shared_password(&mut self, prefix: &'static str) -> CredentialSet {
        self.shared
            .entry(prefix)
            .or_insert_with(|| CredentialSet::Password(tagged_password(prefix)))
            .clone()
    }
}
