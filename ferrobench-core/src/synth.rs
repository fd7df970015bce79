//! Config artifact synthesis
//!
//! Pure mapping from a test-case variant to the artifacts its workers
//! consume: serialized engine documents for the sing-box families,
//! argument vectors for the standalone pairs. The only side effect is the
//! single write of each document under the workspace; synthesizing twice
//! for the same case yields byte-identical output.

use crate::context::HarnessContext;
use crate::materials::{CaseCredentials, CredentialSet};
use crate::matrix::ProtocolVariant;
use crate::ports::PortPair;
use crate::workspace::Workspace;
use ferrobench_common::constants::BENCH_DOMAIN;
use ferrobench_common::{BenchError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

const LOOPBACK: &str = "127.0.0.1";

/// Artifacts one iteration's worker pair consumes
#[derive(Debug, Clone)]
pub enum ConfigArtifact {
    /// Serialized engine documents written under the workspace
    Files { server: PathBuf, client: PathBuf },
    /// Inline argument vectors, nothing written
    Argv {
        server: Vec<String>,
        client: Vec<String>,
    },
}

impl ConfigArtifact {
    /// Full command line for the server worker.
    pub fn server_command(&self, ctx: &HarnessContext) -> Vec<String> {
        match self {
            ConfigArtifact::Files { server, .. } => engine_command(ctx, server),
            ConfigArtifact::Argv { server, .. } => server.clone(),
        }
    }

    /// Full command line for the client worker.
    pub fn client_command(&self, ctx: &HarnessContext) -> Vec<String> {
        match self {
            ConfigArtifact::Files { client, .. } => engine_command(ctx, client),
            ConfigArtifact::Argv { client, .. } => client.clone(),
        }
    }
}

fn engine_command(ctx: &HarnessContext, config: &Path) -> Vec<String> {
    vec![
        ctx.binaries.engine.clone(),
        "run".to_string(),
        "-c".to_string(),
        config.display().to_string(),
    ]
}

/// Maps test-case specs onto worker-consumable artifacts
pub struct ConfigSynthesizer<'a> {
    ctx: &'a HarnessContext,
    root: PathBuf,
}

impl<'a> ConfigSynthesizer<'a> {
    pub fn new(ctx: &'a HarnessContext, workspace: &Workspace) -> Self {
        Self {
            ctx,
            root: workspace.path().to_path_buf(),
        }
    }

    /// Derive the artifact for one test case and write any documents.
    pub fn synthesize(
        &self,
        label: &str,
        variant: &ProtocolVariant,
        ports: PortPair,
        creds: &CaseCredentials,
    ) -> Result<ConfigArtifact> {
        match variant {
            ProtocolVariant::Shadowsocks { .. }
            | ProtocolVariant::Trojan { .. }
            | ProtocolVariant::AnyTls { .. }
            | ProtocolVariant::Tuic { .. } => {
                let (server, client) = render_engine_documents(variant, ports, creds)?;
                let server_path = self.root.join(format!("server-{label}.json"));
                let client_path = self.root.join(format!("client-{label}.json"));
                write_document(&server_path, &server)?;
                write_document(&client_path, &client)?;
                Ok(ConfigArtifact::Files {
                    server: server_path,
                    client: client_path,
                })
            }
            ProtocolVariant::ShadowsocksRust { method } => {
                let password = password_of(creds)?;
                Ok(ConfigArtifact::Argv {
                    server: vec![
                        self.ctx.binaries.ssserver.clone(),
                        "-s".to_string(),
                        format!("{LOOPBACK}:{}", ports.server),
                        "-m".to_string(),
                        method.clone(),
                        "-k".to_string(),
                        password.to_string(),
                    ],
                    client: vec![
                        self.ctx.binaries.sslocal.clone(),
                        "-b".to_string(),
                        format!("{LOOPBACK}:{}", ports.client),
                        "-s".to_string(),
                        format!("{LOOPBACK}:{}", ports.server),
                        "-m".to_string(),
                        method.clone(),
                        "-k".to_string(),
                        password.to_string(),
                    ],
                })
            }
            ProtocolVariant::AnyTlsRs { .. } => {
                let password = password_of(creds)?;
                let (cert, key) = certificate_paths(creds)?;
                Ok(ConfigArtifact::Argv {
                    server: vec![
                        self.ctx.binaries.anytls_server.clone(),
                        "-l".to_string(),
                        format!("{LOOPBACK}:{}", ports.server),
                        "-p".to_string(),
                        password.to_string(),
                        "--cert".to_string(),
                        cert,
                        "--key".to_string(),
                        key,
                        "-L".to_string(),
                        "error".to_string(),
                        "-M".to_string(),
                        "1".to_string(),
                    ],
                    client: vec![
                        self.ctx.binaries.anytls_client.clone(),
                        "-l".to_string(),
                        format!("{LOOPBACK}:{}", ports.client),
                        "-s".to_string(),
                        format!("{LOOPBACK}:{}", ports.server),
                        "-p".to_string(),
                        password.to_string(),
                        "-L".to_string(),
                        "error".to_string(),
                        "-M".to_string(),
                        "1".to_string(),
                    ],
                })
            }
        }
    }
}

fn write_document(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| BenchError::ConfigWrite(format!("{}: {e}", path.display())))
}

/// Render the server and client engine documents for a sing-box family.
///
/// Pure: no filesystem or process side effects, so the output can be
/// compared byte-for-byte across calls.
pub fn render_engine_documents(
    variant: &ProtocolVariant,
    ports: PortPair,
    creds: &CaseCredentials,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let (inbound, outbound, out_tag) = match variant {
        ProtocolVariant::Shadowsocks { method } => {
            let password = password_of(creds)?;
            (
                Inbound::Shadowsocks {
                    tag: "ss-in",
                    listen: LOOPBACK,
                    listen_port: ports.server,
                    method: method.clone(),
                    password: password.to_string(),
                },
                Outbound::Shadowsocks {
                    tag: "ss-out",
                    server: LOOPBACK,
                    server_port: ports.server,
                    method: method.clone(),
                    password: password.to_string(),
                },
                "ss-out",
            )
        }
        ProtocolVariant::Trojan { .. } => {
            let password = password_of(creds)?;
            let alpn = &["h2", "http/1.1"][..];
            (
                Inbound::Trojan {
                    tag: "trojan-in",
                    listen: LOOPBACK,
                    listen_port: ports.server,
                    users: vec![PasswordUser {
                        password: password.to_string(),
                    }],
                    tls: server_tls(creds, alpn)?,
                },
                Outbound::Trojan {
                    tag: "trojan-out",
                    server: LOOPBACK,
                    server_port: ports.server,
                    password: password.to_string(),
                    tls: client_tls(alpn),
                },
                "trojan-out",
            )
        }
        ProtocolVariant::AnyTls { .. } => {
            let password = password_of(creds)?;
            let alpn = &["h3"][..];
            (
                Inbound::Anytls {
                    tag: "anytls-in",
                    listen: LOOPBACK,
                    listen_port: ports.server,
                    users: vec![NamedUser {
                        name: "bench",
                        password: password.to_string(),
                    }],
                    tls: server_tls(creds, alpn)?,
                },
                Outbound::Anytls {
                    tag: "anytls-out",
                    server: LOOPBACK,
                    server_port: ports.server,
                    password: password.to_string(),
                    tls: client_tls(alpn),
                },
                "anytls-out",
            )
        }
        ProtocolVariant::Tuic { congestion, .. } => {
            let (uuid, password) = user_of(creds)?;
            let alpn = &["h3"][..];
            (
                Inbound::Tuic {
                    tag: "tuic-in",
                    listen: LOOPBACK,
                    listen_port: ports.server,
                    users: vec![TuicUser {
                        uuid: uuid.to_string(),
                        password: password.to_string(),
                    }],
                    congestion_control: congestion.as_str(),
                    auth_timeout: "3s",
                    zero_rtt_handshake: true,
                    tls: server_tls(creds, alpn)?,
                },
                Outbound::Tuic {
                    tag: "tuic-out",
                    server: LOOPBACK,
                    server_port: ports.server,
                    uuid: uuid.to_string(),
                    password: password.to_string(),
                    congestion_control: congestion.as_str(),
                    zero_rtt_handshake: true,
                    tls: client_tls(alpn),
                },
                "tuic-out",
            )
        }
        ProtocolVariant::ShadowsocksRust { .. } | ProtocolVariant::AnyTlsRs { .. } => {
            return Err(BenchError::ConfigWrite(
                "standalone variants have no engine documents".to_string(),
            ));
        }
    };

    let server_doc = Document {
        log: Log::default(),
        inbounds: vec![inbound],
        outbounds: vec![Outbound::Direct { tag: "direct" }],
        route: None,
    };
    let client_doc = Document {
        log: Log::default(),
        inbounds: vec![Inbound::Socks {
            tag: "socks-in",
            listen: LOOPBACK,
            listen_port: ports.client,
        }],
        outbounds: vec![outbound, Outbound::Direct { tag: "direct" }],
        route: Some(Route {
            rules: vec![Rule { outbound: out_tag }],
        }),
    };

    Ok((render(&server_doc)?, render(&client_doc)?))
}

fn render(doc: &Document) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(doc)?)
}

fn password_of(creds: &CaseCredentials) -> Result<&str> {
    match &creds.secret {
        CredentialSet::Password(p) => Ok(p),
        other => Err(BenchError::Provisioning(format!(
            "expected a password secret, got {other:?}"
        ))),
    }
}

fn user_of(creds: &CaseCredentials) -> Result<(&str, &str)> {
    match &creds.secret {
        CredentialSet::User { uuid, password } => Ok((uuid, password)),
        other => Err(BenchError::Provisioning(format!(
            "expected a user secret, got {other:?}"
        ))),
    }
}

fn certificate_paths(creds: &CaseCredentials) -> Result<(String, String)> {
    match &creds.certificate {
        Some(CredentialSet::Certificate {
            cert_path,
            key_path,
            ..
        }) => Ok((
            cert_path.display().to_string(),
            key_path.display().to_string(),
        )),
        _ => Err(BenchError::Provisioning(
            "no certificate material resolved for this case".to_string(),
        )),
    }
}

fn server_tls(creds: &CaseCredentials, alpn: &[&'static str]) -> Result<ServerTls> {
    let (certificate_path, key_path) = certificate_paths(creds)?;
    Ok(ServerTls {
        enabled: true,
        server_name: BENCH_DOMAIN,
        certificate_path,
        key_path,
        alpn: alpn.to_vec(),
    })
}

fn client_tls(alpn: &[&'static str]) -> ClientTls {
    ClientTls {
        enabled: true,
        server_name: BENCH_DOMAIN,
        // Self-signed leaf with no independent trust anchor on the client.
        insecure: true,
        alpn: alpn.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Engine document shapes. One variant per protocol family, carrying exactly
// the fields that family requires.
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Document {
    log: Log,
    inbounds: Vec<Inbound>,
    outbounds: Vec<Outbound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<Route>,
}

#[derive(Serialize)]
struct Log {
    level: &'static str,
    timestamp: bool,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: "error",
            timestamp: false,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Inbound {
    Shadowsocks {
        tag: &'static str,
        listen: &'static str,
        listen_port: u16,
        method: String,
        password: String,
    },
    Socks {
        tag: &'static str,
        listen: &'static str,
        listen_port: u16,
    },
    Trojan {
        tag: &'static str,
        listen: &'static str,
        listen_port: u16,
        users: Vec<PasswordUser>,
        tls: ServerTls,
    },
    Anytls {
        tag: &'static str,
        listen: &'static str,
        listen_port: u16,
        users: Vec<NamedUser>,
        tls: ServerTls,
    },
    Tuic {
        tag: &'static str,
        listen: &'static str,
        listen_port: u16,
        users: Vec<TuicUser>,
        congestion_control: &'static str,
        auth_timeout: &'static str,
        zero_rtt_handshake: bool,
        tls: ServerTls,
    },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Outbound {
    Direct {
        tag: &'static str,
    },
    Shadowsocks {
        tag: &'static str,
        server: &'static str,
        server_port: u16,
        method: String,
        password: String,
    },
    Trojan {
        tag: &'static str,
        server: &'static str,
        server_port: u16,
        password: String,
        tls: ClientTls,
    },
    Anytls {
        tag: &'static str,
        server: &'static str,
        server_port: u16,
        password: String,
        tls: ClientTls,
    },
    Tuic {
        tag: &'static str,
        server: &'static str,
        server_port: u16,
        uuid: String,
        password: String,
        congestion_control: &'static str,
        zero_rtt_handshake: bool,
        tls: ClientTls,
    },
}

#[derive(Serialize)]
struct PasswordUser {
    password: String,
}

#[derive(Serialize)]
struct NamedUser {
    name: &'static str,
    password: String,
}

#[derive(Serialize)]
struct TuicUser {
    uuid: String,
    password: String,
}

#[derive(Serialize)]
struct ServerTls {
    enabled: bool,
    server_name: &'static str,
    certificate_path: String,
    key_path: String,
    alpn: Vec<&'static str>,
}

#[derive(Serialize)]
struct ClientTls {
    enabled: bool,
    server_name: &'static str,
    insecure: bool,
    alpn: Vec<&'static str>,
}

#[derive(Serialize)]
struct Route {
    rules: Vec<Rule>,
}

#[derive(Serialize)]
struct Rule {
    outbound: &'static str,
}
