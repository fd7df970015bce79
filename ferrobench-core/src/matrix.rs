//! Declarative test-case matrices
//!
//! A [`TestCaseSpec`] names a protocol family plus the variant parameters
//! one iteration exercises. The built-in suites reproduce the matrices the
//! harness ships with; callers can also hand-build specs for ad hoc runs.

use crate::materials::KeyType;
use crate::ports::PortPair;
use std::fmt;

/// QUIC congestion control mode (TUIC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionControl {
    Bbr,
    Cubic,
    NewReno,
}

impl CongestionControl {
    pub fn as_str(self) -> &'static str {
        match self {
            CongestionControl::Bbr => "bbr",
            CongestionControl::Cubic => "cubic",
            CongestionControl::NewReno => "new_reno",
        }
    }
}

impl fmt::Display for CongestionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol family plus the parameters that vary inside it
#[derive(Debug, Clone)]
pub enum ProtocolVariant {
    /// Shadowsocks via the sing-box engine
    Shadowsocks { method: String },
    /// Trojan over TLS via the sing-box engine
    Trojan { key_type: KeyType },
    /// AnyTLS via the sing-box engine
    AnyTls { key_type: KeyType },
    /// TUIC over QUIC via the sing-box engine
    Tuic {
        key_type: KeyType,
        congestion: CongestionControl,
    },
    /// Shadowsocks via the standalone shadowsocks-rust pair
    ShadowsocksRust { method: String },
    /// AnyTLS via the standalone anytls pair
    AnyTlsRs { key_type: KeyType },
}

impl ProtocolVariant {
    /// Certificate key type this variant depends on, if any.
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            ProtocolVariant::Shadowsocks { .. } | ProtocolVariant::ShadowsocksRust { .. } => None,
            ProtocolVariant::Trojan { key_type }
            | ProtocolVariant::AnyTls { key_type }
            | ProtocolVariant::AnyTlsRs { key_type }
            | ProtocolVariant::Tuic { key_type, .. } => Some(*key_type),
        }
    }
}

/// One immutable entry of the test matrix
#[derive(Debug, Clone)]
pub struct TestCaseSpec {
    /// Row label in the summary table
    pub label: String,
    /// Pre-bound ports; the orchestrator allocates a pair when absent
    pub ports: Option<PortPair>,
    /// Protocol family and variant parameters
    pub variant: ProtocolVariant,
}

impl TestCaseSpec {
    pub fn new(label: impl Into<String>, variant: ProtocolVariant) -> Self {
        Self {
            label: label.into(),
            ports: None,
            variant,
        }
    }

    #[must_use]
    pub fn with_ports(mut self, ports: PortPair) -> Self {
        self.ports = Some(ports);
        self
    }
}

/// Built-in benchmark suites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Shadowsocks,
    Trojan,
    AnyTls,
    Tuic,
    SsRust,
    AnyTlsRs,
}

impl Suite {
    pub fn as_str(self) -> &'static str {
        match self {
            Suite::Shadowsocks => "shadowsocks",
            Suite::Trojan => "trojan",
            Suite::AnyTls => "anytls",
            Suite::Tuic => "tuic",
            Suite::SsRust => "ss-rust",
            Suite::AnyTlsRs => "anytls-rs",
        }
    }

    /// The ordered test cases of this suite.
    pub fn matrix(self) -> Vec<TestCaseSpec> {
        match self {
            Suite::Shadowsocks => SS_METHODS
                .iter()
                .map(|m| {
                    TestCaseSpec::new(
                        *m,
                        ProtocolVariant::Shadowsocks {
                            method: (*m).to_string(),
                        },
                    )
                })
                .collect(),
            Suite::Trojan => KEY_TYPES
                .iter()
                .map(|kt| {
                    TestCaseSpec::new(
                        format!("trojan-tls-{kt}"),
                        ProtocolVariant::Trojan { key_type: *kt },
                    )
                })
                .collect(),
            Suite::AnyTls => KEY_TYPES
                .iter()
                .map(|kt| {
                    TestCaseSpec::new(
                        format!("anytls-{kt}"),
                        ProtocolVariant::AnyTls { key_type: *kt },
                    )
                })
                .collect(),
            Suite::Tuic => {
                let mut cases = Vec::new();
                for congestion in [CongestionControl::Bbr, CongestionControl::NewReno] {
                    for kt in KEY_TYPES {
                        cases.push(TestCaseSpec::new(
                            format!("tuic-tls-{kt}-{congestion}"),
                            ProtocolVariant::Tuic {
                                key_type: kt,
                                congestion,
                            },
                        ));
                    }
                }
                cases
            }
            Suite::SsRust => SS_RUST_METHODS
                .iter()
                .map(|m| {
                    TestCaseSpec::new(
                        *m,
                        ProtocolVariant::ShadowsocksRust {
                            method: (*m).to_string(),
                        },
                    )
                })
                .collect(),
            Suite::AnyTlsRs => KEY_TYPES
                .iter()
                .map(|kt| {
                    TestCaseSpec::new(
                        format!("anytls-{kt}"),
                        ProtocolVariant::AnyTlsRs { key_type: *kt },
                    )
                })
                .collect(),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const KEY_TYPES: [KeyType; 2] = [KeyType::Rsa4096, KeyType::Ed25519];

const SS_METHODS: &[&str] = &[
    "none",
    "aes-128-gcm",
    "aes-256-gcm",
    "chacha20-ietf-poly1305",
    "2022-blake3-aes-128-gcm",
    "2022-blake3-aes-256-gcm",
    "2022-blake3-chacha20-poly1305",
];

// shadowsocks-rust has no 2022-blake3-chacha20-poly1305 row in the shipped
// matrix; otherwise identical to the engine suite.
const SS_RUST_METHODS: &[&str] = &[
    "none",
    "aes-128-gcm",
    "aes-256-gcm",
    "chacha20-ietf-poly1305",
    "2022-blake3-aes-128-gcm",
    "2022-blake3-aes-256-gcm",
];
