//! Loopback port allocation
//!
//! Two monotonically increasing counters, one for server listeners and one
//! for client SOCKS ingresses. Ports are never reused within a run: the
//! stride trades address space for collision safety against listeners
//! lingering in TIME_WAIT after teardown. Exhaustion of the ephemeral
//! range is an unchecked edge case.

use ferrobench_common::PortsConfig;

/// One iteration's port assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    /// Tunnel server listener port
    pub server: u16,
    /// Local SOCKS ingress port
    pub client: u16,
}

/// Hands out disjoint port pairs across the iteration matrix
#[derive(Debug)]
pub struct PortAllocator {
    next_server: u16,
    next_client: u16,
    stride: u16,
}

impl PortAllocator {
    pub fn new(config: PortsConfig) -> Self {
        Self {
            next_server: config.base_server,
            next_client: config.base_client,
            stride: config.stride.max(1),
        }
    }

    /// Return the current pair and advance both counters by the stride.
    pub fn next_pair(&mut self) -> PortPair {
        let pair = PortPair {
            server: self.next_server,
            client: self.next_client,
        };
        self.next_server += self.stride;
        self.next_client += self.stride;
        pair
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(PortsConfig::default())
    }
}
