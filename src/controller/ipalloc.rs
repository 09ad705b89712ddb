//! # VLAN IP Allocation
//!
//! Keyed registry of allocated VLAN host addresses, one set per network.
//! Allocation hands out the lowest free host address inside the declared
//! CIDR; the set is append-only until the owning network is torn down,
//! which releases the whole set at once. Like the quota registry this is an
//! explicit keyed store passed into engine construction, not package-level
//! state.

use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::sync::RwLock;

use thiserror::Error;

/// Allocation failures
#[derive(Debug, Error)]
pub enum IpAllocError {
    #[error("invalid VLAN CIDR {0:?}")]
    InvalidCidr(String),
    /// Every usable host address in the range is taken
    #[error("VLAN range {0} exhausted")]
    RangeExhausted(String),
}

impl From<IpAllocError> for crate::controller::error::ReconcileError {
    fn from(err: IpAllocError) -> Self {
        match err {
            IpAllocError::InvalidCidr(_) => Self::Validation(err.to_string()),
            IpAllocError::RangeExhausted(_) => Self::Capacity(err.to_string()),
        }
    }
}

/// Lock-protected map of allocated addresses keyed by VLAN label
#[derive(Debug, Default)]
pub struct VlanIpRegistry {
    inner: RwLock<HashMap<String, BTreeSet<u32>>>,
}

impl VlanIpRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the lowest free host address in `cidr` for the given VLAN.
    ///
    /// The network address and the first host (gateway) are reserved and
    /// never handed out; the broadcast address is excluded.
    pub fn allocate(&self, vlan: &str, cidr: &str) -> Result<Ipv4Addr, IpAllocError> {
        let (network, prefix) = parse_cidr(cidr)?;
        let host_bits = 32 - u32::from(prefix);
        let broadcast = network | ((1u64 << host_bits) - 1) as u32;
        let first_host = network + 2;
        let last_host = broadcast.saturating_sub(1);
        if first_host > last_host {
            return Err(IpAllocError::InvalidCidr(cidr.to_string()));
        }

        let mut inner = self.inner.write().expect("vlan ip lock poisoned");
        let allocated = inner.entry(vlan.to_string()).or_default();
        for candidate in first_host..=last_host {
            if !allocated.contains(&candidate) {
                allocated.insert(candidate);
                return Ok(Ipv4Addr::from(candidate));
            }
        }
        Err(IpAllocError::RangeExhausted(cidr.to_string()))
    }

    /// Drop the whole allocation set for a VLAN (network teardown)
    pub fn release(&self, vlan: &str) {
        self.inner
            .write()
            .expect("vlan ip lock poisoned")
            .remove(vlan);
    }

    /// Number of addresses currently allocated for a VLAN
    #[must_use]
    pub fn allocated_count(&self, vlan: &str) -> usize {
        self.inner
            .read()
            .expect("vlan ip lock poisoned")
            .get(vlan)
            .map_or(0, BTreeSet::len)
    }
}

fn parse_cidr(cidr: &str) -> Result<(u32, u8), IpAllocError> {
    let invalid = || IpAllocError::InvalidCidr(cidr.to_string());
    let (addr, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    // A range needs room for network, gateway, and at least one host
    if prefix > 30 {
        return Err(invalid());
    }
    let base = u32::from(addr);
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    };
    Ok((base & mask, prefix))
}
