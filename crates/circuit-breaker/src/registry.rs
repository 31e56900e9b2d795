//! Per-lease circuit breaker registry.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::circuit::{Circuit, CircuitConfig};

/// Holds one [`Circuit`] per lease, created lazily on first use.
pub struct CircuitRegistry {
    config: CircuitConfig,
    circuits: RwLock<HashMap<String, Arc<Circuit>>>,
}

impl CircuitRegistry {
    /// Creates an empty registry using `config` for every lease's breaker.
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            circuits: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the breaker for `lease_id`, creating it (Closed) on first use.
    pub fn get_or_create(&self, lease_id: &str) -> Arc<Circuit> {
        if let Some(circuit) = self.circuits.read().unwrap().get(lease_id) {
            return circuit.clone();
        }

        let mut circuits = self.circuits.write().unwrap();

        if let Some(circuit) = circuits.get(lease_id) {
            return circuit.clone();
        }

        let circuit = Arc::new(Circuit::new(self.config));
        circuits.insert(lease_id.to_string(), circuit.clone());

        circuit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leases_get_independent_breakers() {
        let registry = CircuitRegistry::new(CircuitConfig::default());

        let a = registry.get_or_create("lease-a");
        let b = registry.get_or_create("lease-b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &registry.get_or_create("lease-a")));
    }
}
