//! Snapshots and digests
//!
//! Captures the fleet state after every tick (the state log) and provides
//! SHA-256 fingerprints of a run's configuration and results.
//!
//! # Critical Invariants
//!
//! - **Determinism**: same config + same dataset produces the same digest
//! - **Append-only**: the state log only grows, one snapshot per tick

use crate::core::time::SimTime;
use crate::metrics::TickRecord;
use crate::models::instance::{Instance, InstanceId, InstanceState};
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// State of one instance at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: InstanceId,
    pub state: InstanceState,
    pub life: f64,
    pub active_requests: usize,
    /// Admission limit in effect (capacity unless draining)
    pub effective_capacity: u32,
    /// 1 or 2 while draining
    pub shutdown_phase: Option<u8>,
}

impl From<&Instance> for InstanceSnapshot {
    fn from(instance: &Instance) -> Self {
        InstanceSnapshot {
            id: instance.id(),
            state: instance.state(),
            life: instance.life(),
            active_requests: instance.active_count(),
            effective_capacity: instance.admission_limit(),
            shutdown_phase: instance.shutdown_phase().map(|phase| phase.number()),
        }
    }
}

/// Whole-fleet state at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub tick: usize,
    pub time: SimTime,
    pub total_load: u64,
    pub planning_load: f64,
    pub unallocated: u64,
    pub instances: Vec<InstanceSnapshot>,
}

impl FleetSnapshot {
    /// Capture `instances` as they stand after the tick described by `record`
    pub fn capture(record: &TickRecord, instances: &[Instance]) -> Self {
        FleetSnapshot {
            tick: record.tick,
            time: record.time,
            total_load: record.total_load,
            planning_load: record.planning_load,
            unallocated: record.unallocated,
            instances: instances.iter().map(InstanceSnapshot::from).collect(),
        }
    }
}

/// Append-only per-tick record of every instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateLog {
    snapshots: Vec<FleetSnapshot>,
}

impl StateLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, snapshot: FleetSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[FleetSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// History of one instance, one entry per tick it existed
    pub fn history(&self, id: InstanceId) -> Vec<(SimTime, &InstanceSnapshot)> {
        self.snapshots
            .iter()
            .filter_map(|s| s.instances.get(id.0).map(|i| (s.time, i)))
            .collect()
    }
}

// ============================================================================
// Hashing
// ============================================================================

/// SHA-256 of a configuration's canonical JSON
///
/// Object keys are sorted at every level, so the hash depends only on field
/// names and values.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Compact JSON with object keys in sorted order
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Fingerprint of a run's tick records
///
/// Two runs with identical inputs must produce identical digests.
pub fn compute_run_digest(records: &[TickRecord]) -> Result<String, SimulationError> {
    let json = serde_json::to_vec(records).map_err(|e| {
        SimulationError::SerializationError(format!("Tick record serialization failed: {}", e))
    })?;
    Ok(sha256_hex(&json))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instance::{DrainSchedule, ShutdownPhase};
    use crate::orchestrator::SimulationConfig;
    use serde_json::json;

    #[test]
    fn test_config_hash_is_stable() {
        let config = SimulationConfig::default();

        let hash = compute_config_hash(&config).unwrap();

        assert_eq!(hash, compute_config_hash(&config.clone()).unwrap());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_config_hash_changes_with_any_field() {
        let base = compute_config_hash(&SimulationConfig::default()).unwrap();
        let drain = SimulationConfig {
            drain_duration: 20,
            ..Default::default()
        };
        let ceiling = SimulationConfig {
            max_instances: 50,
            ..Default::default()
        };

        assert_ne!(base, compute_config_hash(&drain).unwrap());
        assert_ne!(base, compute_config_hash(&ceiling).unwrap());
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({"zeta": [{"b": 1, "a": 2}], "alpha": {"y": null, "x": "s"}});

        let mut out = String::new();
        write_canonical(&value, &mut out);

        assert_eq!(out, r#"{"alpha":{"x":"s","y":null},"zeta":[{"a":2,"b":1}]}"#);
    }

    #[test]
    fn test_snapshot_reports_drain_phase_capacity() {
        let mut instance = Instance::new(InstanceId(4), 12_000);
        instance.activate(1.0);
        instance.age(1.0);
        instance.evaluate_shutdown(20, &DrainSchedule::default());

        let snapshot = InstanceSnapshot::from(&instance);

        assert_eq!(snapshot.state, InstanceState::ShuttingDown);
        assert_eq!(snapshot.effective_capacity, 600);
        assert_eq!(
            snapshot.shutdown_phase,
            Some(ShutdownPhase::Phase1.number())
        );
    }
}
