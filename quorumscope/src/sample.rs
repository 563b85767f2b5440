//! Built-in telecom pipeline used when no input file is given.

use quorumscope_core::{Component, FaultType};

/// Five-stage linear chain:
/// AuthCore -> QueueRelay -> EdgeOrchestrator -> WebGateway -> CloudInference.
pub fn telecom_chain() -> Vec<Component> {
    vec![
        Component::new("AuthCore", 47.0, 2.4, 21.0, 520.0, 97.6, 165)
            .with_faults([FaultType::Retry, FaultType::Drift]),
        Component::new("QueueRelay", 63.0, 3.1, 27.0, 430.0, 96.8, 118)
            .with_dependency("AuthCore")
            .with_faults([FaultType::Backpressure]),
        Component::new("EdgeOrchestrator", 58.0, 4.6, 31.0, 610.0, 96.9, 190)
            .with_dependency("QueueRelay")
            .with_faults([FaultType::NodePartition]),
        Component::new("WebGateway", 52.0, 3.7, 38.0, 690.0, 94.7, 215)
            .with_dependency("EdgeOrchestrator")
            .with_faults([FaultType::Livelock]),
        Component::new("CloudInference", 74.0, 9.3, 44.0, 1150.0, 92.4, 275)
            .with_dependency("WebGateway")
            .with_faults([FaultType::Crash, FaultType::Timeout, FaultType::Replay]),
    ]
}

/// Redundant gateways that can stand in for a failed primary.
pub fn gateway_backups() -> Vec<Component> {
    vec![
        Component::new("WebGateway-Backup1", 52.0, 3.7, 40.0, 680.0, 95.0, 210)
            .with_dependency("EdgeOrchestrator")
            .with_faults([FaultType::Livelock]),
        Component::new("WebGateway-Backup2", 52.0, 3.7, 42.0, 670.0, 94.5, 205)
            .with_dependency("EdgeOrchestrator")
            .with_faults([FaultType::Livelock]),
    ]
}
