mod change_gate;

pub use change_gate::{ChangeGate, GateState, GateThresholds};
