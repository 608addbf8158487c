pub mod risk_gate;

pub use risk_gate::RiskGate;
