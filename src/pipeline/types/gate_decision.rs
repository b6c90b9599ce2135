use crate::common::Color;
use crate::pipeline::types::ColorCategory;

/// Outcome of evaluating one smoothed color against the change gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accept(AcceptedChange),
    Reject(GateRejection),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept(_))
    }

    pub fn accepted(&self) -> Option<&AcceptedChange> {
        match self {
            GateDecision::Accept(change) => Some(change),
            GateDecision::Reject(_) => None,
        }
    }
}

/// A color the gate wants published, and the color the ramp starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedChange {
    pub from: Color,
    pub to: Color,
    pub category: ColorCategory,
    /// True when the force-update timer, not the distance or stability checks,
    /// let this change through.
    pub forced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateRejection {
    /// Too close to the current target and the force timer has not expired.
    Insignificant,
    /// Far enough away but the recent history disagrees on the color name.
    Unstable,
    /// Same color name as the last publish, inside the cooldown window.
    Cooldown,
}

impl GateRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            GateRejection::Insignificant => "insignificant",
            GateRejection::Unstable => "unstable",
            GateRejection::Cooldown => "cooldown",
        }
    }
}
