/// Arming collaborator consulted by the ground-command handler.
///
/// The full flight-mode state machine lives elsewhere; the link only needs
/// to know whether an arm request may be honoured and to request it.
pub trait FlightMode {
    fn is_prearm(&self) -> bool;
    fn arm(&mut self);
}

/// Minimal one-way latch: starts pre-arm, stays armed once armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmingLatch {
    #[default]
    PreArm,
    Armed,
}

impl FlightMode for ArmingLatch {
    fn is_prearm(&self) -> bool {
        matches!(self, ArmingLatch::PreArm)
    }

    fn arm(&mut self) {
        if *self == ArmingLatch::PreArm {
            info!("flight mode: armed");
        }
        *self = ArmingLatch::Armed;
    }
}
