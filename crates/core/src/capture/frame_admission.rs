use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lets at most one frame be in flight between capture and the end of its
/// detection pass.
#[derive(Clone, Debug, Default)]
pub struct FrameAdmission {
    in_flight: Arc<AtomicBool>,
}

/// Held by the admitted frame's job. Dropping it reopens admission.
#[derive(Debug)]
pub struct AdmissionPermit {
    in_flight: Arc<AtomicBool>,
}

impl FrameAdmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a frame unless another one is still in flight.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AdmissionPermit {
                in_flight: self.in_flight.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
