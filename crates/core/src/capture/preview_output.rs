use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::shared::frame::Frame;

/// Latest-frame slot the UI renders the live preview from.
///
/// Publishing replaces whatever was there, so a slow reader only ever sees
/// the newest frame. Independent of detection admission.
#[derive(Clone, Default)]
pub struct PreviewOutput {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    frame: Option<Frame>,
    published: u64,
}

impl PreviewOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        let mut slot = self.lock();
        slot.frame = Some(frame);
        slot.published += 1;
    }

    /// Takes the newest unread frame, if any.
    pub fn take_latest(&self) -> Option<Frame> {
        self.lock().frame.take()
    }

    /// Copies the newest frame without consuming it.
    pub fn peek_latest(&self) -> Option<Frame> {
        self.lock().frame.clone()
    }

    /// Total frames ever published.
    pub fn published(&self) -> u64 {
        self.lock().published
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
