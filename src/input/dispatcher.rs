//! Routing of pointer input to the control's input handlers.
//!
//! Each control owns one dispatcher. Handlers subscribe for the input they
//! consume; a handler that starts a drag captures the pointer so that moves
//! and the release reach it even when the pointer leaves its area.

use crate::types::Axis;

/// Input consumer of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTarget {
    Scrollbar(Axis),
    ColumnResize,
    Touch,
    Wheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A column-header edge drag in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeDrag {
    /// Leaf index of the column being resized
    pub column: usize,
    pub start_x: f64,
    pub start_width: f64,
}

impl ResizeDrag {
    /// Width for a pointer at `x`, never below `min_width`
    pub fn width_at(&self, x: f64, min_width: f64) -> f64 {
        (self.start_width + x - self.start_x).max(min_width)
    }
}

/// Who owns the pointer until it is released
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerCapture {
    Scrollbar(Axis),
    ColumnResize(ResizeDrag),
}

#[derive(Debug, Clone, Default)]
pub struct InputDispatcher {
    listeners: Vec<(ListenerId, InputTarget)>,
    next_id: u64,
    capture: Option<PointerCapture>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, target: InputTarget) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, target));
        id
    }

    /// Returns false for an unknown listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        let removed = self.listeners.len() != before;
        if removed && !self.has_capture_owner() {
            self.capture = None;
        }
        removed
    }

    pub fn unsubscribe_all(&mut self) {
        self.listeners.clear();
        self.capture = None;
    }

    pub fn is_subscribed(&self, target: InputTarget) -> bool {
        self.listeners.iter().any(|(_, t)| *t == target)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Capture the pointer; ignored if the capturing target is not subscribed.
    pub fn capture(&mut self, capture: PointerCapture) -> bool {
        if !self.is_subscribed(Self::owner(&capture)) {
            return false;
        }
        self.capture = Some(capture);
        true
    }

    pub fn captured(&self) -> Option<&PointerCapture> {
        self.capture.as_ref()
    }

    pub fn captured_mut(&mut self) -> Option<&mut PointerCapture> {
        self.capture.as_mut()
    }

    pub fn release(&mut self) -> Option<PointerCapture> {
        self.capture.take()
    }

    fn owner(capture: &PointerCapture) -> InputTarget {
        match capture {
            PointerCapture::Scrollbar(axis) => InputTarget::Scrollbar(*axis),
            PointerCapture::ColumnResize(_) => InputTarget::ColumnResize,
        }
    }

    fn has_capture_owner(&self) -> bool {
        match &self.capture {
            Some(capture) => self.is_subscribed(Self::owner(capture)),
            None => true,
        }
    }
}
