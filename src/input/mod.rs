//! Pointer, touch and wheel input, translated into scroll deltas.

pub mod dispatcher;
pub mod scrollbar;
pub mod touch;
pub mod wheel;

pub use dispatcher::{InputDispatcher, InputTarget, ListenerId, PointerCapture, ResizeDrag};
pub use scrollbar::{Scrollbar, ScrollbarPart};
pub use touch::{PixelConverter, TouchLayout, TouchManager, TouchRegion, TouchScroll};
pub use wheel::{normalize, DeltaMode, WheelInput, WheelScroll};
