//! Canvas size tracking.
//!
//! Each component that draws into a canvas owns a [`ResizeState`] for it and
//! a [`ResizeSubscription`] to the host's [`ResizeBroadcaster`]. Dropping the
//! subscription detaches it, so a discarded canvas leaves nothing behind in
//! the broadcaster.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use flamelens_protocol::{Mat3, Rect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasId(pub u64);

/// Canvas size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The canvas as a rect at the origin of physical space.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeEvent {
    pub canvas: CanvasId,
    pub logical_width: f64,
    pub logical_height: f64,
    pub device_pixel_ratio: f64,
}

impl ResizeEvent {
    /// `floor(logical · dpr)` per axis; negative or NaN sizes become 0.
    pub fn physical_size(&self) -> PhysicalSize {
        let to_px = |logical: f64| {
            let px = (logical * self.device_pixel_ratio).floor();
            if px.is_finite() && px > 0.0 {
                px.min(f64::from(u32::MAX)) as u32
            } else {
                0
            }
        };
        PhysicalSize::new(to_px(self.logical_width), to_px(self.logical_height))
    }
}

/// The last known size of one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    canvas: CanvasId,
    device_pixel_ratio: f64,
    physical: PhysicalSize,
}

impl ResizeState {
    pub fn new(canvas: CanvasId) -> Self {
        Self {
            canvas,
            device_pixel_ratio: 1.0,
            physical: PhysicalSize::default(),
        }
    }

    pub fn canvas(&self) -> CanvasId {
        self.canvas
    }

    pub fn physical(&self) -> PhysicalSize {
        self.physical
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Record `event`, returning whether the physical size changed. Events
    /// for other canvases are ignored.
    pub fn apply(&mut self, event: &ResizeEvent) -> bool {
        if event.canvas != self.canvas {
            return false;
        }
        let physical = event.physical_size();
        self.device_pixel_ratio = event.device_pixel_ratio;
        if physical == self.physical {
            return false;
        }
        log::debug!(
            "canvas {:?} resized to {}x{}",
            self.canvas,
            physical.width,
            physical.height
        );
        self.physical = physical;
        true
    }

    /// Apply the latest event pending on `subscription`, if any.
    pub fn poll(&mut self, subscription: &ResizeSubscription) -> bool {
        subscription
            .take_pending()
            .is_some_and(|event| self.apply(&event))
    }

    /// Pixel → clip space for the current size, `None` while the canvas has
    /// no area.
    pub fn projection(&self) -> Option<Mat3> {
        (!self.physical.is_empty()).then(|| {
            Mat3::projection(
                f64::from(self.physical.width),
                f64::from(self.physical.height),
            )
        })
    }
}

#[derive(Debug)]
struct Slot {
    id: u64,
    canvas: CanvasId,
    pending: Option<ResizeEvent>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    slots: Vec<Slot>,
}

/// Fans resize events out to the subscriptions of the matching canvas.
#[derive(Debug, Default)]
pub struct ResizeBroadcaster {
    registry: Rc<RefCell<Registry>>,
}

impl ResizeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, canvas: CanvasId) -> ResizeSubscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.slots.push(Slot {
            id,
            canvas,
            pending: None,
        });
        ResizeSubscription {
            id,
            canvas,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every subscription of its canvas, replacing any
    /// event they have not consumed yet. Returns the number of receivers.
    pub fn dispatch(&self, event: ResizeEvent) -> usize {
        let mut registry = self.registry.borrow_mut();
        let mut delivered = 0;
        for slot in registry.slots.iter_mut().filter(|s| s.canvas == event.canvas) {
            slot.pending = Some(event);
            delivered += 1;
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().slots.len()
    }
}

/// Handle to a subscription; unsubscribes on drop.
#[derive(Debug)]
pub struct ResizeSubscription {
    id: u64,
    canvas: CanvasId,
    registry: Weak<RefCell<Registry>>,
}

impl ResizeSubscription {
    pub fn canvas(&self) -> CanvasId {
        self.canvas
    }

    /// The most recent undelivered event.
    pub fn take_pending(&self) -> Option<ResizeEvent> {
        let registry = self.registry.upgrade()?;
        let mut registry = registry.borrow_mut();
        registry
            .slots
            .iter_mut()
            .find(|s| s.id == self.id)
            .and_then(|s| s.pending.take())
    }

    pub fn unsubscribe(self) {}
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().slots.retain(|s| s.id != self.id);
        }
    }
}
