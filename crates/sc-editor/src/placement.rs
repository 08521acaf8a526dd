//! Sidebar-to-canvas placement.
//!
//! A drop carries a template id and the pointer's client coordinates. The
//! coordinates are made canvas-local (minus the canvas box origin, plus its
//! scroll offset), then virtual (x divided by the scale). Size comes from
//! an off-screen measurement when a `Measurer` can provide one, otherwise
//! from the registry's default table.
//!
//! Drops that can't be resolved (canvas not mounted yet, no client offset)
//! are ignored without error: they are mount-timing races, not user errors.

use crate::store::EditorStore;
use sc_core::geometry::{Position, Size};
use sc_core::id::NodeId;
use sc_core::{Block, Point, Vec2};

/// A sidebar item released over the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    pub block_type: String,
    /// Pointer position in client (viewport) coordinates.
    pub client: Option<Point>,
}

/// Where the canvas sits in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasFrame {
    /// Top-left of the canvas bounding box, client coordinates.
    pub origin: Point,
    pub scroll: Vec2,
}

impl CanvasFrame {
    pub fn new(origin: Point, scroll: Vec2) -> Self {
        Self { origin, scroll }
    }

    /// Client coordinates → canvas-local screen pixels.
    pub fn to_local(&self, client: Point) -> Point {
        client - self.origin.to_vec2() + self.scroll
    }
}

/// Renders a block somewhere invisible to read its natural size.
pub trait Measurer {
    type Handle;

    fn mount(&mut self, block: &Block) -> Option<Self::Handle>;
    /// Rendered box in screen pixels.
    fn measure(&mut self, handle: &Self::Handle) -> Option<Size>;
    fn unmount(&mut self, handle: Self::Handle);
}

/// A mounted measurement node. Unmounts on drop, whatever happened in
/// between.
pub struct MeasureScope<'a, M: Measurer> {
    measurer: &'a mut M,
    handle: Option<M::Handle>,
}

impl<'a, M: Measurer> MeasureScope<'a, M> {
    pub fn mount(measurer: &'a mut M, block: &Block) -> Option<Self> {
        let handle = measurer.mount(block)?;
        Some(Self {
            measurer,
            handle: Some(handle),
        })
    }

    pub fn measure(&mut self) -> Option<Size> {
        self.handle.as_ref().and_then(|h| self.measurer.measure(h))
    }
}

impl<M: Measurer> Drop for MeasureScope<'_, M> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.measurer.unmount(handle);
        }
    }
}

/// Mount, measure, unmount. `None` for failed or degenerate measurements.
pub fn measure_block<M: Measurer>(measurer: &mut M, block: &Block) -> Option<Size> {
    let mut scope = MeasureScope::mount(measurer, block)?;
    scope.measure().filter(|s| !s.is_degenerate())
}

/// Always defers to the registry's default sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSizes;

impl Measurer for DefaultSizes {
    type Handle = ();

    fn mount(&mut self, _block: &Block) -> Option<()> {
        None
    }

    fn measure(&mut self, _handle: &()) -> Option<Size> {
        None
    }

    fn unmount(&mut self, _handle: ()) {}
}

/// A size the host already measured (the browser bridge passes the DOM
/// box it read).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PremeasuredSize(pub Option<Size>);

impl Measurer for PremeasuredSize {
    type Handle = ();

    fn mount(&mut self, _block: &Block) -> Option<()> {
        Some(())
    }

    fn measure(&mut self, _handle: &()) -> Option<Size> {
        self.0
    }

    fn unmount(&mut self, _handle: ()) {}
}

/// Handle a drop. Returns the new block's id, or `None` when the drop was
/// ignored. The block is appended with one history entry and selected.
pub fn place<M: Measurer>(
    store: &mut EditorStore,
    frame: Option<&CanvasFrame>,
    drop: &DropEvent,
    measurer: &mut M,
) -> Option<NodeId> {
    let (Some(frame), Some(client)) = (frame, drop.client) else {
        log::debug!("drop of {} ignored: canvas frame or client offset missing", drop.block_type);
        return None;
    };
    let scale = store.scale();
    let local = frame.to_local(client);
    let position = Position::new(scale.x_to_virtual(local.x as f32), local.y as f32);

    let mut block = store.registry().instantiate(&drop.block_type, position);
    if let Some(measured) = measure_block(measurer, &block) {
        block.size = Size::new(scale.x_to_virtual(measured.width), measured.height);
    }
    log::debug!(
        "placing {} at ({}, {}) size {}x{}",
        block.block_type,
        block.position.x,
        block.position.y,
        block.size.width,
        block.size.height
    );
    Some(store.add_block(block))
}
