use crate::composite::{history::TransformHistory, overlay::Transform};
use crate::foundation::core::{Point, Size};

/// Narrowest width, in display pixels, a resize gesture can produce.
pub const MIN_OVERLAY_WIDTH: f64 = 20.0;

/// Longest side of a freshly placed overlay, in display pixels.
pub const DEFAULT_PLACEMENT_BASE: f64 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Move,
    Resize,
    Rotate,
}

/// What a gesture captured when it started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grab {
    pub start: Point,
    pub initial: Transform,
    pub center: Point,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(Grab),
    Resizing(Grab),
    Rotating(Grab),
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn kind(&self) -> Option<GestureKind> {
        match self {
            Self::Idle => None,
            Self::Dragging(_) => Some(GestureKind::Move),
            Self::Resizing(_) => Some(GestureKind::Resize),
            Self::Rotating(_) => Some(GestureKind::Rotate),
        }
    }

    fn grab(&self) -> Option<&Grab> {
        match self {
            Self::Idle => None,
            Self::Dragging(g) | Self::Resizing(g) | Self::Rotating(g) => Some(g),
        }
    }
}

/// One interactive overlay placement session.
///
/// Pointer positions are container-relative display coordinates. Gestures only mutate
/// the live [`Transform`]; `end` commits it to the history. Nothing here touches pixels.
#[derive(Clone, Debug)]
pub struct GestureSession {
    state: GestureState,
    live: Transform,
    history: TransformHistory,
}

impl Default for GestureSession {
    fn default() -> Self {
        Self::new(Transform::default())
    }
}

impl GestureSession {
    pub fn new(initial: Transform) -> Self {
        Self {
            state: GestureState::Idle,
            live: initial,
            history: TransformHistory::new(initial),
        }
    }

    /// Place a new overlay centred in `container` and restart the history from it.
    pub fn place(&mut self, container: Size, overlay: Size, base: f64) -> Transform {
        let t = Transform::centered_in(container, overlay, base);
        self.state = GestureState::Idle;
        self.live = t;
        self.history.reset(t);
        t
    }

    pub fn transform(&self) -> &Transform {
        &self.live
    }

    pub fn history(&self) -> &TransformHistory {
        &self.history
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Start a gesture. A gesture already in progress is ended (and committed) first.
    pub fn begin(&mut self, kind: GestureKind, pointer: Point) {
        if !self.state.is_idle() {
            self.end();
        }
        let grab = Grab {
            start: pointer,
            initial: self.live,
            center: self.live.center(),
        };
        self.state = match kind {
            GestureKind::Move => GestureState::Dragging(grab),
            GestureKind::Resize => GestureState::Resizing(grab),
            GestureKind::Rotate => GestureState::Rotating(grab),
        };
    }

    /// Apply a pointer move to the live transform. Returns `None` when idle.
    pub fn update(&mut self, pointer: Point) -> Option<Transform> {
        let next = match self.state {
            GestureState::Idle => return None,
            GestureState::Dragging(g) => moved(&g, pointer),
            GestureState::Resizing(g) => resized(&g, pointer),
            GestureState::Rotating(g) => rotated(&g, pointer),
        };
        self.live = next;
        Some(next)
    }

    /// Finish the active gesture and commit the live transform. Returns `false` when idle.
    pub fn end(&mut self) -> bool {
        if self.state.grab().is_none() {
            return false;
        }
        self.state = GestureState::Idle;
        self.history.push(self.live);
        tracing::debug!(cursor = self.history.cursor(), "gesture committed");
        true
    }

    pub fn undo(&mut self) -> Option<Transform> {
        self.end();
        let t = self.history.undo()?;
        self.live = t;
        Some(t)
    }

    pub fn redo(&mut self) -> Option<Transform> {
        self.end();
        let t = self.history.redo()?;
        self.live = t;
        Some(t)
    }
}

fn moved(g: &Grab, pointer: Point) -> Transform {
    let d = pointer - g.start;
    Transform {
        x: g.initial.x + d.x,
        y: g.initial.y + d.y,
        ..g.initial
    }
}

fn resized(g: &Grab, pointer: Point) -> Transform {
    let d = pointer - g.start;
    let ratio = if g.initial.width > 0.0 {
        g.initial.height / g.initial.width
    } else {
        1.0
    };
    let width = (g.initial.width + d.x).max(MIN_OVERLAY_WIDTH);
    Transform {
        width,
        height: width * ratio,
        ..g.initial
    }
}

fn rotated(g: &Grab, pointer: Point) -> Transform {
    let start = g.start - g.center;
    let now = pointer - g.center;
    let delta = (now.y.atan2(now.x) - start.y.atan2(start.x)).to_degrees();
    Transform {
        rotation_degrees: (g.initial.rotation_degrees + delta) % 360.0,
        ..g.initial
    }
}
