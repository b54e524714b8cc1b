use super::math::Vec2;

/// Pointer events buffered between ticks. Each carries the cursor position at
/// the moment the button changed state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PrimaryPress { position_px: Vec2 },
    PrimaryRelease { position_px: Vec2 },
    SecondaryPress { position_px: Vec2 },
}

impl InputEvent {
    pub fn position_px(&self) -> Vec2 {
        match *self {
            InputEvent::PrimaryPress { position_px }
            | InputEvent::PrimaryRelease { position_px }
            | InputEvent::SecondaryPress { position_px } => position_px,
        }
    }
}

/// FIFO of pointer events. The loop pushes as the OS reports them, the tick
/// drains everything at one fixed point.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pending: Vec<InputEvent>,
}

impl InputQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    cursor_position_px: Option<Vec2>,
    events: Vec<InputEvent>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        cursor_position_px: Option<Vec2>,
        events: Vec<InputEvent>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            cursor_position_px,
            events,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_event(mut self, event: InputEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}
