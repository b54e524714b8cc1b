use super::math::Vec3;

pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(self, to: Self, t: f32) -> Self {
        Vec3::lerp(self, to, t)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ease {
    Linear,
    #[default]
    OutQuad,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::OutQuad => t * (2.0 - t),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Every loop plays start to end.
    #[default]
    Restart,
    /// Odd loops play backwards (out-and-back).
    Yoyo,
}

/// Time-based interpolation between two values.
///
/// A tween runs `loops` times for `duration` seconds each. It is advanced
/// explicitly by the owner every tick; nothing runs in the background, so
/// dropping or overwriting the tween is the cancellation mechanism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    loops: u32,
    loop_mode: LoopMode,
    ease: Ease,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, duration_seconds: f32) -> Self {
        let duration = if duration_seconds.is_finite() {
            duration_seconds.max(0.0)
        } else {
            0.0
        };
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            loops: 1,
            loop_mode: LoopMode::Restart,
            ease: Ease::default(),
        }
    }

    pub fn with_loops(mut self, loops: u32, loop_mode: LoopMode) -> Self {
        self.loops = loops.max(1);
        self.loop_mode = loop_mode;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn total_duration(&self) -> f32 {
        self.duration * self.loops as f32
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total_duration()
    }

    pub fn advance(&mut self, dt_seconds: f32) -> T {
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            self.elapsed = (self.elapsed + dt_seconds).min(self.total_duration());
        }
        self.value()
    }

    pub fn value(&self) -> T {
        let (loop_index, local_t) = self.loop_position();
        let reversed = self.loop_mode == LoopMode::Yoyo && loop_index % 2 == 1;
        let t = if reversed {
            self.ease.apply(1.0 - local_t)
        } else {
            self.ease.apply(local_t)
        };
        self.from.lerp(self.to, t)
    }

    fn loop_position(&self) -> (u32, f32) {
        let last_loop = self.loops - 1;
        if self.duration <= 0.0 || self.is_finished() {
            return (last_loop, 1.0);
        }
        let loop_index = ((self.elapsed / self.duration).floor() as u32).min(last_loop);
        let local = (self.elapsed - loop_index as f32 * self.duration) / self.duration;
        (loop_index, local.clamp(0.0, 1.0))
    }
}
