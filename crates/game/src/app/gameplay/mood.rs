use engine::MoodBarVisual;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GradientKey {
    pub(crate) position: f32,
    pub(crate) color: [u8; 4],
}

/// Piecewise-linear colour ramp over [0, 1]. Positions outside the first and
/// last key clamp to the end colours.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Gradient {
    keys: Vec<GradientKey>,
}

impl Gradient {
    pub(crate) fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.retain(|key| key.position.is_finite());
        keys.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { keys }
    }

    pub(crate) fn evaluate(&self, t: f32) -> [u8; 4] {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return [255, 255, 255, 255];
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t > b.position {
                continue;
            }
            let span = b.position - a.position;
            let local = if span > 0.0 {
                (t - a.position) / span
            } else {
                1.0
            };
            return lerp_color(a.color, b.color, local);
        }
        last.color
    }
}

fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (channel, (from, to)) in out.iter_mut().zip(a.into_iter().zip(b)) {
        let value = from as f32 + (to as f32 - from as f32) * t;
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Receives the mood projection: a colour and a fill in [0, 1].
pub(crate) trait MoodIndicator {
    fn show(&mut self, color: [u8; 4], fill: f32);
}

/// HUD bar state mirrored into the world every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct MoodBar {
    visual: Option<MoodBarVisual>,
}

impl MoodBar {
    pub(crate) fn visual(&self) -> Option<MoodBarVisual> {
        self.visual
    }
}

impl MoodIndicator for MoodBar {
    fn show(&mut self, color: [u8; 4], fill: f32) {
        self.visual = Some(MoodBarVisual { color, fill });
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MoodModel<I = MoodBar> {
    value: f32,
    gradient: Gradient,
    indicator: Option<I>,
}

impl<I: MoodIndicator> MoodModel<I> {
    pub(crate) fn new(initial: f32, gradient: Gradient) -> Self {
        let value = if initial.is_finite() {
            initial.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            value,
            gradient,
            indicator: None,
        }
    }

    pub(crate) fn with_indicator(mut self, indicator: I) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub(crate) fn value(&self) -> f32 {
        self.value
    }

    pub(crate) fn indicator(&self) -> Option<&I> {
        self.indicator.as_ref()
    }

    /// Adds `delta`, clamps to [0, 1] and refreshes the indicator if one is
    /// attached. Returns the new value.
    pub(crate) fn apply_stress(&mut self, delta: f32) -> f32 {
        if !delta.is_finite() {
            warn!(delta, mood = self.value, "mood_stress_delta_not_finite_ignored");
            return self.value;
        }
        self.value = (self.value + delta).clamp(0.0, 1.0);
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.show(self.gradient.evaluate(self.value), self.value);
        }
        debug!(delta, mood = self.value, "mood_updated");
        self.value
    }
}
