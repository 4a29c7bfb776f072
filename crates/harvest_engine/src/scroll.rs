use crate::driver::ScrollMetrics;

/// Bounds of the adaptive upward scroll step.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollBounds {
    /// Fraction of the scrollable range covered by one step.
    pub ratio: f64,
    pub min_step: f64,
    pub max_step: f64,
    /// `scroll_top` at or below this counts as being at the top.
    pub top_tolerance: f64,
}

impl Default for ScrollBounds {
    fn default() -> Self {
        Self {
            ratio: 0.8,
            min_step: 120.0,
            max_step: 900.0,
            top_tolerance: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollDecision {
    /// Move the viewport to this `scroll_top`.
    ScrollTo(f64),
    /// Already at the top; wait for older content to materialize.
    AtTop,
}

impl ScrollBounds {
    pub fn step(&self, metrics: &ScrollMetrics) -> f64 {
        (metrics.scrollable_range() * self.ratio).clamp(self.min_step, self.max_step)
    }

    pub fn decide(&self, metrics: &ScrollMetrics) -> ScrollDecision {
        if metrics.scroll_top > self.top_tolerance {
            ScrollDecision::ScrollTo((metrics.scroll_top - self.step(metrics)).max(0.0))
        } else {
            ScrollDecision::AtTop
        }
    }
}
