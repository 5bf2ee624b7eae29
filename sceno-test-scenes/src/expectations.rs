use sceno::{DrawStateFlags, FrameHandle, URect};

/// Expected dynamic state for one recorded draw.
pub struct DrawExpectation {
    /// Scissor rect that must be in effect, or `None` when the draw must
    /// be unclipped.
    pub scissor: Option<URect>,
    /// Viewport that must be in effect, or `None` when no viewport
    /// override applies.
    pub viewport: Option<URect>,
    /// Human-readable label for failure messages.
    pub label: &'static str,
}

impl DrawExpectation {
    pub fn clipped(scissor: URect, label: &'static str) -> Self {
        Self { scissor: Some(scissor), viewport: None, label }
    }

    pub fn unclipped(label: &'static str) -> Self {
        Self { scissor: None, viewport: None, label }
    }

    pub fn with_viewport(mut self, viewport: URect) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

/// Validates the frame's recorded draw list against the expectations, in
/// order. Must run before the frame is finished, while its state table is
/// still alive.
///
/// Returns a list of human-readable failure descriptions. An empty list
/// means all expectations passed.
pub fn check_draw_states(frame: &FrameHandle<'_>, expectations: &[DrawExpectation]) -> Vec<String> {
    let mut failures = Vec::new();
    let draws = frame.draw_ops();

    if draws.len() != expectations.len() {
        failures.push(format!(
            "expected {} draws but the frame recorded {}",
            expectations.len(),
            draws.len(),
        ));
    }

    for (index, (op, expectation)) in draws.iter().zip(expectations).enumerate() {
        if op.material.is_none() {
            failures.push(format!(
                "[{}] draw #{index} has no material",
                expectation.label,
            ));
        }

        let state = frame.state(op.state);
        let scissor = state
            .filter(|values| values.flags.contains(DrawStateFlags::SCISSOR))
            .map(|values| values.scissor);
        let viewport = state
            .filter(|values| values.flags.contains(DrawStateFlags::VIEWPORT))
            .map(|values| values.viewport);

        match (expectation.scissor, scissor) {
            (Some(expected), Some(actual)) if expected != actual => {
                failures.push(format!(
                    "[{}] draw #{index} expected scissor {expected} but got {actual}",
                    expectation.label,
                ));
            }
            (Some(expected), None) => {
                failures.push(format!(
                    "[{}] draw #{index} expected scissor {expected} but no scissor applies",
                    expectation.label,
                ));
            }
            (None, Some(actual)) => {
                failures.push(format!(
                    "[{}] draw #{index} expected no scissor but got {actual}",
                    expectation.label,
                ));
            }
            _ => {}
        }

        match (expectation.viewport, viewport) {
            (Some(expected), Some(actual)) if expected != actual => {
                failures.push(format!(
                    "[{}] draw #{index} expected viewport {expected} but got {actual}",
                    expectation.label,
                ));
            }
            (Some(expected), None) => {
                failures.push(format!(
                    "[{}] draw #{index} expected viewport {expected} but no viewport applies",
                    expectation.label,
                ));
            }
            (None, Some(actual)) => {
                failures.push(format!(
                    "[{}] draw #{index} expected no viewport but got {actual}",
                    expectation.label,
                ));
            }
            _ => {}
        }
    }

    failures
}
