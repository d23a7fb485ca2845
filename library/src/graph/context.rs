/// Per-frame input to graph evaluation, supplied by the owning frame loop.
///
/// Sampling only ever reads `time`, so results never depend on the order in
/// which slots happen to be pulled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluationContext {
    /// Global time in seconds.
    pub time: f64,
    pub frame: u64,
}

impl EvaluationContext {
    pub fn new(time: f64) -> Self {
        Self { time, frame: 0 }
    }

    pub fn at_frame(frame: u64, fps: f64) -> Self {
        let time = if fps > 0.0 { frame as f64 / fps } else { 0.0 };
        Self { time, frame }
    }

    /// Moves to a new global time and counts the frame.
    pub fn advance_to(&mut self, time: f64) {
        self.time = time;
        self.frame += 1;
    }
}
