const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Braille spinner advanced once per idle tick while requests are in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadingState {
    frame_index: usize,
}

impl LoadingState {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    pub(crate) fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }

    pub(crate) fn label(&self, message: &str) -> String {
        format!("{} {message}", self.current_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::{FRAMES, LoadingState};

    #[test]
    fn spinner_wraps_after_last_frame() {
        let mut loading = LoadingState::default();
        for _ in 0..FRAMES.len() {
            loading.next_frame();
        }
        assert_eq!(loading.current_frame(), FRAMES[0]);
        loading.next_frame();
        assert_eq!(loading.label("loading"), format!("{} loading", FRAMES[1]));
    }
}
