/// How a generation run ended, as reported to the presentation side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// End-of-sequence on every hypothesis, or the step cap (`truncated`).
    Completed { truncated: bool },
    /// The run was cancelled; text already delivered stands.
    Interrupted,
}

/// Receiver for incrementally generated story text.
///
/// Gets one fragment per decoding step, in order, then exactly one
/// `on_finish` unless generation fails.
pub trait TextSink {
    fn on_fragment(&mut self, fragment: &str);

    fn on_finish(&mut self, _reason: FinishReason) {}
}

/// Collects fragments in memory.
#[derive(Debug, Default, Clone)]
pub struct StringSink {
    pub text: String,
    pub fragments: Vec<String>,
    pub finish: Option<FinishReason>,
}

impl StringSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextSink for StringSink {
    fn on_fragment(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments.push(fragment.to_string());
    }

    fn on_finish(&mut self, reason: FinishReason) {
        self.finish = Some(reason);
    }
}

/// Adapts a closure into a sink. The finish signal is ignored.
pub struct FnSink<F>(pub F);

impl<F: FnMut(&str)> TextSink for FnSink<F> {
    fn on_fragment(&mut self, fragment: &str) {
        (self.0)(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_sink() {
        let mut sink = StringSink::new();
        sink.on_fragment("Once");
        sink.on_fragment(" upon");
        sink.on_finish(FinishReason::Interrupted);
        assert_eq!(sink.text, "Once upon");
        assert_eq!(sink.fragments, vec!["Once", " upon"]);
        assert_eq!(sink.finish, Some(FinishReason::Interrupted));
    }

    #[test]
    fn test_fn_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink(|s: &str| seen.push(s.len()));
            sink.on_fragment("abc");
            sink.on_fragment("");
            sink.on_finish(FinishReason::Completed { truncated: false });
        }
        assert_eq!(seen, vec![3, 0]);
    }
}
