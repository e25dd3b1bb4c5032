use ts_tensor::Tensor;

/// An opaque, fixed-shape forward model.
///
/// This is the accelerator-facing half of the pipeline: it maps one hidden
/// state tensor of shape `[context_length, hidden_size]` per lane to an
/// output tensor with the same number of elements. Weights, precision and
/// hardware execution are entirely the implementation's business.
pub trait ForwardModel: Send {
    /// Context length the compiled graph was exported with.
    fn context_length(&self) -> usize;

    /// Width of the hidden state at the model's input and output.
    fn hidden_size(&self) -> usize;

    /// Number of parallel lanes the graph requires, if it is fixed.
    ///
    /// When `Some(n)`, every call to [`ForwardModel::run`] receives exactly
    /// `n` inputs.
    fn lanes(&self) -> Option<usize> {
        None
    }

    /// Run the model over a batch of hidden-state inputs.
    ///
    /// Must return one output per input, in order. Outputs may use any
    /// shape (for example channel-last) with `context_length * hidden_size`
    /// elements; the adapter reshapes them.
    fn run(&mut self, inputs: &[Tensor]) -> crate::Result<Vec<Tensor>>;
}
