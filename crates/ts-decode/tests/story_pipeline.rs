//! End-to-end generation through the embedding adapter and a BPE tokenizer.

use ts_decode::{
    CancellationToken, DecodeState, DecoderConfig, FinishReason, StoryGenerator, StringSink,
};
use ts_model::{
    AdapterConfig, BpeTokenizer, EmbeddingAdapter, Embeddings, ForwardModel, ScoreMode,
    Tokenizer, Vocab,
};
use ts_tensor::{Shape, Tensor};

const L: usize = 8;

const WORDS: [&str; 11] = [
    "<|endoftext|>",
    "Once",
    " upon",
    " a",
    " time",
    "O",
    "n",
    "c",
    "e",
    "On",
    "ce",
];
const V: usize = WORDS.len();

/// Story order: Once -> upon -> a -> time -> end-of-sequence.
fn successor(token: usize) -> usize {
    match token {
        1..=3 => token + 1,
        _ => 0,
    }
}

/// Hidden states are one-hot token vectors. At every position the model
/// replaces the token with its successor. Runs a fixed two-lane graph.
struct SuccessorModel {
    lane_counts: Vec<usize>,
}

impl ForwardModel for SuccessorModel {
    fn context_length(&self) -> usize {
        L
    }

    fn hidden_size(&self) -> usize {
        V
    }

    fn lanes(&self) -> Option<usize> {
        Some(2)
    }

    fn run(&mut self, inputs: &[Tensor]) -> ts_model::Result<Vec<Tensor>> {
        self.lane_counts.push(inputs.len());
        inputs
            .iter()
            .map(|input| -> ts_model::Result<Tensor> {
                let data = input.data_f32()?;
                let mut out = vec![0.0; L * V];
                for (pos, row) in data.chunks(V).enumerate() {
                    let current = row
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1))
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    out[pos * V + successor(current)] = 1.0;
                }
                // Channel-last layout, as some compiled graphs emit.
                Ok(Tensor::new(out, Shape::new(vec![1, L, 1, V]))?)
            })
            .collect()
    }
}

fn identity() -> Tensor {
    let mut data = vec![0.0; V * V];
    for i in 0..V {
        data[i * V + i] = 1.0;
    }
    Tensor::new(data, Shape::matrix(V, V)).unwrap()
}

fn adapter(score_mode: ScoreMode) -> EmbeddingAdapter<SuccessorModel> {
    let embeddings = Embeddings::new(identity(), Tensor::zeros(Shape::matrix(L, V)), identity())
        .unwrap();
    let config = AdapterConfig {
        context_length: L,
        pad_token_id: 0,
        score_mode,
        max_batch: 2,
    };
    let model = SuccessorModel {
        lane_counts: Vec::new(),
    };
    EmbeddingAdapter::with_cpu(model, embeddings, config).unwrap()
}

fn tokenizer() -> BpeTokenizer {
    let vocab = Vocab::new(WORDS.iter().map(|w| w.to_string()).collect(), 0, 0).unwrap();
    let merges = BpeTokenizer::parse_merges(["O n", "c e", "On ce"]).unwrap();
    BpeTokenizer::new(vocab, merges).unwrap()
}

#[test]
fn once_upon_a_time_end_to_end() {
    let config = DecoderConfig::default().with_context_length(L);
    let mut generator =
        StoryGenerator::new(adapter(ScoreMode::Logits), tokenizer(), config).unwrap();
    let mut sink = StringSink::new();

    let story = generator
        .generate("Once", &CancellationToken::new(), &mut sink)
        .unwrap();

    assert_eq!(story.text, "Once upon a time");
    assert_eq!(story.outcome.emitted, vec![2, 3, 4, 0]);
    assert_eq!(story.outcome.state, DecodeState::Done);
    assert_eq!(sink.text, " upon a time");
    assert_eq!(sink.finish, Some(FinishReason::Completed { truncated: false }));
    // Beam of one still fills both lanes of the graph.
    assert_eq!(generator.decoder().adapter().model().lane_counts, vec![2; 4]);
}

#[test]
fn log_probabilities_pick_the_same_story() {
    let config = DecoderConfig::default().with_context_length(L);
    let mut generator =
        StoryGenerator::new(adapter(ScoreMode::LogSoftmax), tokenizer(), config).unwrap();

    let story = generator
        .generate("Once", &CancellationToken::new(), &mut StringSink::new())
        .unwrap();

    assert_eq!(story.text, "Once upon a time");
    assert!(story.outcome.beam[0].score < 0.0);
}

#[test]
fn prompt_merged_from_characters() {
    let tok = tokenizer();
    assert_eq!(tok.encode("Once").unwrap(), vec![1]);
    assert_eq!(tok.decode(&[1, 2, 3, 4, 0], true), "Once upon a time");
    // No single-character token covers the space.
    assert!(tok.encode("Once upon").is_err());
}

#[test]
fn context_length_mismatch_is_rejected_up_front() {
    let config = DecoderConfig::default().with_context_length(L * 2);
    assert!(StoryGenerator::new(adapter(ScoreMode::Logits), tokenizer(), config).is_err());
}
