pub mod error;
pub mod greedy;
pub mod sampler;
pub mod top_k;

pub use error::{Result, SamplerError};
pub use greedy::argmax;
pub use sampler::{score_desc, TokenLogit};
pub use top_k::top_k;
