// Few-shot prompt construction: balanced exemplar sampling, message assembly,
// and the diagnostic token estimate. No I/O happens in this module.

pub mod prompt;
pub mod sampler;
pub mod tokens;
