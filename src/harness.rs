//!
//! Adapter for fuzzers that drive a custom mutator through
//! init / fuzz / trim callbacks.

use rand::rngs::StdRng;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::Error;

/// Callbacks a fuzzing harness invokes on a custom mutator.
///
/// Trimming is optional; the provided defaults report that there is nothing
/// to trim.
pub trait CustomMutator: Sized {
    type Error;

    /// Called once per process with the harness seed.
    fn init(seed: u32) -> Result<Self, Self::Error>;

    /// Returns a mutated copy of `buf`, at most `max_size` bytes long.
    fn fuzz(&mut self, buf: &[u8], add_buf: Option<&[u8]>, max_size: usize) -> Vec<u8>;

    /// Number of trimming steps for `buf`.
    fn init_trim(&mut self, _buf: &[u8]) -> usize {
        0
    }

    /// Next trimmed candidate, if trimming is supported.
    fn trim(&mut self) -> Option<Vec<u8>> {
        None
    }

    /// Index of the next trimming step.
    fn post_trim(&mut self, _success: bool) -> usize {
        0
    }
}

impl CustomMutator for Engine<StdRng> {
    type Error = Error;

    /// Seeds an engine configured from `WASM_MUTATOR_CONFIG`, if set.
    fn init(seed: u32) -> Result<Self, Error> {
        let config = EngineConfig::from_env()?;
        Ok(Engine::with_config(seed, config)?)
    }

    fn fuzz(&mut self, buf: &[u8], add_buf: Option<&[u8]>, max_size: usize) -> Vec<u8> {
        let out = self.mutate(buf, add_buf.unwrap_or_default());
        if out.len() > max_size {
            tracing::debug!("Mutated output ({} bytes) exceeds max size {}; keeping input", out.len(), max_size);
            let mut fallback = buf.to_vec();
            fallback.truncate(max_size);
            return fallback;
        }
        out
    }
}
