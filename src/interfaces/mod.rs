// Interfaces exposed by optional adapters.
//
// Each submodule is feature-gated by the capability it implements.
#[cfg(feature = "http-service")]
pub mod http;
