//! Modules shipped in-process under the `builtin` namespace

mod echo;
mod sample;

pub use echo::EchoModule;
pub use sample::SampleModule;
