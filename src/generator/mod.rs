//! ns-3 script generation.

mod script;

pub use script::{GenError, GeneratedScript, ScriptGenerator, ScriptOptions};
