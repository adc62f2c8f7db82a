pub mod generator;
pub mod model;
pub mod play;
pub mod project;
pub mod runner;
pub mod trace;

#[cfg(test)]
mod test;
