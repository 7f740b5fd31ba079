pub mod builder;
pub mod derivatives;
pub mod engine;
pub mod initial;
pub mod integrator;
pub mod state;
