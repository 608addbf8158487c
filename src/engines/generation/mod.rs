pub mod planner;
pub mod operators;
pub mod memory_store;
pub mod evolution_engine;
pub mod progress;
pub mod report;

pub use planner::PopulationPlanner;
pub use operators::{carry_over, crossover, evolve_population, mutate};
pub use memory_store::{MemoryStore, MemoryStream, MetaRule};
pub use evolution_engine::EvolutionEngine;
pub use progress::{LogProgressCallback, ProgressCallback};
pub use report::{RunReport, REPORT_FILE};
