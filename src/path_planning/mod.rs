// Coverage planning strategies and the cost model they share

pub mod cost_model;
pub mod frontier;
pub mod best_first_coverage;
pub mod greedy_online;
pub mod reachability_bfs;
pub mod random_walk;

pub use cost_model::*;
pub use frontier::*;
pub use best_first_coverage::*;
pub use greedy_online::*;
pub use reachability_bfs::*;
pub use random_walk::*;
