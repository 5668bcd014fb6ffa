/*
 * Fireflock Simulation Core - Module Definitions
 *
 * This file defines the module structure for the flocking simulation core.
 * It organizes the code into logical components for better maintainability.
 */

// Re-export key components for easier access
pub use params::{PredatorParams, SwarmParams};
pub use predator::{Predator, SharedPredator};
pub use spatial_grid::SpatialGrid;
pub use swarm::Swarm;

// Define modules
pub mod params;
pub mod physics;
pub mod predator;
pub mod spatial_grid;
pub mod spawn;
pub mod swarm;

// Constants
pub const DOMAIN_WIDTH: f32 = 2.0;
pub const MAX_RESOLUTION: usize = 64;
