/*
 * Simulation Parameters Module
 *
 * This module defines the tunable parameter sets for the agent swarm and the
 * predator. All fields are plain numbers so a driver can adjust them directly
 * between ticks. Defaults are calibrated for a few thousand agents in the
 * unit-scale habitat.
 */

// Parameters for the agent swarm
#[derive(Clone, Debug)]
pub struct SwarmParams {
    pub desired_speed: f32,    // cruising speed the agents drift back to
    pub tau_speed: f32,        // time constant of the speed restoration, s
    pub fire_cycle: f32,       // oscillator period, s
    pub nudge_factor: f32,     // clock shift per received nudge
    pub nudge_limit: u32,      // cap on nudges consumed per frame
    pub confusion_factor: f32, // clock scatter while fleeing, fraction of the cycle
    pub visible_radius: f32,   // alignment and cohesion range
    pub protected_radius: f32, // separation range
    pub flee_radius: f32,      // sensed predators closer than this trigger fleeing
    pub habitat_radius: f32,   // soft containment boundary
    pub spawn_radius: f32,     // agents start inside this sphere
    pub align_factor: f32,
    pub cohere_factor: f32,
    pub avoid_factor: f32,
    pub flee_factor: f32,
    pub habitat_factor: f32,
    pub use_grid: bool,        // grid-accelerated neighbor search vs brute force
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            desired_speed: 0.2,
            tau_speed: 0.01,
            fire_cycle: 3.0,
            nudge_factor: 0.02,
            nudge_limit: 3,
            confusion_factor: 0.2,
            visible_radius: 0.15,
            protected_radius: 0.05,
            flee_radius: 0.6,
            habitat_radius: 1.6,
            spawn_radius: 1.8,
            align_factor: 0.1,
            cohere_factor: 10.0,
            avoid_factor: 30.0,
            flee_factor: 3.0,
            habitat_factor: 0.1,
            use_grid: true,
        }
    }
}

impl SwarmParams {
    // Debug-build sanity checks. Negative gains or radii never crash, they
    // just produce silently nonsensical motion.
    pub fn validate(&self) {
        debug_assert!(self.desired_speed >= 0.0);
        debug_assert!(self.tau_speed > 0.0);
        debug_assert!(self.fire_cycle > 0.0);
        debug_assert!(self.nudge_factor >= 0.0);
        debug_assert!(self.confusion_factor >= 0.0);
        debug_assert!(self.visible_radius >= 0.0);
        debug_assert!(self.protected_radius >= 0.0);
        debug_assert!(self.flee_radius >= 0.0);
        debug_assert!(self.habitat_radius >= 0.0);
        debug_assert!(self.spawn_radius >= 0.0);
        debug_assert!(self.align_factor >= 0.0);
        debug_assert!(self.cohere_factor >= 0.0);
        debug_assert!(self.avoid_factor >= 0.0);
        debug_assert!(self.flee_factor >= 0.0);
        debug_assert!(self.habitat_factor >= 0.0);
    }
}

// Parameters for the predator
#[derive(Clone, Debug)]
pub struct PredatorParams {
    pub desired_speed: f32,  // cruising speed restored over time
    pub tau_speed: f32,      // time constant of the speed restoration, s
    pub chase_radius: f32,   // sensing range for candidate prey
    pub habitat_radius: f32, // kept on a tighter leash than the swarm
    pub chase_factor: f32,   // steering gain toward the target
    pub habitat_factor: f32,
    pub spawn_radius: f32,   // starts inside this sphere
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            desired_speed: 0.25,
            tau_speed: 0.01,
            chase_radius: 0.5,
            habitat_radius: 1.0,
            chase_factor: 0.99,
            habitat_factor: 1.0,
            spawn_radius: 0.5,
        }
    }
}

impl PredatorParams {
    pub fn validate(&self) {
        debug_assert!(self.desired_speed >= 0.0);
        debug_assert!(self.tau_speed > 0.0);
        debug_assert!(self.chase_radius >= 0.0);
        debug_assert!(self.habitat_radius >= 0.0);
        debug_assert!(self.chase_factor >= 0.0);
        debug_assert!(self.habitat_factor >= 0.0);
        debug_assert!(self.spawn_radius >= 0.0);
    }
}
