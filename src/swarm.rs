/*
 * Swarm Module
 *
 * The flock itself: dense per-agent buffers for position, velocity, phase
 * clock, pending nudges and flee state, advanced one tick at a time. Each
 * tick runs two passes over the agents. The first advances phase clocks,
 * credits firing events to visible neighbors and accumulates steering forces
 * from a single shared neighbor query. The second consumes the accumulated
 * nudges and integrates motion, so every agent steers against the same
 * pre-tick snapshot of its neighbors.
 */

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::params::SwarmParams;
use crate::physics;
use crate::predator::SharedPredator;
use crate::spatial_grid::SpatialGrid;
use crate::spawn;

pub struct Swarm {
    pub params: SwarmParams,
    count: usize,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    forces: Vec<Vec3>,      // accumulated in pass one, integrated in pass two
    clocks: Vec<f32>,       // phase in [0, fire_cycle]
    nudged: Vec<u32>,       // firing events received, consumed every tick
    fleeing: Vec<f32>,      // 1.0 while chased, 0.0 otherwise
    grid: SpatialGrid,
    predator: Option<SharedPredator>,
    predator_pos: Vec3,
    rng: SmallRng,
}

impl Swarm {
    pub fn new(count: usize, params: SwarmParams) -> Self {
        Self::with_rng(count, params, SmallRng::from_entropy())
    }

    pub fn seeded(count: usize, params: SwarmParams, seed: u64) -> Self {
        Self::with_rng(count, params, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(count: usize, params: SwarmParams, mut rng: SmallRng) -> Self {
        params.validate();
        debug_assert!(count > 0, "swarm needs at least one agent");
        let positions: Vec<Vec3> = (0..count)
            .map(|_| spawn::point_in_sphere(&mut rng, params.spawn_radius))
            .collect();
        let velocities: Vec<Vec3> = (0..count)
            .map(|_| spawn::random_unit(&mut rng) * (params.desired_speed / 5.0))
            .collect();
        let clocks: Vec<f32> = (0..count)
            .map(|_| rng.gen::<f32>() * params.fire_cycle)
            .collect();
        let grid = SpatialGrid::new(SpatialGrid::resolution_for(params.visible_radius));
        Self {
            count,
            positions,
            velocities,
            forces: vec![Vec3::ZERO; count],
            clocks,
            nudged: vec![0; count],
            fleeing: vec![0.0; count],
            grid,
            predator: None,
            predator_pos: Vec3::ZERO,
            rng,
            params,
        }
    }

    pub fn set_predator(&mut self, predator: SharedPredator) {
        self.predator = Some(predator);
    }

    pub fn tick(&mut self, dt: f32) {
        // One query feeds alignment, cohesion, separation and firing alike
        let neighbors = self.grid.all_pairs_within_radius(
            &self.positions,
            self.params.visible_radius,
            self.params.use_grid,
        );
        self.update_flee_state();

        for id in 0..self.count {
            self.advance_clock(id, dt, &neighbors[id]);
            if self.fleeing[id] > 0.0 {
                self.scatter_clock(id);
            }

            let p = &self.params;
            let list = &neighbors[id];
            let mut force = Vec3::ZERO;
            force += relative_average(&self.velocities, id, p.visible_radius, list)
                * p.align_factor;
            force += relative_average(&self.positions, id, p.visible_radius, list)
                * p.cohere_factor;
            force -= relative_average(&self.positions, id, p.protected_radius, list)
                * p.avoid_factor;
            if self.fleeing[id] > 0.0 {
                force += (self.positions[id] - self.predator_pos) * p.flee_factor;
            }
            force += physics::containment_force(self.positions[id], p.habitat_radius)
                * p.habitat_factor;
            force += physics::speed_restoration(
                self.velocities[id],
                p.desired_speed,
                p.tau_speed,
                dt,
            );
            self.forces[id] = force;
        }

        for id in 0..self.count {
            self.apply_nudges(id);
            physics::integrate(
                &mut self.positions[id],
                &mut self.velocities[id],
                self.forces[id],
                dt,
            );
        }
    }

    // Advance the phase clock; on wraparound the agent fires, crediting one
    // nudge to every currently visible neighbor.
    fn advance_clock(&mut self, id: usize, dt: f32, visible: &[(usize, f32)]) {
        self.clocks[id] += dt;
        if self.clocks[id] > self.params.fire_cycle {
            self.clocks[id] %= self.params.fire_cycle;
            for &(other, _) in visible {
                self.nudged[other] += 1;
            }
        }
    }

    // Consume the nudge credits: pull the clock along the phase response
    // curve, early phases backward and late phases forward, toward the next
    // shared firing. Credits always reset, used or not.
    fn apply_nudges(&mut self, id: usize) {
        let p = &self.params;
        let amplitude = self.nudged[id].min(p.nudge_limit) as f32 * p.nudge_factor;
        let nudge = (TAU * (p.fire_cycle - self.clocks[id]) / p.fire_cycle).sin() * amplitude;
        // sin(TAU) rounds a hair below zero, so a zero clock needs the floor
        self.clocks[id] = (self.clocks[id] + nudge).max(0.0);
        self.nudged[id] = 0;
    }

    // Panic scrambles the clock backward, never below zero
    fn scatter_clock(&mut self, id: usize) {
        let scatter =
            self.params.fire_cycle * self.params.confusion_factor * self.rng.gen::<f32>();
        self.clocks[id] = (self.clocks[id] - scatter).max(0.0);
    }

    // Agents the predator senses within its chase radius are marked fleeing
    // when inside the swarm's flee radius. A disabled or absent predator
    // clears every flag.
    fn update_flee_state(&mut self) {
        self.fleeing.fill(0.0);
        let (enabled, position, chase_radius) = match &self.predator {
            Some(handle) => {
                let predator = handle.borrow();
                (predator.enabled, predator.position(), predator.params.chase_radius)
            }
            None => return,
        };
        if !enabled {
            return;
        }
        self.predator_pos = position;
        let flee_sq = self.params.flee_radius * self.params.flee_radius;
        for (id, dist_sq) in self.grid.near_point(position, &self.positions, chase_radius) {
            if dist_sq < flee_sq {
                self.fleeing[id] = 1.0;
            }
        }
    }

    // Redraw every phase clock uniformly at random, breaking synchronization.
    pub fn desynchronize(&mut self) {
        for clock in &mut self.clocks {
            *clock = self.rng.gen::<f32>() * self.params.fire_cycle;
        }
    }

    // Kuramoto order parameter over the phase clocks: near 1 when the swarm
    // fires in unison, near 0 when phases are spread evenly.
    pub fn phase_coherence(&self) -> f32 {
        let mut sum_cos = 0.0f32;
        let mut sum_sin = 0.0f32;
        for &clock in &self.clocks {
            let angle = TAU * clock / self.params.fire_cycle;
            sum_cos += angle.cos();
            sum_sin += angle.sin();
        }
        (sum_cos * sum_cos + sum_sin * sum_sin).sqrt() / self.count as f32
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn clocks(&self) -> &[f32] {
        &self.clocks
    }

    pub fn fleeing(&self) -> &[f32] {
        &self.fleeing
    }
}

// Mean offset of a property over the neighbors inside the threshold,
// relative to the agent's own value. Zero when nothing is in range.
fn relative_average(
    property: &[Vec3],
    id: usize,
    threshold: f32,
    neighbors: &[(usize, f32)],
) -> Vec3 {
    let threshold_sq = threshold * threshold;
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for &(other, dist_sq) in neighbors {
        if dist_sq < threshold_sq {
            sum += property[other];
            count += 1;
        }
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    (sum - property[id] * count as f32) / count as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PredatorParams;
    use crate::predator::Predator;
    use std::rc::Rc;

    // All gains off, forces dead, brute-force neighbor search. Individual
    // tests switch back on exactly what they measure.
    fn still_params() -> SwarmParams {
        SwarmParams {
            align_factor: 0.0,
            cohere_factor: 0.0,
            avoid_factor: 0.0,
            flee_factor: 0.0,
            habitat_factor: 0.0,
            tau_speed: f32::INFINITY,
            use_grid: false,
            ..SwarmParams::default()
        }
    }

    #[test]
    fn construction_seeds_agents_inside_the_spawn_sphere() {
        let params = SwarmParams::default();
        let swarm = Swarm::seeded(500, params.clone(), 1);
        assert_eq!(swarm.count(), 500);
        assert_eq!(swarm.positions().len(), 500);
        assert_eq!(swarm.clocks().len(), 500);
        assert_eq!(swarm.fleeing().len(), 500);
        let cruise = params.desired_speed / 5.0;
        for id in 0..500 {
            assert!(swarm.positions()[id].length() <= params.spawn_radius + 1e-4);
            assert!(swarm.clocks()[id] >= 0.0 && swarm.clocks()[id] < params.fire_cycle);
            assert!((swarm.velocities()[id].length() - cruise).abs() < 1e-3);
        }
    }

    #[test]
    fn alignment_matches_the_hand_computed_average() {
        let params = SwarmParams {
            align_factor: 0.1,
            ..still_params()
        };
        let mut swarm = Swarm::seeded(4, params, 17);
        swarm.positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.05, 0.0, 0.0),
            Vec3::new(0.0, 0.05, 0.0),
            Vec3::new(0.0, 0.0, 0.05),
        ];
        let placed = swarm.positions.clone();
        let before = swarm.velocities.clone();
        let dt = 0.02;
        swarm.tick(dt);

        // Everyone sees everyone, so each agent steers toward the mean of
        // the other three velocities, summed in index order as the
        // brute-force search reports them
        for id in 0..4 {
            let mut sum = Vec3::ZERO;
            for (other, velocity) in before.iter().enumerate() {
                if other != id {
                    sum += *velocity;
                }
            }
            let force = (sum - before[id] * 3.0) / 3.0 * 0.1;
            let velocity = before[id] + force * dt;
            assert_eq!(swarm.velocities[id], velocity, "agent {}", id);
            assert_eq!(swarm.positions[id], placed[id] + velocity * dt, "agent {}", id);
        }
    }

    #[test]
    fn separation_pushes_a_close_pair_apart_symmetrically() {
        let params = SwarmParams {
            avoid_factor: 30.0,
            ..still_params()
        };
        let mut swarm = Swarm::seeded(2, params, 5);
        swarm.positions = vec![Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0)];
        swarm.velocities = vec![Vec3::ZERO, Vec3::ZERO];
        swarm.tick(0.02);

        let v0 = swarm.velocities[0];
        let v1 = swarm.velocities[1];
        assert!(v0.x < 0.0 && v1.x > 0.0);
        assert_eq!(v0.x, -v1.x);
        assert_eq!(v0.y, 0.0);
        assert_eq!(v0.z, 0.0);
        assert!(swarm.positions[0].x < 0.0);
        assert!(swarm.positions[1].x > 0.01);
    }

    #[test]
    fn a_firing_agent_nudges_its_visible_neighbors() {
        let mut swarm = Swarm::seeded(3, still_params(), 7);
        swarm.positions = vec![
            Vec3::ZERO,
            Vec3::new(0.05, 0.0, 0.0),
            Vec3::new(0.0, 0.05, 0.0),
        ];
        swarm.clocks = vec![2.95, 0.85, 2.6];
        let dt = 0.1;
        swarm.tick(dt);

        let cycle = 3.0f32;
        let c0 = (2.95f32 + 0.1) % cycle;
        let c1 = 0.85f32 + 0.1;
        let c2 = 2.6f32 + 0.1;
        // The firer wrapped and received nothing back
        assert_eq!(swarm.clocks[0], c0);
        // An early clock is pulled backward, a late clock pushed forward
        assert_eq!(swarm.clocks[1], c1 + (TAU * (cycle - c1) / cycle).sin() * 0.02);
        assert!(swarm.clocks[1] < c1);
        assert_eq!(swarm.clocks[2], c2 + (TAU * (cycle - c2) / cycle).sin() * 0.02);
        assert!(swarm.clocks[2] > c2);
        assert_eq!(swarm.nudged, vec![0, 0, 0]);
    }

    #[test]
    fn nudges_cap_at_the_configured_limit() {
        let mut swarm = Swarm::seeded(5, still_params(), 7);
        swarm.positions = (0..5)
            .map(|i| Vec3::new(0.01 * i as f32, 0.0, 0.0))
            .collect();
        // Four agents fire at once, one over the per-tick limit of three
        swarm.clocks = vec![0.5, 2.95, 2.95, 2.95, 2.95];
        swarm.tick(0.1);

        let cycle = 3.0f32;
        let c0 = 0.5f32 + 0.1;
        let amplitude = 3.0f32 * 0.02;
        assert_eq!(
            swarm.clocks[0],
            c0 + (TAU * (cycle - c0) / cycle).sin() * amplitude
        );
        assert_eq!(swarm.nudged, vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn the_clock_wraps_after_a_long_pause() {
        let mut swarm = Swarm::seeded(1, still_params(), 2);
        swarm.clocks = vec![1.0];
        swarm.tick(7.3);
        assert_eq!(swarm.clocks[0], (1.0f32 + 7.3) % 3.0);
        assert!(swarm.clocks[0] >= 0.0 && swarm.clocks[0] < 3.0);
    }

    #[test]
    fn prey_at_the_predators_position_flees_until_it_is_disabled() {
        let mut swarm = Swarm::seeded(2, still_params(), 3);
        swarm.positions = vec![Vec3::new(0.2, 0.0, 0.0), Vec3::new(-0.9, 0.0, 0.0)];
        let predator = Predator::seeded(PredatorParams::default(), 4).shared();
        predator.borrow_mut().position = Vec3::new(0.2, 0.0, 0.0);
        predator.borrow_mut().velocity = Vec3::ZERO;
        swarm.set_predator(Rc::clone(&predator));

        swarm.tick(0.02);
        assert_eq!(swarm.fleeing, vec![1.0, 0.0]);

        predator.borrow_mut().enabled = false;
        swarm.tick(0.02);
        assert_eq!(swarm.fleeing, vec![0.0, 0.0]);
    }

    #[test]
    fn a_fleeing_agent_is_shoved_away_from_the_predator() {
        let params = SwarmParams {
            flee_factor: 3.0,
            ..still_params()
        };
        let mut swarm = Swarm::seeded(1, params, 21);
        swarm.positions = vec![Vec3::new(0.3, 0.0, 0.0)];
        swarm.velocities = vec![Vec3::ZERO];
        let predator = Predator::seeded(PredatorParams::default(), 22).shared();
        predator.borrow_mut().position = Vec3::new(0.1, 0.0, 0.0);
        swarm.set_predator(predator);
        swarm.tick(0.02);

        assert_eq!(swarm.fleeing()[0], 1.0);
        assert!(swarm.velocities[0].x > 0.0);
        assert_eq!(swarm.velocities[0].y, 0.0);
        assert_eq!(swarm.velocities[0].z, 0.0);
    }

    #[test]
    fn fleeing_scrambles_the_clock_backward() {
        let mut swarm = Swarm::seeded(2, still_params(), 3);
        swarm.positions = vec![Vec3::new(0.2, 0.0, 0.0), Vec3::new(-0.9, 0.0, 0.0)];
        swarm.clocks = vec![1.5, 1.5];
        let predator = Predator::seeded(PredatorParams::default(), 4).shared();
        predator.borrow_mut().position = Vec3::new(0.2, 0.0, 0.0);
        swarm.set_predator(predator);
        swarm.tick(0.02);

        // Chased: clock only ever loses ground, clamped at zero
        assert!(swarm.clocks[0] <= 1.5 + 0.02);
        assert!(swarm.clocks[0] >= 0.0);
        // Out of range: clock just advances
        assert_eq!(swarm.clocks[1], 1.5 + 0.02);
    }

    #[test]
    fn a_lone_agent_far_outside_is_pulled_home() {
        let params = SwarmParams {
            habitat_factor: 0.1,
            ..still_params()
        };
        let mut swarm = Swarm::seeded(1, params, 11);
        swarm.positions = vec![Vec3::new(5.0, 0.0, 0.0)];
        swarm.velocities = vec![Vec3::ZERO];
        swarm.tick(0.02);
        assert!(swarm.velocities[0].x < 0.0);
        assert_eq!(swarm.velocities[0].y, 0.0);
        assert_eq!(swarm.velocities[0].z, 0.0);
    }

    #[test]
    fn desynchronize_redraws_every_clock() {
        let mut swarm = Swarm::seeded(1000, still_params(), 13);
        swarm.clocks = vec![1.0; 1000];
        swarm.desynchronize();

        let clocks = swarm.clocks();
        assert!(clocks.iter().all(|&c| (0.0..3.0).contains(&c)));
        assert!(clocks.iter().any(|&c| c != clocks[0]));
        let mean = clocks.iter().sum::<f32>() / 1000.0;
        assert!(mean > 1.2 && mean < 1.8, "mean {}", mean);
    }

    #[test]
    fn phase_coherence_separates_unison_from_spread() {
        let mut swarm = Swarm::seeded(8, still_params(), 19);
        swarm.clocks = vec![1.0; 8];
        assert!(swarm.phase_coherence() > 0.999);
        // Evenly spread phases cancel on the circle
        swarm.clocks = (0..8).map(|i| 3.0 * i as f32 / 8.0).collect();
        assert!(swarm.phase_coherence() < 1e-3);
    }

    #[test]
    fn grid_and_brute_searches_drive_identical_clocks() {
        let fast_params = SwarmParams::default();
        let slow_params = SwarmParams {
            use_grid: false,
            ..SwarmParams::default()
        };
        let mut fast = Swarm::seeded(300, fast_params, 99);
        let mut slow = Swarm::seeded(300, slow_params, 99);
        let dt = 1.0 / 60.0;
        fast.tick(dt);
        slow.tick(dt);

        // Identical neighbor sets mean identical firing and nudging
        assert_eq!(fast.clocks(), slow.clocks());
        // Forces are summed in a different neighbor order, so motion agrees
        // only up to rounding
        for id in 0..300 {
            assert!((fast.positions()[id] - slow.positions()[id]).length() < 1e-4);
            assert!((fast.velocities()[id] - slow.velocities()[id]).length() < 1e-4);
        }
    }
}
