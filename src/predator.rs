/*
 * Predator Module
 *
 * A single hunter steered toward an externally supplied target point. The
 * swarm holds a shared handle to read its position each tick and flag agents
 * inside the chase radius. A disabled predator is frozen in place and exerts
 * no influence until re-enabled.
 */

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::params::PredatorParams;
use crate::physics;
use crate::spawn;

pub type SharedPredator = Rc<RefCell<Predator>>;

pub struct Predator {
    pub params: PredatorParams,
    pub enabled: bool,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    target: Vec3,
}

impl Predator {
    pub fn new(params: PredatorParams) -> Self {
        Self::with_rng(params, &mut SmallRng::from_entropy())
    }

    pub fn seeded(params: PredatorParams, seed: u64) -> Self {
        Self::with_rng(params, &mut SmallRng::seed_from_u64(seed))
    }

    fn with_rng(params: PredatorParams, rng: &mut SmallRng) -> Self {
        params.validate();
        let position = spawn::point_in_sphere(rng, params.spawn_radius);
        let velocity = spawn::random_unit(rng) * params.desired_speed;
        Self {
            params,
            enabled: true,
            position,
            velocity,
            target: Vec3::ZERO,
        }
    }

    pub fn shared(self) -> SharedPredator {
        Rc::new(RefCell::new(self))
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }
        let p = &self.params;
        let chase = (self.target - self.position).normalize_or_zero() * p.chase_factor;
        let force = chase
            + physics::containment_force(self.position, p.habitat_radius) * p.habitat_factor
            + physics::speed_restoration(self.velocity, p.desired_speed, p.tau_speed, dt);
        physics::integrate(&mut self.position, &mut self.velocity, force, dt);
    }
}
