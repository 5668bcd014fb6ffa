/*
 * Physics Module
 *
 * Force helpers and the integration step shared by the swarm and the
 * predator. Forces are accumulated into a single vector per entity and
 * applied with semi-implicit Euler: velocity first, then position.
 */

use glam::Vec3;

// Soft containment: once outside the habitat radius the pull-back force is
// the negated position, so it grows with distance from the origin.
pub fn containment_force(position: Vec3, habitat_radius: f32) -> Vec3 {
    if position.length_squared() > habitat_radius * habitat_radius {
        -position
    } else {
        Vec3::ZERO
    }
}

// First-order pull of the speed toward a desired cruising speed, with time
// constant tau. Slower agents accelerate along their heading, faster ones
// brake along it.
pub fn speed_restoration(velocity: Vec3, desired_speed: f32, tau: f32, dt: f32) -> Vec3 {
    velocity * ((desired_speed - velocity.length()) * (dt / tau))
}

// Semi-implicit Euler step.
pub fn integrate(position: &mut Vec3, velocity: &mut Vec3, force: Vec3, dt: f32) {
    *velocity += force * dt;
    *position += *velocity * dt;
}
