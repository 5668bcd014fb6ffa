/*
 * Spawn Helpers Module
 *
 * Random placement routines shared by the swarm and predator constructors.
 */

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

// Uniform random point inside a sphere centered on the origin.
pub fn point_in_sphere(rng: &mut impl Rng, radius: f32) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    // Uniform in cos(phi), not phi, or samples pile up at the poles
    let cos_phi = rng.gen_range(-1.0f32..1.0);
    let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
    // Cube root keeps the volume density uniform
    let r = radius * rng.gen::<f32>().cbrt();
    Vec3::new(
        r * sin_phi * theta.cos(),
        r * sin_phi * theta.sin(),
        r * cos_phi,
    )
}

// Random direction of unit length.
pub fn random_unit(rng: &mut impl Rng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let cos_phi = rng.gen_range(-1.0f32..1.0);
    let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
    Vec3::new(
        sin_phi * theta.cos(),
        sin_phi * theta.sin(),
        cos_phi,
    )
}
