/*
 * Fireflock Demo Driver
 *
 * Headless stand-in for the rendering collaborator: owns the frame clock,
 * steers the predator along a Lissajous sweep the way a pointer would, and
 * ticks the predator before the swarm every frame. Halfway through the run
 * it scrambles the phase clocks, at three quarters it retires the predator,
 * and it logs the synchronization recovering either way.
 */

use std::rc::Rc;

use glam::Vec3;
use log::info;

use fireflock::{Predator, PredatorParams, Swarm, SwarmParams};

const AGENT_COUNT: usize = 2000;
const DT: f32 = 1.0 / 60.0;
const RUN_SECONDS: f32 = 30.0;

fn main() {
    env_logger::init();

    let mut swarm = Swarm::new(AGENT_COUNT, SwarmParams::default());
    let predator = Predator::new(PredatorParams::default()).shared();
    swarm.set_predator(Rc::clone(&predator));
    info!("simulating {} agents, dt {:.4}s", AGENT_COUNT, DT);

    let frames = (RUN_SECONDS / DT) as u32;
    for frame in 0..frames {
        let t = frame as f32 * DT;

        if frame == frames / 2 {
            info!("desynchronizing the swarm");
            swarm.desynchronize();
        }
        if frame == frames * 3 / 4 {
            info!("retiring the predator");
            predator.borrow_mut().enabled = false;
        }

        // A pointer-like sweep through the habitat
        let target = Vec3::new(
            0.8 * (0.31 * t).sin(),
            0.6 * (0.47 * t).cos(),
            0.5 * (0.23 * t).sin(),
        );

        // The swarm reads the predator's current-frame position, so the
        // predator always steps first
        {
            let mut predator = predator.borrow_mut();
            predator.set_target(target);
            predator.tick(DT);
        }
        swarm.tick(DT);

        if frame % 60 == 0 {
            let chased = swarm.fleeing().iter().filter(|&&f| f > 0.0).count();
            let mean_speed = swarm.velocities().iter().map(|v| v.length()).sum::<f32>()
                / AGENT_COUNT as f32;
            info!(
                "t={:5.1}s coherence={:.3} fleeing={:4} mean speed={:.3}",
                t,
                swarm.phase_coherence(),
                chased,
                mean_speed
            );
        }
    }
}
