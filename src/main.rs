//! Demo: a few agents crossing a grid world with avoidance enabled

use std::time::Duration;

use crowdnav::prelude::*;

const TICK: f32 = 0.05;
const SPEED: f32 = 3.0;

fn main() {
    env_logger::init();
    log::info!("starting navigation demo");

    let mesh = NavMeshBuilder::grid(16, 16, 2.0, 4);
    let nav = NavigationSystem::new(mesh, NavConfig::default());

    // three agents crossing the map in different directions
    let mut agents = vec![
        (AgentId(1), Vec3::new(1.0, 0.0, 1.0), Vec3::new(30.0, 0.0, 30.0)),
        (AgentId(2), Vec3::new(30.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 30.0)),
        (AgentId(3), Vec3::new(1.0, 0.0, 30.0), Vec3::new(30.0, 0.0, 1.0)),
    ];

    for &(id, position, goal) in &agents {
        match AvoidanceAgent::new(id, position, 0.5, SPEED) {
            Ok(agent) => nav.update_agent_state(agent),
            Err(e) => {
                log::error!("{id}: invalid avoidance setup: {e}");
                return;
            }
        }
        let rx = nav.request_path(PathRequest::new(id, position, goal));
        match rx.recv_timeout(Duration::from_secs(3)) {
            Ok(PathResult::Found { path, .. }) => {
                log::info!(
                    "{id}: path of {} waypoints, cost {:.1}",
                    path.waypoints().len(),
                    path.total_cost()
                );
            }
            Ok(PathResult::Partial { path, .. }) => {
                log::warn!("{id}: partial path, {} waypoints", path.waypoints().len());
            }
            Ok(PathResult::Unreachable { reason, .. }) => {
                log::warn!("{id}: unreachable: {reason}");
            }
            Err(e) => log::error!("{id}: no path result: {e}"),
        }
    }

    for tick in 0..600u32 {
        let mut all_arrived = true;
        for (id, position, _) in &mut agents {
            let output = nav.steer(*id, *position, SPEED);
            if !output.arrived {
                all_arrived = false;
                *position += output.desired_velocity * TICK;
            }
        }

        if tick % 40 == 0 {
            for (id, position, _) in &agents {
                log::info!(
                    "tick {tick}: {id} at ({:.1}, {:.1})",
                    position.x,
                    position.z
                );
            }
        }
        if all_arrived {
            log::info!("all agents arrived after {tick} ticks");
            break;
        }
    }

    for (id, ..) in &agents {
        nav.remove_agent(*id);
    }
    nav.shutdown();
}
