//! Collisions between bodies and absorption by the event horizon.
//!
//! Both passes run after integration. Collisions only deactivate; the sweep
//! is the single place bodies leave the collection.
//!
//! ```ignore
//! let merged = resolve_collisions(&mut bodies);
//! let report = sweep(&mut bodies, &central);
//! assert_eq!(report.merged.len(), merged);
//! ```

use tracing::info;

use crate::body::Body;
use crate::central_mass::CentralMass;

/// Deactivate the lighter body of every overlapping active pair.
///
/// Pairs are visited in insertion order. On exactly equal mass the later
/// body loses. Mass and velocity of the survivor are left untouched.
///
/// Returns how many bodies were deactivated.
pub fn resolve_collisions(bodies: &mut [Body]) -> usize {
    let mut deactivated = 0;
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if !a.is_colliding_with(b) {
                continue;
            }
            if a.mass() >= b.mass() {
                info!("Collision: {} merged into {}", b.name(), a.name());
                b.set_active(false);
            } else {
                info!("Collision: {} merged into {}", a.name(), b.name());
                a.set_active(false);
            }
            deactivated += 1;
            if !a.is_active() {
                break;
            }
        }
    }
    deactivated
}

/// Names of the bodies removed by [`sweep`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Active bodies that were inside the event horizon.
    pub absorbed: Vec<String>,
    /// Bodies already deactivated by a collision.
    pub merged: Vec<String>,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.absorbed.len() + self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed() == 0
    }
}

/// Remove absorbed and merged bodies in one ordered pass.
///
/// Survivors keep their relative order.
pub fn sweep(bodies: &mut Vec<Body>, central: &CentralMass) -> SweepReport {
    let mut report = SweepReport::default();
    bodies.retain(|body| {
        if !body.is_active() {
            report.merged.push(body.name().to_string());
            false
        } else if central.is_inside_horizon(body.position()) {
            info!("{} crossed the event horizon of {}", body.name(), central.name());
            report.absorbed.push(body.name().to_string());
            false
        } else {
            true
        }
    });
    report
}
