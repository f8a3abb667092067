use salix_core::node_prelude::*;

/// Resolve a blackboard value to a world position: vectors are used as-is,
/// actor references resolve to the actor's current position.
pub(crate) fn resolve_position(value: Option<&Value>, ctx: &TickCtx) -> Option<Vec3> {
    match value? {
        Value::Vector(v) => Some(*v),
        Value::Actor(uid) => ctx.rt.world.actor(*uid).map(|a| a.position()),
        _ => None,
    }
}
