use crate::wire::Direction;

/// Looks up the handover routing table: given the worker index a turtle is
/// leaving and the direction it exits in, returns the worker index it should
/// be handed to, or `None` if the turtle leaves the canvas.
///
/// Pure and total over `source_id in 0..4`; any other source returns `None`.
pub fn route(source_id: usize, dir: Direction) -> Option<usize> {
    use Direction::*;

    match (source_id, dir) {
        (0, South) => Some(2),
        (0, East) => Some(1),
        (1, South) => Some(3),
        (1, West) => Some(0),
        (2, North) => Some(0),
        (2, East) => Some(3),
        (3, North) => Some(1),
        (3, West) => Some(2),
        _ => None,
    }
}
