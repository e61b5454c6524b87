/// Map a squared L2 distance to a similarity in `(0, 1]`.
///
/// Strictly decreasing in `distance`; a distance of zero scores exactly 1.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}
