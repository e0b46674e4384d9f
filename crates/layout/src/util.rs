use flowbox_types::geometry::EPSILON;

/// `a > b` beyond rounding noise.
pub fn exceeds(a: f32, b: f32) -> bool {
    a > b + EPSILON
}
