pub mod checked;
pub mod fee;
pub mod fixed_point;
pub mod math_helpers;
pub mod newton_d;
pub mod newton_y;
pub mod packed;

pub mod safe_range;
