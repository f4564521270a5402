pub mod maths_utils;

pub use maths_utils::{get_max, get_min, get_min_max, scale};
