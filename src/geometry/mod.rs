pub mod sampling;

pub use sampling::{create_box, create_jittered_box};
