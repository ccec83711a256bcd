pub mod tnumber;

pub mod tfloat;
pub mod tint;
