//! Sample-buffer handling: the typed chunk boundary and fixed-size windowing.

pub mod chunk;
pub mod window;
