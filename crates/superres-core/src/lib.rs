pub mod consts;
pub mod error;
pub mod fusion;
pub mod image_data;
pub mod io;
pub mod model;
pub mod motion;
pub mod pipeline;
pub mod regularize;
pub mod simulate;
pub mod solver;
