pub mod duration;
pub mod models;
pub mod sorting;
pub mod time_grid;
