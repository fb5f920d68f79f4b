pub mod indicator;
pub mod theme;
