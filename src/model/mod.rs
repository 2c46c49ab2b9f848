pub mod contribution;
pub mod language;
pub mod term;
