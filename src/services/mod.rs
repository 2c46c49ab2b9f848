pub mod dictionary;
pub mod encoding;
pub mod engine;
pub mod lifecycle;
pub mod normalize;
pub mod resolver;
pub mod store;
