pub mod boundary;
pub mod enemy;
pub mod entity;
pub mod geometry;
pub mod resolver;
pub mod traversal;
