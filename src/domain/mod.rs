pub mod aggregate;
pub mod chain;
pub mod normalize;
pub mod playlist;
pub mod scope;
pub mod track;
