pub mod fpstream;
pub mod pattern_tree;
pub mod ttw;
