pub mod fpgrowth;
pub mod fptree;
pub mod rules;
pub mod stats;
