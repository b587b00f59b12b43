pub mod error;
pub mod consts;
pub mod scene;
pub mod catalog;
pub mod stack;
pub mod mask;
pub mod index;
pub mod season;
pub mod io;
pub mod pipeline;
