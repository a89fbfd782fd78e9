mod legend_handler;

pub use legend_handler::*;
