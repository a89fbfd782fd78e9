mod legend;

pub use legend::{Legend, LEGEND_COLUMNS};
