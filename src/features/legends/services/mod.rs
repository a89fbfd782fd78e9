mod legend_service;

pub use legend_service::{LegendForm, LegendService};
