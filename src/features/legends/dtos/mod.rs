mod legend_dto;

pub use legend_dto::{LegendEditFormDto, LegendFormDto, LegendResponseDto};
