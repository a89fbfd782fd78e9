mod report_dto;

pub use report_dto::{
    AdminReportDto, ListReportsQuery, MapMarkerDto, ReportDetailDto, ReportListResponseDto,
    ReportResponseDto, ReportSummaryDto, SubmitFormOptionsDto, SubmitReportDto, VoteResponseDto,
    WitnessResponseDto,
};
