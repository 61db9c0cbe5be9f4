//! Report generation from persisted crawl state

mod report;

pub use report::{audit_links, print_report, summarize, LinkAudit, ReportSummary};
