pub mod csv;

pub const RAW_CUSTOMERS_FILE: &str = "customers_raw.csv";
pub const PLANS_FILE: &str = "plans.csv";
pub const GENERATION_REPORT_FILE: &str = "generation_report.json";
