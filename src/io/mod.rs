pub mod csv_page;
pub mod jira;
pub mod sheets;
