pub mod cron;
pub mod diagrams;
