pub mod dispatch;
pub mod handlers;
pub mod scoring;
pub mod uploads;
pub mod views;
pub mod workflow;
