//! Test harness helpers
//!
//! Higher-level routines written against any [`ContainerInterface`]:
//! waiting for a queue manager or its web console to become ready, polling
//! console logs, running containers under test, collecting FDCs and cleaning
//! up after a test.
//!
//! [`ContainerInterface`]: crate::engine::ContainerInterface

pub mod fdc;
pub mod lifecycle;
pub mod logs;
pub mod readiness;

pub use fdc::{fdc_summaries, fdc_summary};
pub use lifecycle::{
    clean_container, clean_container_quiet, default_host_config, expect_termination_message,
    image_name, log_container_details, random_uid, run_container, run_container_one_shot,
    run_container_with_all_config, run_container_with_host_config, run_container_with_ports,
    termination_message,
};
pub use logs::{
    read_logs, summarize_json_logs, wait_for_message_count_in_log, wait_for_message_in_log,
};
pub use readiness::{
    is_healthy, wait_for_container, wait_for_ready, wait_for_web_console_ready, Readiness,
};
