mod cold_start_60_2;
mod event_dispatch;
mod fatal_glitch;
mod sync_lock_36_2_2_2;
mod trim_failure_then_success;
mod trim_success;
