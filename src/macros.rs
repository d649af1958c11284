macro_rules! log_err {
    (event_id: $id:expr, $($arg:tt)+) => (
        log::error!(event_id = $id; $($arg)+)
    )
}

macro_rules! log_warn {
    (event_id: $id:expr, $($arg:tt)+) => (
        log::warn!(event_id = $id; $($arg)+)
    )
}
