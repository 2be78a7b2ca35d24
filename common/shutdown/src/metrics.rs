pub(crate) const METRIC_SHUTDOWN_INITIATED: &str = "shutdown_initiated_total";
pub(crate) const METRIC_SHUTDOWN_COMPLETED: &str = "shutdown_completed_total";
pub(crate) const METRIC_REGISTRATION_FAILED: &str = "shutdown_registration_failed_total";
pub(crate) const METRIC_COMPONENT_STOP_DURATION: &str = "shutdown_component_stop_duration_seconds";
pub(crate) const METRIC_COMPONENT_STOP_RESULT: &str = "shutdown_component_stop_result_total";

pub(crate) fn emit_shutdown_initiated(service_name: &str) {
    metrics::counter!(
        METRIC_SHUTDOWN_INITIATED,
        "service_name" => service_name.to_string()
    )
    .increment(1);
}

pub(crate) fn emit_shutdown_completed(service_name: &str) {
    metrics::counter!(
        METRIC_SHUTDOWN_COMPLETED,
        "service_name" => service_name.to_string()
    )
    .increment(1);
}

pub(crate) fn emit_registration_failed(service_name: &str) {
    metrics::counter!(
        METRIC_REGISTRATION_FAILED,
        "service_name" => service_name.to_string()
    )
    .increment(1);
}

pub(crate) fn emit_component_stop_duration(component: &str, result: &str, duration_secs: f64) {
    metrics::histogram!(
        METRIC_COMPONENT_STOP_DURATION,
        "component" => component.to_string(),
        "result" => result.to_string()
    )
    .record(duration_secs);
}

pub(crate) fn emit_component_stop_result(component: &str, result: &str) {
    metrics::counter!(
        METRIC_COMPONENT_STOP_RESULT,
        "component" => component.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}
