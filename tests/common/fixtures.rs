/// Test data fixtures for consistent testing
use remote_write_proxy::parsing::prometheus::{
    Label, Sample, TimeSeries, WriteRequest, encode_remote_write_request,
};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// One serie with the given labels, in order, and a single sample at the current time.
pub fn metric(labels: &[(&str, &str)], value: f64) -> WriteRequest {
    WriteRequest {
        timeseries: vec![TimeSeries {
            labels: labels
                .iter()
                .map(|(name, value)| Label::new(*name, *value))
                .collect(),
            samples: vec![Sample {
                value,
                timestamp: now_seconds(),
            }],
            ..Default::default()
        }],
        metadata: vec![],
    }
}

/// A single tenant metric, the shape most remote write clients send.
pub fn tenant_metric(tenant_id: &str, name: &str, value: f64) -> WriteRequest {
    metric(&[("tenant_id", tenant_id), ("__name__", name)], value)
}

pub fn compressed(write_request: &WriteRequest) -> Vec<u8> {
    encode_remote_write_request(write_request).unwrap()
}

/// A valid snappy block whose content is not a write request.
pub fn compressed_invalid_protobuf() -> Vec<u8> {
    snap::raw::Encoder::new()
        .compress_vec(b"testinvalidprotobuf")
        .unwrap()
}
