pub mod remote_write_models;
pub mod remote_write_parser;
pub mod validation;

pub use remote_write_models::{
    BucketSpan, Exemplar, Histogram, Label, MetricMetadata, MetricType, Sample, TimeSeries,
    WriteRequest, histogram,
};
pub use remote_write_parser::{CodecError, encode_remote_write_request, parse_remote_write_request};
pub use validation::{ValidationError, validate_write_request};
