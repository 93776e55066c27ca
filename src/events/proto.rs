//! TensorBoard event protobuf messages
//!
//! Hand-written `prost` definitions covering the subset of
//! `tensorflow/core/util/event.proto` and `summary.proto` that carries
//! scalars. Fields outside this subset (graphs, images, histograms, ...)
//! are skipped by the decoder as unknown fields.

/// One entry of an event file.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Event {
    /// Seconds since the epoch
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    /// Global step
    #[prost(int64, tag = "2")]
    pub step: i64,
    /// Payload
    #[prost(oneof = "event::What", tags = "3, 5")]
    pub what: Option<event::What>,
}

/// Nested types of [`Event`].
pub mod event {
    /// Event payload.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum What {
        /// File header, e.g. `brain.Event:2`
        #[prost(string, tag = "3")]
        FileVersion(String),
        /// Summary values logged at this step
        #[prost(message, tag = "5")]
        Summary(super::Summary),
    }
}

/// Values logged at one step.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Summary {
    /// One entry per tag
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<summary::Value>,
}

/// Nested types of [`Summary`].
pub mod summary {
    /// One tagged value.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Value {
        /// Tag name
        #[prost(string, tag = "1")]
        pub tag: String,
        /// Plugin routing information (TF2 summaries)
        #[prost(message, optional, tag = "9")]
        pub metadata: Option<super::SummaryMetadata>,
        /// Payload
        #[prost(oneof = "value::Kind", tags = "2, 8")]
        pub kind: Option<value::Kind>,
    }

    /// Nested types of [`Value`].
    pub mod value {
        /// Value payload.
        #[derive(Clone, PartialEq, prost::Oneof)]
        pub enum Kind {
            /// TF1 scalar
            #[prost(float, tag = "2")]
            SimpleValue(f32),
            /// TF2 tensor summary
            #[prost(message, tag = "8")]
            Tensor(super::super::TensorProto),
        }
    }
}

/// Which plugin a summary value belongs to.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SummaryMetadata {
    /// Plugin routing
    #[prost(message, optional, tag = "1")]
    pub plugin_data: Option<PluginData>,
    /// `DATA_CLASS_SCALAR` is 1
    #[prost(int32, tag = "4")]
    pub data_class: i32,
}

/// Plugin name and opaque content.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PluginData {
    /// e.g. `scalars`
    #[prost(string, tag = "1")]
    pub plugin_name: String,
}

/// Serialized tensor (only the fields scalars use).
#[derive(Clone, PartialEq, prost::Message)]
pub struct TensorProto {
    /// `DT_FLOAT` is 1, `DT_DOUBLE` is 2
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    /// Raw little-endian element bytes
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    /// Elements for `DT_FLOAT`
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    /// Elements for `DT_DOUBLE`
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
}

/// `DataType::DT_FLOAT`
pub const DT_FLOAT: i32 = 1;
/// `DataType::DT_DOUBLE`
pub const DT_DOUBLE: i32 = 2;
/// `DataClass::DATA_CLASS_SCALAR`
pub const DATA_CLASS_SCALAR: i32 = 1;
/// Plugin name TF2 uses for scalar summaries
pub const SCALARS_PLUGIN: &str = "scalars";

impl summary::Value {
    /// Scalar carried by this value, if it is one.
    ///
    /// TF1 `simple_value` is always a scalar. A TF2 single-element
    /// float/double tensor is one when this value's metadata routes it to
    /// the scalars plugin, or when `tag_is_scalar` says an earlier value of
    /// the same tag did. Writers only attach metadata to a tag's first value.
    #[must_use]
    pub fn scalar(&self, tag_is_scalar: bool) -> Option<f64> {
        match self.kind.as_ref()? {
            summary::value::Kind::SimpleValue(v) => Some(f64::from(*v)),
            summary::value::Kind::Tensor(tensor) => {
                if tag_is_scalar || self.is_scalar_summary() {
                    tensor.single_value()
                } else {
                    None
                }
            }
        }
    }

    /// Whether this value's own metadata marks it as a scalar summary.
    #[must_use]
    pub fn is_scalar_summary(&self) -> bool {
        self.metadata.as_ref().is_some_and(|meta| {
            meta.data_class == DATA_CLASS_SCALAR
                || meta
                    .plugin_data
                    .as_ref()
                    .is_some_and(|p| p.plugin_name == SCALARS_PLUGIN)
        })
    }
}

impl TensorProto {
    /// The tensor's only element, for one-element float/double tensors.
    #[must_use]
    pub fn single_value(&self) -> Option<f64> {
        match self.dtype {
            DT_FLOAT => match (self.float_val.as_slice(), self.tensor_content.as_slice()) {
                ([v], _) => Some(f64::from(*v)),
                ([], bytes) => <[u8; 4]>::try_from(bytes)
                    .ok()
                    .map(|b| f64::from(f32::from_le_bytes(b))),
                _ => None,
            },
            DT_DOUBLE => match (self.double_val.as_slice(), self.tensor_content.as_slice()) {
                ([v], _) => Some(*v),
                ([], bytes) => <[u8; 8]>::try_from(bytes).ok().map(f64::from_le_bytes),
                _ => None,
            },
            _ => None,
        }
    }
}
