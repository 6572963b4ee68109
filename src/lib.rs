mod classifier;
mod device;
mod error;
mod fp16;
mod graph;
mod labels;
mod preprocess;
mod record;
mod sense;
mod telemetry;
mod usb_link;

pub use crate::classifier::{
    classify, ncappzoo_path, ClassifyConfig, DEFAULT_FIRMWARE_PATH, DEFAULT_GRAPH_SUFFIX,
    DEFAULT_LABELS_SUFFIX, TOP_LABEL_COUNT,
};
pub use crate::device::{
    is_device_connected, NcsDevice, NCS_USB_PRODUCT_ID_BOOT, NCS_USB_PRODUCT_ID_RUNTIME,
    NCS_USB_VENDOR_ID,
};
pub use crate::error::{ClassifyError, GraphError, NcsError, SenseError};
pub use crate::fp16::{decode_f16_slice, encode_f16_slice, f16_to_f32, f32_to_f16};
pub use crate::graph::Graph;
pub use crate::labels::{load_labels, top_k_indices};
pub use crate::preprocess::{
    load_image_tensor, tensor_from_rgb, IMAGE_DIM, IMAGE_MEAN_BGR, IMAGE_STDDEV,
};
pub use crate::record::{
    fahrenheit, round_to, timestamp_now, ClassificationRecord, SensedRecord, TIMESTAMP_FORMAT,
};
pub use crate::sense::{
    normalize_degrees, orientation_from_vectors, Acceleration, Orientation, SenseHat,
};
pub use crate::telemetry::{
    cpu_temperature, disk_free_root, format_disk_free, hostname, ip_address, memory_percent,
    parse_thermal_millidegrees, parse_vcgencmd_temp, thermal_zone_temperature,
};
pub use crate::usb_link::{
    CommandHeader, LinkStatus, MyriadOpcode, NcsUsbDeviceInfo, NcsUsbLink, ReplyHeader,
    DEFAULT_BOOT_WAIT, DEFAULT_PAYLOAD_CHUNK_SIZE, EP_BULK_IN, EP_BULK_OUT,
};
