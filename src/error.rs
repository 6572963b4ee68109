use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum NcsError {
    DeviceNotFound,
    InvalidDeviceName,
    PermissionDenied,
    BootFailed,
    ProtocolError(String),
    UsbError(rusb::Error),
}

impl fmt::Display for NcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NcsError::DeviceNotFound => write!(f, "No Neural Compute Stick found"),
            NcsError::InvalidDeviceName => write!(f, "Invalid device name"),
            NcsError::PermissionDenied => {
                write!(f, "Permission denied - check USB access rights")
            }
            NcsError::BootFailed => {
                write!(f, "Stick did not re-enumerate in runtime mode after firmware upload")
            }
            NcsError::ProtocolError(msg) => write!(f, "Myriad link protocol error: {}", msg),
            NcsError::UsbError(e) => write!(f, "USB error: {}", e),
        }
    }
}

impl std::error::Error for NcsError {}

impl From<rusb::Error> for NcsError {
    fn from(error: rusb::Error) -> Self {
        match error {
            rusb::Error::Access => NcsError::PermissionDenied,
            rusb::Error::NoDevice => NcsError::DeviceNotFound,
            rusb::Error::NotFound => NcsError::DeviceNotFound,
            _ => NcsError::UsbError(error),
        }
    }
}

#[derive(Debug)]
pub enum GraphError {
    AllocationFailed(u32),
    DeallocationFailed(u32),
    TensorRejected(u32),
    InferenceFailed(u32),
    EmptyResult,
    OddResultLength(usize),
    Link(NcsError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::AllocationFailed(status) => {
                write!(f, "Graph allocation rejected with device status {}", status)
            }
            GraphError::DeallocationFailed(status) => {
                write!(f, "Graph deallocation rejected with device status {}", status)
            }
            GraphError::TensorRejected(status) => {
                write!(f, "Input tensor rejected with device status {}", status)
            }
            GraphError::InferenceFailed(status) => {
                write!(f, "Inference failed with device status {}", status)
            }
            GraphError::EmptyResult => write!(f, "Device returned an empty result tensor"),
            GraphError::OddResultLength(len) => {
                write!(f, "Result payload of {} bytes is not a whole number of fp16 values", len)
            }
            GraphError::Link(err) => write!(f, "Link error: {}", err),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<NcsError> for GraphError {
    fn from(value: NcsError) -> Self {
        GraphError::Link(value)
    }
}

#[derive(Debug)]
pub enum SenseError {
    HatNotFound,
    MissingAttribute(PathBuf),
    InvalidAttribute { path: PathBuf, value: String },
    Io(std::io::Error),
}

impl fmt::Display for SenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenseError::HatNotFound => {
                write!(f, "Sense HAT IIO devices not found under /sys/bus/iio/devices")
            }
            SenseError::MissingAttribute(path) => {
                write!(f, "Missing IIO attribute: {}", path.display())
            }
            SenseError::InvalidAttribute { path, value } => {
                write!(f, "Unparseable IIO attribute {}: '{}'", path.display(), value)
            }
            SenseError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for SenseError {}

impl From<std::io::Error> for SenseError {
    fn from(value: std::io::Error) -> Self {
        SenseError::Io(value)
    }
}

#[derive(Debug)]
pub enum ClassifyError {
    Io(std::io::Error),
    Image(image::ImageError),
    Ncs(NcsError),
    Graph(GraphError),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Io(err) => write!(f, "I/O error: {}", err),
            ClassifyError::Image(err) => write!(f, "Image error: {}", err),
            ClassifyError::Ncs(err) => write!(f, "Device error: {}", err),
            ClassifyError::Graph(err) => write!(f, "Graph error: {}", err),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<std::io::Error> for ClassifyError {
    fn from(value: std::io::Error) -> Self {
        ClassifyError::Io(value)
    }
}

impl From<image::ImageError> for ClassifyError {
    fn from(value: image::ImageError) -> Self {
        ClassifyError::Image(value)
    }
}

impl From<NcsError> for ClassifyError {
    fn from(value: NcsError) -> Self {
        ClassifyError::Ncs(value)
    }
}

impl From<GraphError> for ClassifyError {
    fn from(value: GraphError) -> Self {
        ClassifyError::Graph(value)
    }
}
