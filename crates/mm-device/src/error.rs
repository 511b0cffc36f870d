use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("out of unified memory: requested {bytes} bytes")]
    OutOfMemory { bytes: usize },
    #[error("allocation of {len} elements of {dtype} overflows the address space")]
    AllocationTooLarge { len: usize, dtype: String },
    #[error("invalid launch configuration: {0}")]
    InvalidLaunch(String),
    #[error("kernel '{kernel}' faulted: {reason}")]
    KernelFault { kernel: String, reason: String },
    #[error("buffer is still referenced by an in-flight launch; synchronize first")]
    BufferInFlight,
    #[error("device initialization failed: {0}")]
    Init(String),
    #[error("device lost: {0}")]
    DeviceLost(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
