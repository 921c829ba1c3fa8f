use mach2::kern_return::kern_return_t;

/// Failure codes a task port lookup or a remote VM read can report.
#[derive(thiserror::Error, Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum KernReturn {
    #[error("invalid address")]
    InvalidAddress,
    #[error("protection failure")]
    ProtectionFailure,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("failure")]
    Failure,
    #[error("no access")]
    NoAccess,
    #[error("memory failure")]
    MemoryFailure,
    #[error("memory error")]
    MemoryError,
    #[error("invalid name")]
    InvalidName,
    #[error("invalid task")]
    InvalidTask,
    #[error("invalid right")]
    InvalidRight,
    #[error("terminated")]
    Terminated,
    #[error("not supported")]
    NotSupported,
    #[error("operation timed out")]
    OperationTimedOut,
    #[error("unknown kern_return_t {0:#x}")]
    Unknown(kern_return_t),
}

impl KernReturn {
    pub fn result(raw: kern_return_t) -> Result<(), Self> {
        use mach2::kern_return::*;

        Err(match raw {
            KERN_SUCCESS => return Ok(()),
            KERN_INVALID_ADDRESS => Self::InvalidAddress,
            KERN_PROTECTION_FAILURE => Self::ProtectionFailure,
            KERN_INVALID_ARGUMENT => Self::InvalidArgument,
            KERN_FAILURE => Self::Failure,
            KERN_NO_ACCESS => Self::NoAccess,
            KERN_MEMORY_FAILURE => Self::MemoryFailure,
            KERN_MEMORY_ERROR => Self::MemoryError,
            KERN_INVALID_NAME => Self::InvalidName,
            KERN_INVALID_TASK => Self::InvalidTask,
            KERN_INVALID_RIGHT => Self::InvalidRight,
            KERN_TERMINATED => Self::Terminated,
            KERN_NOT_SUPPORTED => Self::NotSupported,
            KERN_OPERATION_TIMED_OUT => Self::OperationTimedOut,
            v => Self::Unknown(v),
        })
    }

    /// Whether the failure means the address itself is unreadable, as opposed to the task or
    /// port being unusable.
    pub fn is_unmapped(self) -> bool {
        matches!(
            self,
            Self::InvalidAddress
                | Self::ProtectionFailure
                | Self::NoAccess
                | Self::MemoryFailure
                | Self::MemoryError
        )
    }
}
