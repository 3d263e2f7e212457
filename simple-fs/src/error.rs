use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /* 使用错误 */
    NotMounted,
    AlreadyMounted,
    InvalidInumber,
    /// inode 槽位空闲
    NotValid,
    ZeroLength,
    OffsetBeyondSize,
    FileTooLarge,

    /* 资源耗尽 */
    TableFull,
    DeviceTooSmall,

    /* 结构损坏 */
    BadMagic,
    SizeMismatch,
    /// 多个引用指向同一个块
    DataBlockConflict,
    /// 块编号超出设备范围
    PointerOutOfRange,
    /// inode 记录的大小超过文件上限
    FileSizeOutOfRange,
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// 卷本身已不可信，重试无济于事
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::BadMagic | Self::SizeMismatch | Self::DataBlockConflict
                | Self::PointerOutOfRange
                | Self::FileSizeOutOfRange
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NotMounted => "file system not mounted yet",
            Self::AlreadyMounted => "file system already mounted",
            Self::InvalidInumber => "illegal inumber",
            Self::NotValid => "inode is not valid",
            Self::ZeroLength => "cannot transfer 0 byte",
            Self::OffsetBeyondSize => "offset is larger than size",
            Self::FileTooLarge => "offset is beyond the maximum file size",
            Self::TableFull => "inode table is full",
            Self::DeviceTooSmall => "device cannot hold a file system",
            Self::BadMagic => "disk is not formatted",
            Self::SizeMismatch => "disk size error",
            Self::DataBlockConflict => "illegal fs: data block conflict",
            Self::PointerOutOfRange => "illegal fs: block pointer out of range",
            Self::FileSizeOutOfRange => "illegal fs: file size out of range",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}
