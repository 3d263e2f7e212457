//! # 会话层
//!
//! [`FileSystem`] 持有块设备与可能存在的 [`MountedVolume`]，
//! 是外部调用者面对的全部接口。每个失败都会留下一条诊断日志。

use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::debug::{self, DebugReport};
use crate::sfs::{self, MountedVolume};
use crate::{Error, Result};

pub struct FileSystem {
    block_device: Arc<dyn BlockDevice>,
    volume: Option<MountedVolume>,
}

/// 记录失败的操作，原样返回结果
fn report<T>(op: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_corruption() {
            log::error!("{op}: {e}");
        } else {
            log::warn!("{op}: {e}");
        }
    }
    result
}

impl FileSystem {
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            block_device,
            volume: None,
        }
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    #[inline]
    pub fn volume(&self) -> Option<&MountedVolume> {
        self.volume.as_ref()
    }

    fn mounted(&self) -> Result<&MountedVolume> {
        self.volume.as_ref().ok_or(Error::NotMounted)
    }

    fn mounted_mut(&mut self) -> Result<&mut MountedVolume> {
        self.volume.as_mut().ok_or(Error::NotMounted)
    }

    /// 已挂载时拒绝格式化
    pub fn format(&mut self) -> Result<()> {
        let result = if self.is_mounted() {
            Err(Error::AlreadyMounted)
        } else {
            sfs::format(&self.block_device).map(|_| ())
        };
        report("format", result)
    }

    /// 失败时保持未挂载
    pub fn mount(&mut self) -> Result<()> {
        let result = if self.is_mounted() {
            Err(Error::AlreadyMounted)
        } else {
            MountedVolume::mount(self.block_device.clone()).map(|volume| {
                self.volume = Some(volume);
            })
        };
        report("mount", result)
    }

    /// 丢弃位图与反向引用表，磁盘内容不受影响
    pub fn unmount(&mut self) -> Result<()> {
        let result = self.volume.take().map(drop).ok_or(Error::NotMounted);
        report("unmount", result)
    }

    pub fn create(&mut self) -> Result<u32> {
        let result = self.mounted_mut().and_then(MountedVolume::create);
        report("create", result)
    }

    pub fn delete(&mut self, inumber: u32) -> Result<()> {
        let result = self
            .mounted_mut()
            .and_then(|volume| volume.delete(inumber));
        report("delete", result)
    }

    pub fn get_size(&self, inumber: u32) -> Result<usize> {
        let result = self
            .mounted()
            .and_then(|volume| volume.get_size(inumber));
        report("getsize", result)
    }

    pub fn read(&self, inumber: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let result = self
            .mounted()
            .and_then(|volume| volume.read(inumber, buf, offset));
        report("read", result)
    }

    /// 磁盘写满时返回已写入的字节数，而不是错误
    pub fn write(&mut self, inumber: u32, data: &[u8], offset: usize) -> Result<usize> {
        let result = self
            .mounted_mut()
            .and_then(|volume| volume.write(inumber, data, offset));
        report("write", result)
    }

    pub fn defrag(&mut self) -> Result<()> {
        let result = self.mounted_mut().map(MountedVolume::defrag);
        report("defrag", result)
    }

    /// 未挂载时直接读取磁盘上的超级块
    pub fn debug(&self) -> Result<DebugReport> {
        let result = match &self.volume {
            Some(volume) => Ok(volume.debug()),
            None => debug::inspect(self.block_device.as_ref()),
        };
        report("debug", result)
    }
}
