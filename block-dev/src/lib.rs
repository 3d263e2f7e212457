//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块的大小由设备决定，文件系统按 [`BLOCK_SIZE`] 布局。

#![no_std]

use core::any::Any;
use core::fmt::Debug;

/// 设备上每个块的字节数
pub const BLOCK_SIZE: usize = 4096;

/// 块设备驱动特质
///
/// 读写总是以整块为单位，`buf.len()` 必须等于 [`BLOCK_SIZE`]。
/// 设备的读写被视为不会失败。
pub trait BlockDevice: Send + Sync + Any + Debug {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
    /// 设备的总块数
    fn num_blocks(&self) -> usize;
}
