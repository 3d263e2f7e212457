//! # 磁盘数据结构层
//!
//! simple-fs 的磁盘布局：
//! 超级块 | inode 表 | 数据块区域
//!
//! 所有字段均为本机字节序的 `u32`，记录之间没有填充。

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::{DiskInode, INODE_SIZE};

mod indirect;
pub use indirect::IndirectBlock;

#[inline]
fn get_u32(buf: &[u8], index: usize) -> u32 {
    let start = index * 4;
    u32::from_ne_bytes([buf[start], buf[start + 1], buf[start + 2], buf[start + 3]])
}

#[inline]
fn put_u32(buf: &mut [u8], index: usize, value: u32) {
    let start = index * 4;
    buf[start..start + 4].copy_from_slice(&value.to_ne_bytes());
}
