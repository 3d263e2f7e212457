#![no_std]

extern crate alloc;

/* simple-fs 的整体架构，自上而下 */

// 会话层：挂载状态与对外接口
mod session;

// 碎片整理
mod defrag;

// 文件读写路径
mod file;

// 卷层：格式化、挂载、inode 存取
mod sfs;

// 块占用位图与反向引用表
mod block_map;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

// 调试输出
mod debug;

mod error;

pub use block_dev::{BLOCK_SIZE, BlockDevice};

pub use self::{
    block_map::{BlockId, BlockMap, Owner, Reference},
    debug::{DebugReport, InodeReport},
    error::{Error, Result},
    layout::{DiskInode, IndirectBlock, SuperBlock},
    session::FileSystem,
    sfs::MountedVolume,
};

pub const MAGIC: u32 = 0xf0f0_3410;
/// 每个 inode 表块容纳的 inode 数
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / layout::INODE_SIZE;
/// inode 内的直接索引数
pub const POINTERS_PER_INODE: usize = 5;
/// 间接索引块内的块编号数
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// 单个文件的最大字节数
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;

type DataBlock = [u8; BLOCK_SIZE];
