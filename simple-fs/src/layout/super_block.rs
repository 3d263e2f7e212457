use super::{get_u32, put_u32};
use crate::{DataBlock, Error, INODES_PER_BLOCK, MAGIC, Result};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录 inode 表的规模
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub nblocks: u32,
    /// inode 表占据块数
    pub ninodeblocks: u32,
    /// inode 槽位总数
    pub ninodes: u32,
}

impl SuperBlock {
    pub fn new(nblocks: u32) -> Self {
        let ninodeblocks = (nblocks - 1).div_ceil(10);
        Self {
            magic: MAGIC,
            nblocks,
            ninodeblocks,
            ninodes: ninodeblocks * INODES_PER_BLOCK as u32,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 魔数正确，且几何参数与`num_blocks`块的设备格式化出的一致
    pub fn check(&self, num_blocks: usize) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::BadMagic);
        }
        if num_blocks < 2
            || self.nblocks as usize != num_blocks
            || *self != Self::new(self.nblocks)
        {
            return Err(Error::SizeMismatch);
        }
        Ok(())
    }

    /// 数据区的第一个块
    #[inline]
    pub fn data_start(&self) -> u32 {
        1 + self.ninodeblocks
    }

    pub fn decode(block: &DataBlock) -> Self {
        Self {
            magic: get_u32(block, 0),
            nblocks: get_u32(block, 1),
            ninodeblocks: get_u32(block, 2),
            ninodes: get_u32(block, 3),
        }
    }

    /// 块的其余部分清零
    pub fn encode(&self, block: &mut DataBlock) {
        block.fill(0);
        put_u32(block, 0, self.magic);
        put_u32(block, 1, self.nblocks);
        put_u32(block, 2, self.ninodeblocks);
        put_u32(block, 3, self.ninodes);
    }
}
