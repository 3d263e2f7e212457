//! 只读的诊断输出：超级块以及每个有效 inode 引用的块

use alloc::vec::Vec;
use core::fmt;

use block_dev::BlockDevice;

use crate::layout::{DiskInode, IndirectBlock, SuperBlock};
use crate::sfs::MountedVolume;
use crate::{BLOCK_SIZE, INODES_PER_BLOCK, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugReport {
    pub super_block: SuperBlock,
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub inumber: u32,
    pub size: u32,
    /// 非零的直接索引
    pub direct: Vec<u32>,
    pub indirect: Option<u32>,
    /// 间接索引块内非零的编号
    pub indirect_data: Vec<u32>,
}

impl MountedVolume {
    pub fn debug(&self) -> DebugReport {
        collect(self.block_device().as_ref(), *self.super_block())
    }
}

/// 未挂载时也可以检查一块已格式化的磁盘
pub fn inspect(block_device: &dyn BlockDevice) -> Result<DebugReport> {
    let mut block = [0u8; BLOCK_SIZE];
    block_device.read_block(0, &mut block);
    let super_block = SuperBlock::decode(&block);
    super_block.check(block_device.num_blocks())?;
    Ok(collect(block_device, super_block))
}

fn collect(block_device: &dyn BlockDevice, super_block: SuperBlock) -> DebugReport {
    let mut inodes = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];

    for table_block in 1..=super_block.ninodeblocks {
        block_device.read_block(table_block as usize, &mut block);

        for slot in 0..INODES_PER_BLOCK {
            let inode = DiskInode::decode(&block, slot);
            if !inode.valid {
                continue;
            }

            // 未挂载时指针未经校验，越界的间接索引块不去读取
            let (indirect, indirect_data) = if inode.indirect != 0
                && inode.indirect < super_block.nblocks
            {
                let mut pointer_block = [0u8; BLOCK_SIZE];
                block_device.read_block(inode.indirect as usize, &mut pointer_block);
                let pointers = IndirectBlock::decode(&pointer_block);
                (
                    Some(inode.indirect),
                    pointers.entries().map(|(_, ptr)| ptr).collect(),
                )
            } else {
                (None, Vec::new())
            };

            inodes.push(InodeReport {
                inumber: (table_block - 1) * INODES_PER_BLOCK as u32 + slot as u32,
                size: inode.size,
                direct: inode.direct_blocks().map(|(_, ptr)| ptr).collect(),
                indirect,
                indirect_data,
            });
        }
    }

    DebugReport {
        super_block,
        inodes,
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "superblock:")?;
        writeln!(f, "    {} blocks", self.super_block.nblocks)?;
        writeln!(f, "    {} inode blocks", self.super_block.ninodeblocks)?;
        writeln!(f, "    {} inodes", self.super_block.ninodes)?;

        for inode in &self.inodes {
            write!(f, "{inode}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inode {}:", self.inumber)?;
        writeln!(f, "    size: {} bytes", self.size)?;

        if !self.direct.is_empty() {
            write!(f, "    direct blocks:")?;
            for block_id in &self.direct {
                write!(f, " {block_id}")?;
            }
            writeln!(f)?;
        }

        if let Some(indirect) = self.indirect {
            writeln!(f, "    indirect block: {indirect}")?;
            if !self.indirect_data.is_empty() {
                write!(f, "    indirect data blocks:")?;
                for block_id in &self.indirect_data {
                    write!(f, " {block_id}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
