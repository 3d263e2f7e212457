use super::{get_u32, put_u32};
use crate::{DataBlock, POINTERS_PER_INODE};

/// 单个 inode 记录的字节数
pub const INODE_SIZE: usize = 4 * (3 + POINTERS_PER_INODE);

/// 磁盘上的 inode，块编号为 0 表示未分配
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiskInode {
    pub valid: bool,
    // 不用usize是为了严控布局
    pub size: u32,
    /// 直接索引，存储容量：POINTERS_PER_INODE * BLOCK_SIZE 字节
    pub direct: [u32; POINTERS_PER_INODE],
    /// 指向一个间接索引块
    pub indirect: u32,
}

impl DiskInode {
    /// 新建的空文件
    #[inline]
    pub fn empty_file() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }

    /// 从 inode 表块中取出第 `slot` 个记录
    pub fn decode(block: &DataBlock, slot: usize) -> Self {
        let base = slot * INODE_SIZE / 4;
        let mut direct = [0; POINTERS_PER_INODE];
        for (k, ptr) in direct.iter_mut().enumerate() {
            *ptr = get_u32(block, base + 2 + k);
        }

        Self {
            valid: get_u32(block, base) != 0,
            size: get_u32(block, base + 1),
            direct,
            indirect: get_u32(block, base + 2 + POINTERS_PER_INODE),
        }
    }

    pub fn encode(&self, block: &mut DataBlock, slot: usize) {
        let base = slot * INODE_SIZE / 4;
        put_u32(block, base, self.valid as u32);
        put_u32(block, base + 1, self.size);
        for (k, &ptr) in self.direct.iter().enumerate() {
            put_u32(block, base + 2 + k, ptr);
        }
        put_u32(block, base + 2 + POINTERS_PER_INODE, self.indirect);
    }

    /// 所有非零的直接索引：(槽位, 块编号)
    pub fn direct_blocks(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.direct
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, ptr)| ptr != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BLOCK_SIZE, INODES_PER_BLOCK};

    #[test]
    fn packs_without_padding() {
        assert_eq!(INODE_SIZE, 32);
        assert_eq!(INODES_PER_BLOCK, 128);
    }

    #[test]
    fn neighbouring_slots_do_not_overlap() {
        let mut block = [0u8; BLOCK_SIZE];
        let a = DiskInode {
            valid: true,
            size: 5000,
            direct: [7, 8, 0, 0, 0],
            indirect: 0,
        };
        let b = DiskInode {
            valid: true,
            size: 1,
            direct: [0; POINTERS_PER_INODE],
            indirect: 42,
        };
        a.encode(&mut block, 3);
        b.encode(&mut block, 4);

        assert_eq!(DiskInode::decode(&block, 3), a);
        assert_eq!(DiskInode::decode(&block, 4), b);
        assert_eq!(DiskInode::decode(&block, 2), DiskInode::default());
        assert_eq!(DiskInode::decode(&block, INODES_PER_BLOCK - 1), DiskInode::default());
    }

    #[test]
    fn direct_blocks_skips_holes() {
        let inode = DiskInode {
            valid: true,
            size: 0,
            direct: [0, 9, 0, 11, 0],
            indirect: 0,
        };
        let blocks: alloc::vec::Vec<_> = inode.direct_blocks().collect();
        assert_eq!(blocks, [(1, 9), (3, 11)]);
    }
}
