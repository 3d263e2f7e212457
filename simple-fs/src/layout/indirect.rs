//! 间接索引块：整个块连续存储**块编号**，每个编号都指向一个**数据块**，
//! 编号为 0 的位置为空。

use super::{get_u32, put_u32};
use crate::{DataBlock, POINTERS_PER_BLOCK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectBlock {
    pointers: [u32; POINTERS_PER_BLOCK],
}

impl Default for IndirectBlock {
    fn default() -> Self {
        Self {
            pointers: [0; POINTERS_PER_BLOCK],
        }
    }
}

impl IndirectBlock {
    pub fn decode(block: &DataBlock) -> Self {
        let mut pointers = [0; POINTERS_PER_BLOCK];
        for (k, ptr) in pointers.iter_mut().enumerate() {
            *ptr = get_u32(block, k);
        }
        Self { pointers }
    }

    pub fn encode(&self, block: &mut DataBlock) {
        for (k, &ptr) in self.pointers.iter().enumerate() {
            put_u32(block, k, ptr);
        }
    }

    #[inline]
    pub fn get(&self, slot: usize) -> u32 {
        self.pointers[slot]
    }

    #[inline]
    pub fn set(&mut self, slot: usize, block_id: u32) {
        self.pointers[slot] = block_id;
    }

    /// 所有非零的索引：(槽位, 块编号)
    pub fn entries(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.pointers
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, ptr)| ptr != 0)
    }
}
