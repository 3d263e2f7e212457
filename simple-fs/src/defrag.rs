//! # 碎片整理
//!
//! 分两趟：
//! 1. 按 inode 编号升序，把每个有效 inode 的直接块、间接索引块、间接数据块
//!    依次搬到数据区前部；
//! 2. 把有效 inode 记录依次交换到 inode 表前部。
//!
//! 搬动一个块时，若目标位置已被其它块占用，则交换两块内容，
//! 并根据反向引用表修正被挤走那一块的持有者。

use crate::block_map::{BlockId, Reference};
use crate::layout::{DiskInode, IndirectBlock};
use crate::sfs::MountedVolume;
use crate::{BLOCK_SIZE, DataBlock, POINTERS_PER_BLOCK, POINTERS_PER_INODE};

/// 正在整理的 inode。
///
/// inode 记录与间接索引块均以内存副本为准，处理完该 inode 后一次写回，
/// 所有落在它身上的引用修正都只改副本。
struct OpenInode {
    inumber: u32,
    inode: DiskInode,
    /// inode 没有间接索引块时为空表
    indirect: IndirectBlock,
}

impl OpenInode {
    fn pointer(&self, reference: Reference) -> u32 {
        match reference {
            Reference::Direct(k) => self.inode.direct[k],
            Reference::IndirectPointer => self.inode.indirect,
            Reference::IndirectSlot(k) => self.indirect.get(k),
        }
    }

    fn repoint(&mut self, reference: Reference, block_id: u32) {
        match reference {
            Reference::Direct(k) => self.inode.direct[k] = block_id,
            Reference::IndirectPointer => self.inode.indirect = block_id,
            Reference::IndirectSlot(k) => self.indirect.set(k, block_id),
        }
    }
}

impl MountedVolume {
    /// 整理后在用的数据块连续排布在 inode 表之后，有效 inode 占据表的前部，
    /// 每个文件的内容不变。
    pub fn defrag(&mut self) {
        let moved_blocks = self.compact_data_blocks();
        let moved_inodes = self.compact_inodes();
        log::info!("defrag: moved {moved_blocks} blocks and {moved_inodes} inodes");
    }

    fn compact_data_blocks(&mut self) -> usize {
        let mut cursor = self.super_block().data_start();
        let mut moved = 0;

        for inumber in 1..self.ninodes() {
            let inode = self.load_inode(inumber);
            if !inode.valid {
                continue;
            }

            let indirect = if inode.indirect != 0 {
                self.read_indirect(inode.indirect)
            } else {
                IndirectBlock::default()
            };
            let mut open = OpenInode {
                inumber,
                inode,
                indirect,
            };

            // 交换只会改写编号更大的槽位，逐个重新读取
            for k in 0..POINTERS_PER_INODE {
                if open.inode.direct[k] != 0 {
                    moved += self.relocate(&mut open, Reference::Direct(k), &mut cursor) as usize;
                }
            }

            if open.inode.indirect != 0 {
                moved += self.relocate(&mut open, Reference::IndirectPointer, &mut cursor) as usize;

                for k in 0..POINTERS_PER_BLOCK {
                    if open.indirect.get(k) != 0 {
                        moved +=
                            self.relocate(&mut open, Reference::IndirectSlot(k), &mut cursor) as usize;
                    }
                }

                self.write_indirect(open.inode.indirect, &open.indirect);
            }

            self.save_inode(inumber, &open.inode);
        }

        moved
    }

    /// 把`reference`指向的块搬到`cursor`处并推进`cursor`。
    /// 返回是否真的发生了搬动。
    fn relocate(&mut self, open: &mut OpenInode, reference: Reference, cursor: &mut u32) -> bool {
        let source = open.pointer(reference);
        let target = *cursor;
        *cursor += 1;

        if source == target {
            return false;
        }

        // 间接索引块的内容以内存副本为准，最后写到它的新位置，这里不必搬运
        let carries_content = reference != Reference::IndirectPointer;
        let mut source_block: DataBlock = [0; BLOCK_SIZE];
        if carries_content {
            self.read_block(source, &mut source_block);
        }

        let (source_id, target_id) = (BlockId::new(source), BlockId::new(target));
        match self.block_map().owner_of(target_id) {
            Some(displaced) => {
                // 目标块在用：它的内容换到源位置，持有者随之改指
                log::trace!("swap {source_id:?} <-> {target_id:?} (displacing {displaced:?})");
                let mut target_block: DataBlock = [0; BLOCK_SIZE];
                self.read_block(target, &mut target_block);
                self.write_block(source, &target_block);

                if displaced.inode == open.inumber {
                    open.repoint(displaced.reference, source);
                } else {
                    self.repoint(displaced.inode, displaced.reference, source);
                }
            }
            None => {
                debug_assert!(!self.block_map().is_used(target_id));
                log::trace!("move {source_id:?} -> {target_id:?}");
                let block_map = self.block_map_mut();
                block_map.mark_used(target_id);
                block_map.mark_free(source_id);
            }
        }

        if carries_content {
            self.write_block(target, &source_block);
        }
        self.block_map_mut().swap_owners(source_id, target_id);
        open.repoint(reference, target);
        true
    }

    /// 修正一个未打开的 inode 对某块的引用，直接落盘
    fn repoint(&mut self, inumber: u32, reference: Reference, block_id: u32) {
        let mut inode = self.load_inode(inumber);
        match reference {
            Reference::Direct(k) => {
                inode.direct[k] = block_id;
                self.save_inode(inumber, &inode);
            }
            Reference::IndirectPointer => {
                inode.indirect = block_id;
                self.save_inode(inumber, &inode);
            }
            Reference::IndirectSlot(k) => {
                let mut indirect = self.read_indirect(inode.indirect);
                indirect.set(k, block_id);
                self.write_indirect(inode.indirect, &indirect);
            }
        }
    }

    /// 数据块已经就位，这里只交换 inode 记录，并同步反向引用里的 inode 编号
    fn compact_inodes(&mut self) -> usize {
        let mut cursor = 1;
        let mut moved = 0;

        for inumber in 1..self.ninodes() {
            let inode = self.load_inode(inumber);
            if !inode.valid {
                continue;
            }

            if inumber != cursor {
                let dest = self.load_inode(cursor);
                self.save_inode(inumber, &dest);
                self.save_inode(cursor, &inode);
                self.block_map_mut().swap_inodes(inumber, cursor);
                moved += 1;
            }
            cursor += 1;
        }

        moved
    }
}
