//! 块占用位图与反向引用表
//!
//! 两者都只存在于内存中：挂载时扫描 inode 表重建，
//! 之后随分配、释放与碎片整理同步更新，卸载时丢弃。

use alloc::vec;
use alloc::vec::Vec;

use derive_more::{From, Into};

use crate::{Error, Result};

/// 块编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// 一个块是如何被它的 inode 引用的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// inode 的第 k 个直接索引
    Direct(usize),
    /// inode 的间接索引本身，即该块是间接索引块
    IndirectPointer,
    /// 间接索引块内的第 k 个编号
    IndirectSlot(usize),
}

/// 块的唯一持有者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub inode: u32,
    pub reference: Reference,
}

impl Owner {
    #[inline]
    pub fn new(inode: u32, reference: Reference) -> Self {
        Self { inode, reference }
    }
}

/// 位图决定块是否在用；反向引用只对在用的块有意义。
#[derive(Debug)]
pub struct BlockMap {
    used: Vec<bool>,
    owners: Vec<Option<Owner>>,
    /// 数据区的起始块，之前的超级块与 inode 表永远在用
    data_start: BlockId,
}

impl BlockMap {
    pub fn new(nblocks: usize, data_start: BlockId) -> Self {
        let mut used = vec![false; nblocks];
        used[..data_start.index()].fill(true);

        Self {
            used,
            owners: vec![None; nblocks],
            data_start,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    #[inline]
    pub fn data_start(&self) -> BlockId {
        self.data_start
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        id.index() < self.len()
    }

    /// 越界的块视为不在用
    #[inline]
    pub fn is_used(&self, id: BlockId) -> bool {
        self.used.get(id.index()).copied().unwrap_or(false)
    }

    #[inline]
    pub fn mark_used(&mut self, id: BlockId) {
        self.used[id.index()] = true;
    }

    #[inline]
    pub fn mark_free(&mut self, id: BlockId) {
        debug_assert!(id >= self.data_start, "freeing metadata block {id:?}");
        self.used[id.index()] = false;
    }

    /// 块空闲时返回空
    #[inline]
    pub fn owner_of(&self, id: BlockId) -> Option<Owner> {
        if self.is_used(id) {
            self.owners[id.index()]
        } else {
            None
        }
    }

    #[inline]
    pub fn set_owner(&mut self, id: BlockId, owner: Owner) {
        self.owners[id.index()] = Some(owner);
    }

    pub fn swap_owners(&mut self, a: BlockId, b: BlockId) {
        self.owners.swap(a.index(), b.index());
    }

    /// 挂载扫描时登记一个引用。
    /// 块编号越界或已被占用都说明卷已损坏。
    pub fn claim(&mut self, id: BlockId, owner: Owner) -> Result<()> {
        if !self.contains(id) {
            log::error!("inode {} points outside the device: {id:?}", owner.inode);
            return Err(Error::PointerOutOfRange);
        }
        if self.is_used(id) {
            log::error!("{id:?} claimed twice, second by {owner:?}");
            return Err(Error::DataBlockConflict);
        }

        self.mark_used(id);
        self.set_owner(id, owner);
        Ok(())
    }

    /// 首次适配：从数据区起点找第一个空闲块并占用。
    /// 返回空表示磁盘已满。
    pub fn allocate(&mut self, owner: Owner) -> Option<BlockId> {
        let index = self
            .used
            .iter()
            .skip(self.data_start.index())
            .position(|&used| !used)?
            + self.data_start.index();

        let id = BlockId(index as u32);
        self.mark_used(id);
        self.set_owner(id, owner);
        Some(id)
    }

    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|&&used| used).count()
    }

    /// 交换两个 inode 编号下的全部反向引用
    pub fn swap_inodes(&mut self, a: u32, b: u32) {
        for (owner, _) in self
            .owners
            .iter_mut()
            .zip(&self.used)
            .filter(|&(_, &used)| used)
        {
            if let Some(owner) = owner {
                if owner.inode == a {
                    owner.inode = b;
                } else if owner.inode == b {
                    owner.inode = a;
                }
            }
        }
    }
}
