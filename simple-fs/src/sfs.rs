//! # 卷层
//!
//! 格式化磁盘，挂载时重建块占用信息，并按编号存取 inode。

use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::block_map::{BlockId, BlockMap, Owner, Reference};
use crate::layout::{DiskInode, IndirectBlock, SuperBlock};
use crate::{BLOCK_SIZE, DataBlock, Error, INODES_PER_BLOCK, MAX_FILE_SIZE, Result};

/// 格式化磁盘：清空 inode 表并写入超级块。原有内容全部作废。
///
/// 不检查挂载状态，由 [`FileSystem::format`](crate::FileSystem::format) 把关。
pub(crate) fn format(block_device: &Arc<dyn BlockDevice>) -> Result<SuperBlock> {
    let nblocks = block_device.num_blocks();
    if nblocks < 2 || nblocks > u32::MAX as usize {
        log::warn!("cannot format a device of {nblocks} blocks");
        return Err(Error::DeviceTooSmall);
    }

    let super_block = SuperBlock::new(nblocks as u32);

    let empty: DataBlock = [0; BLOCK_SIZE];
    for block_id in 1..=super_block.ninodeblocks {
        block_device.write_block(block_id as usize, &empty);
    }

    let mut block: DataBlock = [0; BLOCK_SIZE];
    super_block.encode(&mut block);
    block_device.write_block(0, &block);

    log::info!(
        "formatted: {} blocks, {} inode blocks, {} inodes",
        super_block.nblocks,
        super_block.ninodeblocks,
        super_block.ninodes
    );
    Ok(super_block)
}

/// 已挂载的卷。
///
/// 位图与反向引用表只在挂载期间存在，每个操作结束时都与磁盘内容一致。
#[derive(Debug)]
pub struct MountedVolume {
    block_device: Arc<dyn BlockDevice>,
    super_block: SuperBlock,
    block_map: BlockMap,
}

impl MountedVolume {
    /// 校验超级块，扫描整个 inode 表重建位图与反向引用表
    pub fn mount(block_device: Arc<dyn BlockDevice>) -> Result<Self> {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        block_device.read_block(0, &mut block);
        let super_block = SuperBlock::decode(&block);

        let nblocks = block_device.num_blocks();
        super_block.check(nblocks)?;

        let mut volume = Self {
            block_device,
            super_block,
            block_map: BlockMap::new(nblocks, BlockId::new(super_block.data_start())),
        };

        for table_block in 1..=super_block.ninodeblocks {
            volume.block_device.read_block(table_block as usize, &mut block);

            for slot in 0..INODES_PER_BLOCK {
                let inode = DiskInode::decode(&block, slot);
                if !inode.valid {
                    continue;
                }

                let inumber = (table_block - 1) * INODES_PER_BLOCK as u32 + slot as u32;
                volume.claim_inode(inumber, &inode)?;
            }
        }

        log::info!(
            "mounted: {} inodes, {} of {} blocks in use",
            volume.super_block.ninodes,
            volume.block_map.used_count(),
            nblocks
        );
        Ok(volume)
    }

    /// 登记一个有效 inode 引用的全部块
    fn claim_inode(&mut self, inumber: u32, inode: &DiskInode) -> Result<()> {
        if inode.size as usize > MAX_FILE_SIZE {
            log::error!("inode {inumber} claims {} bytes", inode.size);
            return Err(Error::FileSizeOutOfRange);
        }

        for (k, ptr) in inode.direct_blocks() {
            self.block_map
                .claim(ptr.into(), Owner::new(inumber, Reference::Direct(k)))?;
        }

        if inode.indirect != 0 {
            self.block_map.claim(
                inode.indirect.into(),
                Owner::new(inumber, Reference::IndirectPointer),
            )?;

            let indirect = self.read_indirect(inode.indirect);
            for (k, ptr) in indirect.entries() {
                self.block_map
                    .claim(ptr.into(), Owner::new(inumber, Reference::IndirectSlot(k)))?;
            }
        }

        Ok(())
    }

    #[inline]
    pub fn ninodes(&self) -> u32 {
        self.super_block.ninodes
    }

    #[inline]
    pub(crate) fn block_device(&self) -> &Arc<dyn BlockDevice> {
        &self.block_device
    }

    #[inline]
    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    #[inline]
    pub fn block_map(&self) -> &BlockMap {
        &self.block_map
    }

    #[inline]
    pub(crate) fn block_map_mut(&mut self) -> &mut BlockMap {
        &mut self.block_map
    }

    /// 通过编号获取 inode 在磁盘上的位置：**块ID**以及**块内槽位**
    #[inline]
    fn disk_inode_pos(inumber: u32) -> (usize, usize) {
        let inumber = inumber as usize;
        (1 + inumber / INODES_PER_BLOCK, inumber % INODES_PER_BLOCK)
    }

    /// 不检查编号与有效性
    pub fn load_inode(&self, inumber: u32) -> DiskInode {
        let (block_id, slot) = Self::disk_inode_pos(inumber);
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut block);
        DiskInode::decode(&block, slot)
    }

    /// 不检查编号与有效性
    pub fn save_inode(&self, inumber: u32, inode: &DiskInode) {
        let (block_id, slot) = Self::disk_inode_pos(inumber);
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut block);
        inode.encode(&mut block, slot);
        self.block_device.write_block(block_id, &block);
    }

    #[inline]
    pub(crate) fn read_block(&self, block_id: u32, block: &mut DataBlock) {
        self.block_device.read_block(block_id as usize, block);
    }

    #[inline]
    pub(crate) fn write_block(&self, block_id: u32, block: &DataBlock) {
        self.block_device.write_block(block_id as usize, block);
    }

    pub(crate) fn read_indirect(&self, block_id: u32) -> IndirectBlock {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.read_block(block_id, &mut block);
        IndirectBlock::decode(&block)
    }

    pub(crate) fn write_indirect(&self, block_id: u32, indirect: &IndirectBlock) {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        indirect.encode(&mut block);
        self.write_block(block_id, &block);
    }

    /// 编号须落在 `[1, ninodes)` 内且 inode 有效
    pub(crate) fn valid_inode(&self, inumber: u32) -> Result<DiskInode> {
        if inumber < 1 || inumber >= self.ninodes() {
            return Err(Error::InvalidInumber);
        }

        let inode = self.load_inode(inumber);
        if !inode.valid {
            return Err(Error::NotValid);
        }
        Ok(inode)
    }

    /// 首次适配：从 1 号起找到第一个空闲槽位
    pub fn create(&mut self) -> Result<u32> {
        let inumber = (1..self.ninodes())
            .find(|&inumber| !self.load_inode(inumber).valid)
            .ok_or(Error::TableFull)?;

        self.save_inode(inumber, &DiskInode::empty_file());
        log::debug!("created inode {inumber}");
        Ok(inumber)
    }

    /// 释放 inode 引用的全部块并清空槽位
    pub fn delete(&mut self, inumber: u32) -> Result<()> {
        let inode = self.valid_inode(inumber)?;

        for (_, ptr) in inode.direct_blocks() {
            self.block_map.mark_free(ptr.into());
        }

        if inode.indirect != 0 {
            let indirect = self.read_indirect(inode.indirect);
            for (_, ptr) in indirect.entries() {
                self.block_map.mark_free(ptr.into());
            }
            self.block_map.mark_free(inode.indirect.into());
        }

        self.save_inode(inumber, &DiskInode::default());
        log::debug!("deleted inode {inumber} ({} bytes)", inode.size);
        Ok(())
    }

    pub fn get_size(&self, inumber: u32) -> Result<usize> {
        self.valid_inode(inumber).map(|inode| inode.size as usize)
    }
}
