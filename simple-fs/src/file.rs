//! # 文件读写路径
//!
//! 把 (inode, 偏移, 长度) 的请求拆成逐块的读写：先走直接索引，再走间接索引块。
//! 写入时按需分配块；磁盘写满只会让写入提前结束，不算错误。

use crate::block_map::{Owner, Reference};
use crate::layout::{DiskInode, IndirectBlock};
use crate::sfs::MountedVolume;
use crate::{BLOCK_SIZE, DataBlock, Error, MAX_FILE_SIZE, POINTERS_PER_INODE, Result};

impl MountedVolume {
    /// 从指定位置(字节偏移)读出数据填充`buf`，读取范围不超过文件大小。
    /// 文件内未分配的块读出为 0。
    pub fn read(&self, inumber: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let inode = self.valid_inode(inumber)?;
        if buf.is_empty() {
            return Err(Error::ZeroLength);
        }

        let size = inode.size as usize;
        if offset > size {
            return Err(Error::OffsetBeyondSize);
        }

        let end = (offset + buf.len()).min(size);
        let mut indirect: Option<IndirectBlock> = None;
        let mut block: DataBlock = [0; BLOCK_SIZE];

        let mut start = offset;
        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            // 当前块的逻辑索引
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            match self.block_id(&inode, block_index, &mut indirect) {
                0 => dest.fill(0),
                block_id => {
                    self.read_block(block_id, &mut block);
                    // 绝对地址 % 块大小 = 块内偏移
                    let src = &block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
                    dest.copy_from_slice(src);
                }
            }

            read_size += block_read_size;
            start = current_block_end;
        }

        Ok(read_size)
    }

    /// 逻辑块索引到块编号，间接索引块只在需要时读入
    fn block_id(
        &self,
        inode: &DiskInode,
        block_index: usize,
        indirect: &mut Option<IndirectBlock>,
    ) -> u32 {
        if block_index < POINTERS_PER_INODE {
            return inode.direct[block_index];
        }
        if inode.indirect == 0 {
            return 0;
        }

        indirect
            .get_or_insert_with(|| self.read_indirect(inode.indirect))
            .get(block_index - POINTERS_PER_INODE)
    }

    /// 把`data`写到指定位置，返回实际写入的字节数。
    ///
    /// 允许越过文件末尾写入，中间跳过的部分读出为 0。
    /// 磁盘写满或到达文件大小上限时提前结束。
    pub fn write(&mut self, inumber: u32, data: &[u8], offset: usize) -> Result<usize> {
        let inode = self.valid_inode(inumber)?;
        if data.is_empty() {
            return Err(Error::ZeroLength);
        }
        if offset > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let end = (offset + data.len()).min(MAX_FILE_SIZE);
        let mut writer = FileWriter::new(self, inumber, inode);

        let mut start = offset;
        let mut written_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;

            let Some((block_id, fresh)) = writer.block_id(block_index) else {
                log::warn!("disk full while writing inode {inumber}");
                break;
            };

            // 新分配的块从全零开始，否则保留写入窗口之外的内容
            let mut block: DataBlock = [0; BLOCK_SIZE];
            if !fresh {
                writer.volume.read_block(block_id, &mut block);
            }
            block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_write_size]
                .copy_from_slice(&data[written_size..written_size + block_write_size]);
            writer.volume.write_block(block_id, &block);

            written_size += block_write_size;
            start = current_block_end;
        }

        if written_size > 0 {
            writer.grow_to(offset + written_size);
        }
        writer.finish();

        Ok(written_size)
    }
}

/// 写入期间打开的 inode，修改在结束时统一写回
struct FileWriter<'a> {
    volume: &'a mut MountedVolume,
    inumber: u32,
    inode: DiskInode,
    inode_dirty: bool,
    indirect: Option<IndirectBlock>,
    indirect_dirty: bool,
}

impl<'a> FileWriter<'a> {
    fn new(volume: &'a mut MountedVolume, inumber: u32, inode: DiskInode) -> Self {
        Self {
            volume,
            inumber,
            inode,
            inode_dirty: false,
            indirect: None,
            indirect_dirty: false,
        }
    }

    fn allocate(&mut self, reference: Reference) -> Option<u32> {
        self.volume
            .block_map_mut()
            .allocate(Owner::new(self.inumber, reference))
            .map(u32::from)
    }

    /// 逻辑块索引到块编号，缺块时分配；返回的布尔值表示块是否新分配。
    /// 磁盘已满时返回空。
    fn block_id(&mut self, block_index: usize) -> Option<(u32, bool)> {
        /******************** 直接索引 ********************/
        if block_index < POINTERS_PER_INODE {
            let block_id = self.inode.direct[block_index];
            if block_id != 0 {
                return Some((block_id, false));
            }

            let block_id = self.allocate(Reference::Direct(block_index))?;
            self.inode.direct[block_index] = block_id;
            self.inode_dirty = true;
            return Some((block_id, true));
        }
        /******************** END ********************/

        /******************** 间接索引 ********************/
        let slot = block_index - POINTERS_PER_INODE;
        self.open_indirect()?;

        let block_id = self.indirect.as_ref()?.get(slot);
        if block_id != 0 {
            return Some((block_id, false));
        }

        let block_id = self.allocate(Reference::IndirectSlot(slot))?;
        self.indirect.as_mut()?.set(slot, block_id);
        self.indirect_dirty = true;
        Some((block_id, true))
        /******************** END ********************/
    }

    /// 读入间接索引块；inode 还没有间接索引块时先分配一个空的。
    /// 随后数据块分配失败时，这个空的间接索引块仍留在 inode 上，之后的写入会沿用它。
    fn open_indirect(&mut self) -> Option<()> {
        if self.indirect.is_some() {
            return Some(());
        }

        let indirect = if self.inode.indirect == 0 {
            self.inode.indirect = self.allocate(Reference::IndirectPointer)?;
            self.inode_dirty = true;
            self.indirect_dirty = true;
            IndirectBlock::default()
        } else {
            self.volume.read_indirect(self.inode.indirect)
        };

        self.indirect = Some(indirect);
        Some(())
    }

    fn grow_to(&mut self, end: usize) {
        if end > self.inode.size as usize {
            self.inode.size = end as u32;
            self.inode_dirty = true;
        }
    }

    fn finish(self) {
        if self.indirect_dirty {
            if let Some(indirect) = &self.indirect {
                self.volume.write_indirect(self.inode.indirect, indirect);
            }
        }
        if self.inode_dirty {
            self.volume.save_inode(self.inumber, &self.inode);
        }
    }
}
