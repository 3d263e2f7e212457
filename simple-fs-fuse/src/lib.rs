
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use block_dev::{BLOCK_SIZE, BlockDevice};

/// 以宿主机上的文件充当块设备，块数由文件长度决定
#[derive(Debug)]
pub struct BlockFile {
    file: Mutex<File>,
    num_blocks: usize,
}

impl BlockFile {
    /// 文件末尾不足一块的部分不计入设备
    pub fn new(file: File) -> io::Result<Self> {
        let num_blocks = (file.metadata()?.len() / BLOCK_SIZE as u64) as usize;
        Ok(Self {
            file: Mutex::new(file),
            num_blocks,
        })
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        file.read_exact(&mut buf[..BLOCK_SIZE])
            .expect("not a complete block!");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        file.write_all(&buf[..BLOCK_SIZE])
            .expect("not a complete block!");
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}
