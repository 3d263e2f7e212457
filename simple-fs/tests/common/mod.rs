#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;

use simple_fs::{BLOCK_SIZE, BlockDevice, FileSystem};
use spin::Mutex;

/// 内存中的块设备
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    num_blocks: usize,
}

impl RamDisk {
    pub fn new(num_blocks: usize) -> Self {
        Self::filled(num_blocks, 0)
    }

    /// 所有字节都是`byte`的设备，模拟未初始化的磁盘
    pub fn filled(num_blocks: usize, byte: u8) -> Self {
        Self {
            data: Mutex::new(vec![byte; num_blocks * BLOCK_SIZE]),
            num_blocks,
        }
    }

    /// 以现有镜像为内容，可截断或补零到`num_blocks`块
    pub fn from_image(mut image: Vec<u8>, num_blocks: usize) -> Self {
        image.resize(num_blocks * BLOCK_SIZE, 0);
        Self {
            data: Mutex::new(image),
            num_blocks,
        }
    }

    pub fn image(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

impl fmt::Debug for RamDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamDisk")
            .field("num_blocks", &self.num_blocks)
            .finish()
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert!(block_id < self.num_blocks, "read past the end: {block_id}");
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&self.data.lock()[start..start + BLOCK_SIZE]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert!(block_id < self.num_blocks, "write past the end: {block_id}");
        let start = block_id * BLOCK_SIZE;
        self.data.lock()[start..start + BLOCK_SIZE].copy_from_slice(buf);
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 格式化并挂载一块新盘
pub fn mounted(num_blocks: usize) -> (FileSystem, Arc<RamDisk>) {
    mounted_on(RamDisk::new(num_blocks))
}

pub fn mounted_on(disk: RamDisk) -> (FileSystem, Arc<RamDisk>) {
    init_logger();
    let disk = Arc::new(disk);
    let mut fs = FileSystem::new(disk.clone());
    fs.format().unwrap();
    fs.mount().unwrap();
    (fs, disk)
}

pub fn used_blocks(fs: &FileSystem) -> usize {
    fs.volume().unwrap().block_map().used_count()
}

/// 可复现的测试数据
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) ^ (i >> 8) as u8)
        .collect()
}

pub fn read_all(fs: &FileSystem, inumber: u32) -> Vec<u8> {
    let size = fs.get_size(inumber).unwrap();
    let mut buf = vec![0; size];
    if size > 0 {
        assert_eq!(fs.read(inumber, &mut buf, 0).unwrap(), size);
    }
    buf
}
