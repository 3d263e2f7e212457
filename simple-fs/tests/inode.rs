mod common;

use common::{mounted, used_blocks};
use simple_fs::{BLOCK_SIZE, Error, INODES_PER_BLOCK};

#[test]
fn create_is_first_fit() {
    let (mut fs, _) = mounted(20);
    assert_eq!(fs.create(), Ok(1));
    assert_eq!(fs.create(), Ok(2));
    assert_eq!(fs.create(), Ok(3));

    fs.delete(2).unwrap();
    fs.delete(1).unwrap();
    assert_eq!(fs.create(), Ok(1));
    assert_eq!(fs.create(), Ok(2));
    assert_eq!(fs.create(), Ok(4));
}

#[test]
fn new_inode_is_empty() {
    let (mut fs, _) = mounted(20);
    let inumber = fs.create().unwrap();
    assert_eq!(fs.get_size(inumber), Ok(0));

    let inode = fs.volume().unwrap().load_inode(inumber);
    assert!(inode.valid);
    assert_eq!(inode.direct, [0; 5]);
    assert_eq!(inode.indirect, 0);
}

#[test]
fn inode_table_fills_up() {
    // 2 块的设备只有一个 inode 表块，0 号槽位不分配
    let (mut fs, _) = mounted(2);
    for expected in 1..INODES_PER_BLOCK as u32 {
        assert_eq!(fs.create(), Ok(expected));
    }
    assert_eq!(fs.create(), Err(Error::TableFull));

    fs.delete(77).unwrap();
    assert_eq!(fs.create(), Ok(77));
}

#[test]
fn inumber_bounds() {
    let (mut fs, _) = mounted(20);
    let ninodes = fs.volume().unwrap().ninodes();

    assert_eq!(fs.delete(0), Err(Error::InvalidInumber));
    assert_eq!(fs.delete(ninodes), Err(Error::InvalidInumber));
    assert_eq!(fs.get_size(0), Err(Error::InvalidInumber));
    assert_eq!(fs.get_size(ninodes), Err(Error::InvalidInumber));
    assert_eq!(fs.delete(ninodes - 1), Err(Error::NotValid));
}

#[test]
fn delete_twice() {
    let (mut fs, _) = mounted(20);
    let inumber = fs.create().unwrap();
    assert_eq!(fs.delete(inumber), Ok(()));
    assert_eq!(fs.delete(inumber), Err(Error::NotValid));
    assert_eq!(fs.get_size(inumber), Err(Error::NotValid));
}

#[test]
fn delete_frees_direct_blocks() {
    let (mut fs, _) = mounted(20);
    fs.create().unwrap();
    let inumber = fs.create().unwrap();
    assert_eq!(inumber, 2);

    fs.write(inumber, &vec![9; 3 * BLOCK_SIZE], 0).unwrap();
    let used = used_blocks(&fs);
    fs.delete(inumber).unwrap();
    assert_eq!(used_blocks(&fs), used - 3);
}

#[test]
fn delete_frees_indirect_blocks() {
    let (mut fs, _) = mounted(40);
    let inumber = fs.create().unwrap();
    fs.write(inumber, &vec![3; 9 * BLOCK_SIZE], 0).unwrap();

    let used = used_blocks(&fs);
    fs.delete(inumber).unwrap();
    // 9 个数据块加上间接索引块
    assert_eq!(used_blocks(&fs), used - 10);

    let inode = fs.volume().unwrap().load_inode(inumber);
    assert!(!inode.valid);
    assert_eq!(inode.direct, [0; 5]);
    assert_eq!(inode.indirect, 0);
}

#[test]
fn freed_blocks_are_reused() {
    let (mut fs, _) = mounted(20);
    let a = fs.create().unwrap();
    fs.write(a, &vec![1; 2 * BLOCK_SIZE], 0).unwrap();
    let first = fs.volume().unwrap().load_inode(a).direct;
    fs.delete(a).unwrap();

    let b = fs.create().unwrap();
    fs.write(b, &vec![2; 2 * BLOCK_SIZE], 0).unwrap();
    assert_eq!(fs.volume().unwrap().load_inode(b).direct, first);
}

#[test]
fn size_survives_remount() {
    let (mut fs, _) = mounted(20);
    let inumber = fs.create().unwrap();
    fs.write(inumber, &[5; 1234], 0).unwrap();

    fs.unmount().unwrap();
    fs.mount().unwrap();
    assert_eq!(fs.get_size(inumber), Ok(1234));
}
