mod cli;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use block_dev::BLOCK_SIZE;
use clap::Parser;
use cli::{Cli, Command};
use simple_fs::FileSystem;
use simple_fs_fuse::BlockFile;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Format { blocks } => {
            let fd = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&cli.image)?;
            fd.set_len((blocks * BLOCK_SIZE) as u64)?;

            let mut fs = FileSystem::new(Arc::new(BlockFile::new(fd)?));
            fs.format().map_err(io::Error::other)?;
            println!("image={:?} blocks={blocks}", cli.image);
        }
        Command::Pack { source } => {
            let mut fs = mount(&cli.image)?;

            let mut entries = fs::read_dir(&source)?.collect::<Result<Vec<_>, _>>()?;
            entries.sort_by_key(|entry| entry.file_name());

            for entry in entries {
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let name = entry.file_name();
                let data = fs::read(entry.path())?;

                let inumber = fs.create().map_err(io::Error::other)?;
                if !data.is_empty() {
                    let written = fs.write(inumber, &data, 0).map_err(io::Error::other)?;
                    if written < data.len() {
                        log::warn!("{name:?}: only {written} of {} bytes fit", data.len());
                    }
                }
                println!("{} -> {inumber}", name.to_string_lossy());
            }
        }
        Command::Cat { inumber } => {
            let fs = mount(&cli.image)?;
            let size = fs.get_size(inumber).map_err(io::Error::other)?;

            let mut buf = vec![0; size];
            if size > 0 {
                fs.read(inumber, &mut buf, 0).map_err(io::Error::other)?;
            }
            io::stdout().write_all(&buf)?;
        }
        Command::Defrag => {
            let mut fs = mount(&cli.image)?;
            fs.defrag().map_err(io::Error::other)?;
        }
        Command::Debug => {
            let fs = FileSystem::new(open(&cli.image)?);
            let report = fs.debug().map_err(io::Error::other)?;
            print!("{report}");
        }
    }

    Ok(())
}

fn open(image: &Path) -> io::Result<Arc<BlockFile>> {
    let fd = OpenOptions::new().read(true).write(true).open(image)?;
    Ok(Arc::new(BlockFile::new(fd)?))
}

fn mount(image: &Path) -> io::Result<FileSystem> {
    let mut fs = FileSystem::new(open(image)?);
    fs.mount().map_err(io::Error::other)?;
    Ok(fs)
}
