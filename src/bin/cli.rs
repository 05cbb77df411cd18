//! logfs CLI
//!
//! Command-line interface for exercising a logfs device.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use logfs::{BlockDevice, Config, FileDevice, LogError, LogFs, LogStats, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// logfs CLI
#[derive(Parser, Debug)]
#[command(name = "logfs-cli")]
#[command(about = "Append-only block log: round-trip, stress and dump a device")]
#[command(version)]
struct Args {
    /// Device path (regular file or block device)
    #[arg(short, long)]
    device: PathBuf,

    /// Block size override in bytes (default: filesystem-reported)
    #[arg(short, long)]
    block_size: Option<usize>,

    /// Write buffer capacity in blocks
    #[arg(long, default_value = "32")]
    write_buffer_blocks: usize,

    /// Read cache slots
    #[arg(long, default_value = "256")]
    read_cache_blocks: usize,

    /// Create the device file if it does not exist
    #[arg(long)]
    create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a file to a fresh log, read it back and compare checksums
    Roundtrip {
        /// File to append
        #[arg(short, long)]
        input: PathBuf,

        /// Bytes per append call
        #[arg(short, long, default_value = "4096")]
        chunk: usize,
    },

    /// Append records from several threads, then verify each one
    Stress {
        /// Concurrent appenders
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Records per appender
        #[arg(short, long, default_value = "1000")]
        records: usize,

        /// Bytes per record
        #[arg(short, long, default_value = "100")]
        size: usize,
    },

    /// Print raw device bytes (bypasses the log)
    Dump {
        /// Starting byte offset (rounded down to a block)
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Number of bytes (rounded up to whole blocks)
        #[arg(short, long, default_value = "512")]
        len: usize,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logfs=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("logfs CLI v{}", logfs::VERSION);
    tracing::info!("Device: {}", args.device.display());

    let result = match &args.command {
        Commands::Roundtrip { input, chunk } => roundtrip(&args, input, *chunk),
        Commands::Stress {
            threads,
            records,
            size,
        } => stress(&args, *threads, *records, *size),
        Commands::Dump { offset, len } => dump(&args, *offset, *len),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Build config from args
fn config(args: &Args) -> Config {
    let mut builder = Config::builder()
        .write_buffer_blocks(args.write_buffer_blocks)
        .read_cache_blocks(args.read_cache_blocks)
        .create(args.create);
    if let Some(size) = args.block_size {
        builder = builder.block_size(size);
    }
    builder.build()
}

fn roundtrip(args: &Args, input: &Path, chunk: usize) -> Result<()> {
    let data = std::fs::read(input)?;
    let log = LogFs::open_with_config(&args.device, config(args))?;

    let started = Instant::now();
    for piece in data.chunks(chunk.max(1)) {
        log.append(piece)?;
    }
    let back = log.read_bytes(0, data.len())?;
    let elapsed = started.elapsed();

    let expected = crc32fast::hash(&data);
    let actual = crc32fast::hash(&back);
    if expected != actual {
        return Err(LogError::Device(format!(
            "read-back checksum mismatch: wrote {:08x}, read {:08x}",
            expected, actual
        )));
    }

    println!(
        "round-trip ok: {} bytes, crc32 {:08x}, {:.2?}",
        data.len(),
        actual,
        elapsed
    );
    print_stats(&log.stats());
    log.close()
}

fn stress(args: &Args, threads: usize, records: usize, size: usize) -> Result<()> {
    let log = LogFs::open_with_config(&args.device, config(args))?;
    let started = Instant::now();

    let results: Vec<Result<Vec<(u64, Vec<u8>)>>> = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|thread_id| {
                let log = &log;
                scope.spawn(move |_| -> Result<Vec<(u64, Vec<u8>)>> {
                    let mut written = Vec::with_capacity(records);
                    for record in 0..records {
                        let payload = record_payload(thread_id, record, size);
                        let offset = log.append(&payload)?;
                        written.push((offset, payload));
                    }
                    Ok(written)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("stress appender panicked"))
            .collect()
    })
    .expect("stress scope panicked");

    let mut written = Vec::new();
    for result in results {
        written.extend(result?);
    }
    let append_elapsed = started.elapsed();

    // Offsets must tile the log exactly: a total order, nothing interleaved
    written.sort_by_key(|(offset, _)| *offset);
    let mut expected_offset = 0;
    for (offset, payload) in &written {
        if *offset != expected_offset {
            return Err(LogError::Device(format!(
                "record offsets do not tile the log: expected {}, found {}",
                expected_offset, offset
            )));
        }
        expected_offset += payload.len() as u64;
    }

    let mut mismatches = 0;
    for (offset, payload) in &written {
        if log.read_bytes(*offset, payload.len())?[..] != payload[..] {
            mismatches += 1;
        }
    }
    if mismatches > 0 {
        return Err(LogError::Device(format!(
            "{} of {} records read back incorrectly",
            mismatches,
            written.len()
        )));
    }

    println!(
        "stress ok: {} records from {} threads, {} bytes, appended in {:.2?}, verified in {:.2?}",
        written.len(),
        threads,
        expected_offset,
        append_elapsed,
        started.elapsed() - append_elapsed
    );
    print_stats(&log.stats());
    log.close()
}

fn dump(args: &Args, offset: u64, len: usize) -> Result<()> {
    let device = FileDevice::open(&args.device, &config(args))?;
    let block_size = device.block_size() as u64;

    let start = offset - offset % block_size;
    let end = (offset + len as u64).div_ceil(block_size) * block_size;
    let mut buf = vec![0u8; (end - start) as usize];
    device.read_at(start, &mut buf)?;

    for (row, line) in buf.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
        let text: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<47}  {}", start + row as u64 * 16, hex.join(" "), text);
    }
    Ok(())
}

/// Deterministic record contents, distinct per thread and record
fn record_payload(thread_id: usize, record: usize, size: usize) -> Vec<u8> {
    (0..size)
        .map(|k| ((thread_id * 31 + record * 7 + k) % 251) as u8)
        .collect()
}

fn print_stats(stats: &LogStats) {
    println!("  bytes appended: {}", stats.bytes_appended);
    println!("  blocks written: {}", stats.blocks_written);
    println!("  flushes:        {}", stats.flushes);
    println!("  cache hits:     {}", stats.cache_hits);
    println!("  cache misses:   {}", stats.cache_misses);
}
