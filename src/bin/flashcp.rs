//! Command-line front end: copy an image file onto an MTD character device.

use std::thread;
use std::time::Duration;

use clap::Parser;
use mtd_flashcp::flashcp;

/// Erase, write, and verify a flash image against a Linux MTD character device.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the image file to flash.
    image: String,

    /// Path to the target MTD character device, e.g. /dev/mtd0.
    device: String,
}

fn main() {
    let args = Args::parse();

    howudoin::init(howudoin::consumers::TermLine::default());

    let result = flashcp(&args.image, &args.device);

    howudoin::disable();
    thread::sleep(Duration::from_millis(10)); // Give howudoin time to shut down

    if let Err(err) = result {
        eprintln!("flashcp: {err}");
        std::process::exit(1);
    }

    println!("flashcp: {} written to {}", args.image, args.device);
}
