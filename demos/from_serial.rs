use clap::Parser;

use mm_gps::{BeaconStream, DEFAULT_BAUD};

#[derive(Parser, Debug)]
#[command(name = "from_serial", about = "Print packets streamed by a Marvelmind beacon")]
struct Args {
    /// Serial port path, 'COM1' on Windows
    #[arg(long, value_name = "PORT", env = "MM_GPS_PORT", default_value = "/dev/ttyACM0")]
    port: String,

    /// Baud rate, must be supported by the platform
    #[arg(long, value_name = "BAUD", env = "MM_GPS_BAUD", default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Stop after this many packets
    #[arg(long, value_name = "COUNT")]
    count: Option<usize>,
}

fn main() {
    let args = Args::parse();

    let mut beacon = BeaconStream::open(&args.port, args.baud).expect("Failed to open port");
    let packets = beacon.packets();
    match args.count {
        Some(count) => packets.take(count).for_each(|packet| println!("{packet:?}")),
        None => packets.for_each(|packet| println!("{packet:?}")),
    }

    println!("Exiting");
}
