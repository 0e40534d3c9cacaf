use std::io::Cursor;

use mm_gps::{append_crc16, BeaconStream};

fn main() {
    // Hedgehog at (1.23, -4.56, 0.78) m, 100 s after the beacon started
    let position = append_crc16(hex::decode("FF47010010001900007B0038FE4E00000000000000").unwrap());
    assert_eq!(&position[position.len() - 2..], &[0xBA, 0x39]);

    // Read back as if it came from the serial line
    let mut stream = BeaconStream::new(Cursor::new(position));
    let packet = stream.read_packet().unwrap();
    println!("{packet:#?}");
}
