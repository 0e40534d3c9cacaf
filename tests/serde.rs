#![cfg(feature = "serde")]
use std::fs::File;

use mm_gps::*;

#[test]
fn serialize_file() {
    let mut stream = BeaconStream::new(File::open("tests/test.bin").expect("Can't open bin file"));
    let packets: Vec<Packet> = stream.packets().collect();
    let json = serde_json::to_value(&packets).expect("Can't serialize packets to json");

    assert_eq!(json[0]["Position"]["timestamp"], 6400);
    assert_eq!(json[0]["Position"]["x"], 1.23);
    assert_eq!(json[2]["Beacons"][1]["address"], 3);

    let back: Vec<Packet> = serde_json::from_value(json).expect("Can't deserialize packets");
    assert_eq!(back, packets);
}
