#![no_main]
use assetid::detection::containers::{
    d64_extract, unwrap_applesingle, unwrap_macbinary, ContainerTransform,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let size = data.len() as u64;
    let _ = unwrap_macbinary(data, size);
    let _ = unwrap_macbinary(data, size.saturating_add(128));
    let _ = unwrap_applesingle(data);
    let _ = d64_extract(data, "00.LFL");
    if data.len() >= 2 {
        let slice = ContainerTransform::PackedSlice {
            index_file: "index.dat".into(),
            offset: u64::from(data[0]) * 64,
            length: u64::from(data[1]) * 16,
        };
        let _ = slice.unwrap(&data[2..], size - 2);
    }
});
