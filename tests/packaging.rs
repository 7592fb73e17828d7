use std::io::{Cursor, Read};

use rasterprep::{
    NamedAsset, PackOptions, PipelineConfig, RasterBuffer, decode_image, pack, prepare_sticker,
};

fn sticker(color: [u8; 4]) -> RasterBuffer {
    let src = RasterBuffer::from_fn(60, 40, |x, y| {
        if (10..50).contains(&x) && (10..30).contains(&y) {
            color
        } else {
            [255, 255, 255, 255]
        }
    })
    .unwrap();
    prepare_sticker(src, &PipelineConfig::default()).unwrap()
}

#[test]
fn archive_lists_entries_in_input_order_and_decodes() {
    let assets = vec![
        NamedAsset::new("Happy", sticker([220, 40, 40, 255])),
        NamedAsset::new("Thumbs Up!", sticker([40, 40, 220, 255])),
    ];
    let packed = pack(&assets, &PackOptions::default()).unwrap();
    assert!(packed.failures.is_empty());

    let mut archive = zip::ZipArchive::new(Cursor::new(packed.bytes)).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_owned())
        .collect();
    assert_eq!(
        names,
        [
            "sticker_pack/",
            "sticker_pack/01_happy.webp",
            "sticker_pack/02_thumbs_up_.webp"
        ]
    );

    let mut bytes = Vec::new();
    archive
        .by_name("sticker_pack/02_thumbs_up_.webp")
        .unwrap()
        .read_to_end(&mut bytes)
        .unwrap();
    assert!(bytes.len() < 100 * 1024);
    let decoded = decode_image(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (512, 512));
}

#[test]
fn identical_inputs_produce_identical_archives() {
    let assets: Vec<_> = (0..4)
        .map(|i| NamedAsset::new(format!("s{i}"), sticker([i * 50, 90, 10, 255])))
        .collect();
    let a = pack(&assets, &PackOptions::default()).unwrap();
    let b = pack(&assets, &PackOptions::default()).unwrap();
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(a.entries, b.entries);
}

#[test]
fn one_bad_asset_does_not_abort_the_export() {
    let assets = vec![
        NamedAsset::new("empty", RasterBuffer::transparent(0, 0).unwrap()),
        NamedAsset::new("fine", sticker([0, 0, 0, 255])),
    ];
    let packed = pack(&assets, &PackOptions::default()).unwrap();
    assert_eq!(packed.entries.len(), 1);
    assert_eq!(packed.entries[0].path, "sticker_pack/02_fine.webp");
    assert_eq!(packed.failures[0].name, "empty");
    assert!(packed.ensure_complete().unwrap_err().is_recoverable());
}
