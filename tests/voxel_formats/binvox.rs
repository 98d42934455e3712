//! Round-trip coverage for the binvox codec, driven entirely through the public `voxelio` API.

use voxelio::prelude::*;

#[test]
fn writer_roundtrips_a_small_grid() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = BinvoxWriter::new(sink, [3, 3, 3]);
	assert_eq!(writer.init(), ResultCode::OkInitialized);
	writer.write(&[
		Voxel32 {
			pos: [0, 0, 0],
			argb: 0xFFFF_FFFF,
		},
		Voxel32 {
			pos: [2, 1, 0],
			argb: 0xFFFF_FFFF,
		},
	]);
	assert_eq!(writer.finalize(), ResultCode::WriteEnd);

	let mut reader = BinvoxReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
	assert_eq!(reader.init().code, ResultCode::OkInitialized);
	assert_eq!(reader.header().unwrap().dim, [3, 3, 3]);

	let mut seen = Vec::new();
	loop {
		let mut buf = [Voxel32::default(); 8];
		let result = reader.read(&mut buf);
		seen.extend_from_slice(&buf[..result.voxels_read as usize]);
		if result.code == ResultCode::ReadEnd {
			break;
		}
	}
	assert_eq!(seen.len(), 2);
	assert!(seen.iter().any(|v| v.pos == [0, 0, 0]));
	assert!(seen.iter().any(|v| v.pos == [2, 1, 0]));
}

#[test]
fn empty_grid_reads_end_with_no_voxels() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = BinvoxWriter::new(sink, [1, 1, 1]);
	writer.init();
	writer.finalize();

	let mut reader = BinvoxReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
	reader.init();
	let mut buf = [Voxel32::default(); 4];
	let result = reader.read(&mut buf);
	assert_eq!(result.code, ResultCode::ReadEnd);
	assert_eq!(result.voxels_read, 0);
}
