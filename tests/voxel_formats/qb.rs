//! Round-trip coverage for the Qubicle (QB) codec, driven entirely through the public
//! `voxelio` API.

use voxelio::prelude::*;

#[test]
fn writer_roundtrips_a_single_matrix() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = QbWriter::new(sink, "cube", [2, 2, 1], [10, -5, 0]);
	assert_eq!(writer.init(), ResultCode::OkInitialized);
	writer.write(&[
		Voxel32 {
			pos: [10, -5, 0],
			argb: Color32::new(255, 200, 100, 50).to_argb32(),
		},
		Voxel32 {
			pos: [11, -4, 0],
			argb: Color32::new(255, 1, 2, 3).to_argb32(),
		},
	]);
	assert_eq!(writer.finalize(), ResultCode::WriteEnd);

	let mut reader = QbReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
	assert_eq!(reader.init().code, ResultCode::OkInitialized);

	let mut seen = Vec::new();
	loop {
		let mut buf = [Voxel32::default(); 4];
		let result = reader.read(&mut buf);
		seen.extend_from_slice(&buf[..result.voxels_read as usize]);
		if result.code == ResultCode::ReadEnd {
			break;
		}
	}
	assert_eq!(seen.len(), 2);
	assert!(seen.iter().any(|v| v.pos == [10, -5, 0] && v.argb == Color32::new(255, 200, 100, 50).to_argb32()));
	assert!(seen.iter().any(|v| v.pos == [11, -4, 0] && v.argb == Color32::new(255, 1, 2, 3).to_argb32()));
}

#[test]
fn rejects_bad_version() {
	let mut reader = QbReader::new(ByteArrayStream::from_bytes(vec![0xAA; 4]));
	let result = reader.init();
	assert_eq!(result.code, ResultCode::ReadErrorUnknownVersion);
}

#[test]
fn voxels_outside_matrix_bounds_are_dropped_on_write() {
	let sink = ByteArrayStream::from_bytes(Vec::new());
	let mut writer = QbWriter::new(sink, "small", [1, 1, 1], [0, 0, 0]);
	writer.init();
	writer.write(&[Voxel32 {
		pos: [5, 5, 5],
		argb: Color32::new(255, 9, 9, 9).to_argb32(),
	}]);
	writer.finalize();

	let mut reader = QbReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
	reader.init();
	let mut buf = [Voxel32::default(); 4];
	let result = reader.read(&mut buf);
	assert_eq!(result.voxels_read, 0);
}
